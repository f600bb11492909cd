//! Catalog reader: loads workload descriptors from the catalog directory.
//!
//! Layout:
//!
//! ```text
//! <catalog_dir>/
//!   grass/
//!     info.toml            descriptor (required)
//!     docker-compose.yaml  bundle (name configurable via `compose_file`)
//!     docs.md              long-form docs (optional)
//!   .example/              hidden directories are templates, never listed
//! ```
//!
//! The catalog is re-enumerated on every call; nothing is cached. A broken
//! descriptor only removes that one workload from listings.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::*;

/// Descriptor file name inside each workload directory.
pub const DESCRIPTOR_FILE: &str = "info.toml";

/// Optional documentation file inside each workload directory.
pub const DOCS_FILE: &str = "docs.md";

const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yaml";

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("workload not found: {0}")]
    NotFound(String),

    #[error("malformed descriptor for {id}: {reason}")]
    Malformed { id: String, reason: String },

    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk schema of `info.toml`.
#[derive(Debug, Deserialize)]
struct DescriptorFile {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    category: String,
    compose_file: Option<String>,
    docs: Option<String>,
    icon: Option<String>,
    network: NetworkStatus,
    #[serde(default)]
    requirements: ResourceRequirements,
}

/// Read-only view over the catalog directory.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
}

impl Catalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Enumerate every loadable workload, sorted by id.
    ///
    /// A missing catalog directory yields an empty listing.
    pub fn list(&self) -> CatalogResult<Vec<WorkloadDescriptor>> {
        if !self.root.is_dir() {
            debug!(root = ?self.root, "catalog directory missing");
            return Ok(Vec::new());
        }

        let mut workloads = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(id) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if id.starts_with('.') {
                continue;
            }
            match self.load(&id) {
                Ok(descriptor) => workloads.push(descriptor),
                Err(e) => warn!(workload_id = %id, error = %e, "skipping catalog entry"),
            }
        }

        workloads.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(workloads)
    }

    /// Load a single workload descriptor.
    pub fn get(&self, id: &str) -> CatalogResult<WorkloadDescriptor> {
        if !is_valid_id(id) {
            return Err(CatalogError::NotFound(id.to_string()));
        }
        self.load(id)
    }

    /// Long-form documentation for a workload, if it ships any.
    pub fn docs(&self, id: &str) -> CatalogResult<Option<String>> {
        // Resolve the descriptor first so unknown ids report NotFound.
        self.get(id)?;
        let path = self.root.join(id).join(DOCS_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn load(&self, id: &str) -> CatalogResult<WorkloadDescriptor> {
        let dir = self.root.join(id);
        let info_path = dir.join(DESCRIPTOR_FILE);
        let content = match std::fs::read_to_string(&info_path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CatalogError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let file: DescriptorFile = toml::from_str(&content).map_err(|e| CatalogError::Malformed {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

        let compose_name = file.compose_file.as_deref().unwrap_or(DEFAULT_COMPOSE_FILE);
        if compose_name.contains("..") || Path::new(compose_name).is_absolute() {
            return Err(CatalogError::Malformed {
                id: id.to_string(),
                reason: format!("compose_file must stay inside the workload directory: {compose_name}"),
            });
        }
        let compose_path = absolutize(&dir.join(compose_name));
        if !compose_path.is_file() {
            return Err(CatalogError::Malformed {
                id: id.to_string(),
                reason: format!("bundle not found at {}", compose_path.display()),
            });
        }

        Ok(WorkloadDescriptor {
            id: id.to_string(),
            name: file.name,
            description: file.description,
            company: file.company,
            version: file.version,
            category: file.category,
            bundle: BundleRef::new(compose_path),
            docs: file.docs,
            icon: file.icon,
            network_status: file.network,
            requirements: file.requirements,
        })
    }
}

/// Ids are single, non-hidden path components.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains('/')
        && !id.contains('\\')
        && !id.contains('\0')
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRASS_INFO: &str = r#"
name = "Grass"
description = "Share unused bandwidth."
company = "Grass"
version = "1.0.0"
category = "Network"
docs = "https://grass.example/docs"
network = "mainnet"

[requirements]
min_memory_gb = 2
min_cpu = 1
min_disk_gb = 10
"#;

    fn write_workload(root: &Path, id: &str, info: &str, with_bundle: bool) {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DESCRIPTOR_FILE), info).unwrap();
        if with_bundle {
            std::fs::write(dir.join(DEFAULT_COMPOSE_FILE), "services: {}\n").unwrap();
        }
    }

    #[test]
    fn get_parses_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        write_workload(dir.path(), "grass", GRASS_INFO, true);

        let catalog = Catalog::new(dir.path());
        let workload = catalog.get("grass").unwrap();

        assert_eq!(workload.id, "grass");
        assert_eq!(workload.name, "Grass");
        assert_eq!(workload.network_status, NetworkStatus::Mainnet);
        assert_eq!(workload.requirements.min_disk_gb, 10.0);
        assert!(workload.bundle.compose_file().ends_with("grass/docker-compose.yaml"));
        assert!(workload.bundle.dir().ends_with("grass"));
    }

    #[test]
    fn list_skips_malformed_and_hidden_entries() {
        let dir = tempfile::tempdir().unwrap();
        write_workload(dir.path(), "grass", GRASS_INFO, true);
        write_workload(dir.path(), "broken", "name = ", true);
        write_workload(dir.path(), "no-bundle", GRASS_INFO, false);
        write_workload(dir.path(), ".example", GRASS_INFO, true);
        std::fs::create_dir_all(dir.path().join("empty")).unwrap();

        let catalog = Catalog::new(dir.path());
        let all = catalog.list().unwrap();

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "grass");
    }

    #[test]
    fn list_is_sorted_and_reenumerated() {
        let dir = tempfile::tempdir().unwrap();
        write_workload(dir.path(), "tashi", GRASS_INFO, true);
        let catalog = Catalog::new(dir.path());
        assert_eq!(catalog.list().unwrap().len(), 1);

        write_workload(dir.path(), "arcium", GRASS_INFO, true);
        let ids: Vec<_> = catalog.list().unwrap().into_iter().map(|w| w.id).collect();
        assert_eq!(ids, vec!["arcium", "tashi"]);
    }

    #[test]
    fn missing_catalog_dir_lists_empty() {
        let catalog = Catalog::new("/nonexistent/catalog/dir");
        assert!(catalog.list().unwrap().is_empty());
    }

    #[test]
    fn get_unknown_or_hidden_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write_workload(dir.path(), ".example", GRASS_INFO, true);
        let catalog = Catalog::new(dir.path());

        assert!(matches!(catalog.get("nope"), Err(CatalogError::NotFound(_))));
        assert!(matches!(catalog.get(".example"), Err(CatalogError::NotFound(_))));
        assert!(matches!(catalog.get("../etc"), Err(CatalogError::NotFound(_))));
        assert!(matches!(catalog.get("gr\0ass"), Err(CatalogError::NotFound(_))));
        assert!(matches!(catalog.docs("gr\0ass"), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn get_malformed_reports_reason() {
        let dir = tempfile::tempdir().unwrap();
        write_workload(dir.path(), "bad", "name = \"Bad\"\nnetwork = \"moonnet\"\n", true);
        let catalog = Catalog::new(dir.path());

        match catalog.get("bad") {
            Err(CatalogError::Malformed { id, .. }) => assert_eq!(id, "bad"),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn compose_file_cannot_escape_workload_dir() {
        let dir = tempfile::tempdir().unwrap();
        // Top-level keys must precede the [requirements] table.
        let info = format!("compose_file = \"../other.yaml\"\n{GRASS_INFO}");
        write_workload(dir.path(), "grass", &info, true);

        let catalog = Catalog::new(dir.path());
        assert!(matches!(catalog.get("grass"), Err(CatalogError::Malformed { .. })));
    }

    #[test]
    fn docs_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        write_workload(dir.path(), "grass", GRASS_INFO, true);
        let catalog = Catalog::new(dir.path());
        assert_eq!(catalog.docs("grass").unwrap(), None);

        std::fs::write(dir.path().join("grass").join(DOCS_FILE), "# Grass\n").unwrap();
        assert_eq!(catalog.docs("grass").unwrap().as_deref(), Some("# Grass\n"));
        assert!(matches!(catalog.docs("nope"), Err(CatalogError::NotFound(_))));
    }
}
