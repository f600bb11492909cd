//! The catalog and config shipped at the repository root must stay loadable.

use std::path::PathBuf;

use depin_core::{Catalog, HubConfig, NetworkStatus};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

#[test]
fn shipped_catalog_lists_every_entry() {
    let catalog = Catalog::new(repo_root().join("apps"));
    let workloads = catalog.list().unwrap();

    let ids: Vec<_> = workloads.iter().map(|w| w.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["arcium", "bless", "grass", "inference", "nexus", "pipe-network", "tapedrive", "tashi"]
    );
    assert!(workloads.iter().all(|w| w.bundle.compose_file().is_file()));

    let grass = catalog.get("grass").unwrap();
    assert_eq!(grass.network_status, NetworkStatus::Mainnet);
    let tapedrive = catalog.get("tapedrive").unwrap();
    assert_eq!(tapedrive.category, "Storage");
    assert_eq!(tapedrive.requirements.min_disk_gb, 10.0);
    assert!(catalog.docs("grass").unwrap().is_some());
    assert!(catalog.docs("tashi").unwrap().is_none());
}

#[test]
fn shipped_config_matches_defaults() {
    let config = HubConfig::from_file(&repo_root().join("hub.toml")).unwrap();
    assert_eq!(config, HubConfig::default());
}
