//! hub.toml configuration parser.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable configuration. Paths are handed to components at construction.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HubConfig {
    /// Directory holding one sub-directory per catalog workload.
    pub catalog_dir: PathBuf,
    /// Directory holding the installation store.
    pub data_dir: PathBuf,
    pub server: ServerConfig,
    pub runtime: RuntimeConfig,
    pub lifecycle: LifecycleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Container runtime CLI; its `compose` subcommand drives bundles.
    pub docker_bin: String,
    /// Upper bound for a single compose invocation.
    pub command_timeout_secs: u64,
    /// Upper bound for the availability probe.
    pub probe_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct LifecycleConfig {
    /// How long a caller waits for a lifecycle operation before getting a
    /// timeout. The operation itself keeps running. Unset waits forever.
    pub operation_timeout_secs: Option<u64>,
    /// How long an operation waits for an in-flight operation on the same
    /// workload before failing with a conflict. Unset waits forever.
    pub lock_wait_secs: Option<u64>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            catalog_dir: PathBuf::from("apps"),
            data_dir: PathBuf::from("data"),
            server: ServerConfig::default(),
            runtime: RuntimeConfig::default(),
            lifecycle: LifecycleConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            docker_bin: "docker".to_string(),
            command_timeout_secs: 600,
            probe_timeout_secs: 10,
        }
    }
}

impl HubConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HubConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Location of the installation store file.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("installations.redb")
    }
}

impl RuntimeConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl LifecycleConfig {
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_secs.map(Duration::from_secs)
    }

    pub fn lock_wait(&self) -> Option<Duration> {
        self.lock_wait_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: HubConfig = toml::from_str("").unwrap();
        assert_eq!(config, HubConfig::default());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.runtime.docker_bin, "docker");
        assert_eq!(config.store_path(), PathBuf::from("data/installations.redb"));
        assert!(config.lifecycle.operation_timeout().is_none());
    }

    #[test]
    fn test_parse_partial() {
        let toml_str = r#"
catalog_dir = "/srv/depin/apps"

[runtime]
command_timeout_secs = 120

[lifecycle]
lock_wait_secs = 0
"#;
        let config: HubConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.catalog_dir, PathBuf::from("/srv/depin/apps"));
        assert_eq!(config.runtime.command_timeout(), Duration::from_secs(120));
        assert_eq!(config.runtime.probe_timeout_secs, 10);
        assert_eq!(config.lifecycle.lock_wait(), Some(Duration::ZERO));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = HubConfig::default();
        config.lifecycle.operation_timeout_secs = Some(30);
        let toml_str = config.to_toml_string().unwrap();
        let parsed: HubConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }
}
