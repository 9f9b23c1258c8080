//! Configuration types for the MokAPI server.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,

    /// Directory holding one definition file per endpoint.
    /// Empty disables file-backed definitions and the watcher.
    #[serde(default = "default_definitions_path")]
    pub definitions_path: String,

    /// Interval between two checks of the definition files
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,

    /// Debug logging toggle
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_definitions_path() -> String {
    "./fileDefinitions".to_string()
}

fn default_check_interval_ms() -> u64 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            definitions_path: default_definitions_path(),
            check_interval_ms: default_check_interval_ms(),
            debug: false,
        }
    }
}

impl Config {
    /// Load a YAML (or JSON) config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.listen.host.trim().is_empty() {
            anyhow::bail!("listen.host must not be empty");
        }
        if self.check_interval_ms == 0 {
            anyhow::bail!("check_interval_ms must be greater than zero");
        }
        Ok(())
    }

    /// Definitions directory, or `None` when file-backed definitions are disabled
    pub fn definitions_dir(&self) -> Option<PathBuf> {
        let path = self.definitions_path.trim();
        if path.is_empty() {
            None
        } else {
            Some(PathBuf::from(path))
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.listen.host, "localhost");
        assert_eq!(config.listen.port, 8080);
        assert_eq!(config.check_interval(), Duration::from_secs(5));
        assert_eq!(
            config.definitions_dir(),
            Some(PathBuf::from("./fileDefinitions"))
        );
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
listen:
  host: 0.0.0.0
  port: 9090
definitions_path: /etc/mokapi/definitions
check_interval_ms: 250
debug: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.listen.host, "0.0.0.0");
        assert_eq!(config.listen.port, 9090);
        assert_eq!(
            config.definitions_dir(),
            Some(PathBuf::from("/etc/mokapi/definitions"))
        );
        assert_eq!(config.check_interval(), Duration::from_millis(250));
        assert!(config.debug);
    }

    #[test]
    fn test_parse_partial_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("listen:\n  port: 3000\n").unwrap();
        assert_eq!(config.listen.host, "localhost");
        assert_eq!(config.listen.port, 3000);
        assert_eq!(config.check_interval_ms, 5000);
    }

    #[test]
    fn test_parse_json_config() {
        let config: Config =
            serde_yaml::from_str(r#"{"definitions_path": "", "check_interval_ms": 100}"#).unwrap();
        assert_eq!(config.definitions_dir(), None);
        assert_eq!(config.check_interval_ms, 100);
    }

    #[test]
    fn test_blank_definitions_path_disables_loading() {
        let config = Config {
            definitions_path: "   ".to_string(),
            ..Config::default()
        };
        assert_eq!(config.definitions_dir(), None);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = Config {
            check_interval_ms: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mokapi.yaml");
        std::fs::write(&path, "definitions_path: ./defs\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.definitions_dir(), Some(PathBuf::from("./defs")));
        assert!(Config::from_file(dir.path().join("missing.yaml")).is_err());
    }
}
