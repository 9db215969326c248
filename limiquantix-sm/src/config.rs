//! Configuration management for the storage manager.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use limiquantix_common::LogFormat;
use limiquantix_storage::PluginInfo;

use crate::cli::Args;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/limiquantix/sm.yaml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pool API configuration
    pub libvirt: LibvirtConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Runtime state configuration
    pub runtime: RuntimeConfig,
    /// Development mode settings
    pub dev: DevConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| "Failed to parse config file")?;

        Ok(config)
    }

    /// Apply CLI argument overrides to the configuration.
    pub fn with_cli_overrides(mut self, args: &Args) -> Result<Self> {
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }

        if let Some(ref format) = args.log_format {
            self.logging.format = format.parse()?;
        }

        if let Some(ref uri) = args.libvirt_uri {
            self.libvirt.uri = Some(uri.clone());
        }

        if args.dev {
            self.libvirt.backend = PoolBackend::Mock;
        }

        Ok(self)
    }
}

/// Pool API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibvirtConfig {
    /// Backend type
    pub backend: PoolBackend,
    /// Hypervisor URI passed as the SR "uri" key; libvirt's default if unset
    pub uri: Option<String>,
}

impl Default for LibvirtConfig {
    fn default() -> Self {
        Self {
            backend: PoolBackend::Libvirt,
            uri: None,
        }
    }
}

/// Pool API backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolBackend {
    /// In-memory pools for testing/development
    Mock,
    /// Libvirt storage pools
    Libvirt,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Runtime state configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Directory for non-persistent runtime state
    pub state_dir: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            state_dir: PluginInfo::current().state_dir(),
        }
    }
}

/// Development mode settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DevConfig {
    /// Pools that exist up front in the mock backend
    pub pools: Vec<String>,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            pools: vec!["default".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.libvirt.backend, PoolBackend::Libvirt);
        assert!(config.libvirt.uri.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.runtime.state_dir, "/var/run/nonpersistent/libvirt");
    }

    #[test]
    fn test_load_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
libvirt:
  backend: mock
  uri: qemu:///session
logging:
  level: debug
  format: json
dev:
  pools: [gold, silver]
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.libvirt.backend, PoolBackend::Mock);
        assert_eq!(config.libvirt.uri.as_deref(), Some("qemu:///session"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.dev.pools, vec!["gold", "silver"]);
        // Unset sections keep their defaults
        assert_eq!(config.runtime.state_dir, "/var/run/nonpersistent/libvirt");
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::load("/nonexistent/sm.yaml").is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::try_parse_from([
            "limiquantix-sm",
            "--dev",
            "--log-format",
            "json",
            "--libvirt-uri",
            "qemu+ssh://root@host/system",
            "query",
        ])
        .unwrap();

        let config = Config::default().with_cli_overrides(&args).unwrap();
        assert_eq!(config.libvirt.backend, PoolBackend::Mock);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.libvirt.uri.as_deref(), Some("qemu+ssh://root@host/system"));
    }
}
