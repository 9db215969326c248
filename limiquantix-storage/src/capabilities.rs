//! Plugin capability descriptor returned by `Plugin.query`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{CONFIG_NAME, CONFIG_URI, CONFIG_XML};

/// Minimum storage API version the control plane must speak.
pub const REQUIRED_API_VERSION: &str = "2.0";

/// Features advertised to the control plane. No clone, snapshot or resize.
pub const FEATURES: [&str; 6] = [
    "VDI_CREATE",
    "VDI_DELETE",
    "VDI_ATTACH",
    "VDI_DETACH",
    "VDI_ACTIVATE",
    "VDI_DEACTIVATE",
];

/// Runtime state directory pattern; `{}` is the plugin name.
pub const STATE_DIR_PATTERN: &str = "/var/run/nonpersistent/{}";

/// Static description of the plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub plugin: String,
    pub name: String,
    pub description: String,
    pub vendor: String,
    pub copyright: String,
    pub version: String,
    pub required_api_version: String,
    pub features: Vec<String>,
    /// Recognised device-config keys and what they mean
    pub configuration: HashMap<String, String>,
}

impl PluginInfo {
    /// The descriptor for this plugin.
    pub fn current() -> Self {
        let configuration = [
            (CONFIG_XML, "XML fragment describing the storage pool configuration"),
            (CONFIG_NAME, "name of the libvirt storage pool"),
            (CONFIG_URI, "URI of the hypervisor to use"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            plugin: "libvirt".to_string(),
            name: "libvirt storage plugin".to_string(),
            description: "Exposes libvirt storage pools as SRs and their volumes as VDIs".to_string(),
            vendor: "limiquantix Team".to_string(),
            copyright: "(C) limiquantix Team".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            required_api_version: REQUIRED_API_VERSION.to_string(),
            features: FEATURES.iter().map(|f| f.to_string()).collect(),
            configuration,
        }
    }

    /// Runtime state directory for this plugin.
    pub fn state_dir(&self) -> String {
        STATE_DIR_PATTERN.replace("{}", &self.plugin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_clone_snapshot_or_resize() {
        let info = PluginInfo::current();
        assert_eq!(info.features.len(), 6);
        for missing in ["VDI_CLONE", "VDI_SNAPSHOT", "VDI_RESIZE"] {
            assert!(!info.features.iter().any(|f| f == missing));
        }
    }

    #[test]
    fn test_configuration_keys() {
        let info = PluginInfo::current();
        let mut keys: Vec<_> = info.configuration.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["name", "uri", "xml"]);
        assert_eq!(info.state_dir(), "/var/run/nonpersistent/libvirt");
    }
}
