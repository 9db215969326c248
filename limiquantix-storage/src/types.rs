//! Records exchanged with the control plane.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Device-config key holding the pool definition fragment.
pub const CONFIG_XML: &str = "xml";
/// Device-config key holding the pool name.
pub const CONFIG_NAME: &str = "name";
/// Device-config key holding the hypervisor URI.
pub const CONFIG_URI: &str = "uri";

/// SR device configuration as sent by the control plane.
pub type DeviceConfig = HashMap<String, String>;

/// A virtual disk as reported to the control plane.
///
/// Rebuilt from the volume on every query; nothing here is stored locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VdiInfo {
    /// Library-assigned volume key
    pub key: String,
    /// Display name
    pub name_label: String,
    /// Description (not tracked)
    #[serde(default)]
    pub name_description: String,
    /// Capacity in bytes
    pub virtual_size: u64,
    /// Allocated bytes
    #[serde(default)]
    pub physical_utilisation: u64,
    /// Read-only flag
    #[serde(default)]
    pub read_only: bool,
    /// Always false; snapshots are not supported
    #[serde(default)]
    pub is_a_snapshot: bool,
    /// Always empty
    #[serde(default)]
    pub snapshot_of: String,
    /// Not tracked, left at the epoch
    #[serde(default)]
    pub snapshot_time: DateTime<Utc>,
    /// Volumes survive detach
    #[serde(default = "default_persistent")]
    pub persistent: bool,
    /// Always empty
    #[serde(default)]
    pub sm_config: HashMap<String, String>,
}

fn default_persistent() -> bool {
    true
}

impl VdiInfo {
    /// Describe a disk the control plane wants created.
    pub fn new(name_label: impl Into<String>, virtual_size: u64) -> Self {
        Self {
            key: String::new(),
            name_label: name_label.into(),
            name_description: String::new(),
            virtual_size,
            physical_utilisation: 0,
            read_only: false,
            is_a_snapshot: false,
            snapshot_of: String::new(),
            snapshot_time: DateTime::<Utc>::default(),
            persistent: true,
            sm_config: HashMap::new(),
        }
    }

    /// Build the record for an existing volume.
    pub fn from_volume(volume: &VolumeDetails) -> Self {
        Self {
            key: volume.key.clone(),
            physical_utilisation: volume.allocation,
            ..Self::new(volume.name.clone(), volume.capacity)
        }
    }
}

/// What the pool API reports about a single volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeDetails {
    /// Stable key
    pub key: String,
    /// Primary name within the pool
    pub name: String,
    /// Capacity in bytes
    pub capacity: u64,
    /// Allocated bytes
    pub allocation: u64,
}

/// Information returned by VDI attach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachInfo {
    /// Device path of the volume
    pub path: String,
    /// Auxiliary key/value data for the datapath
    pub xenstore_data: HashMap<String, String>,
}

/// Operations the control plane may call that this plugin does not provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedOperation {
    SrDestroy,
    SrStat,
    SrReset,
    SrList,
    VdiClone,
    VdiSnapshot,
    VdiResize,
    VdiStat,
    VdiSetName,
    VdiSetDescription,
    VdiSetPersistent,
    VdiEpochBegin,
    VdiEpochEnd,
    VdiSetContentId,
    VdiAddToSmConfig,
    VdiRemoveFromSmConfig,
    VdiCompose,
    VdiSimilarContent,
    VdiGetByName,
    VdiGetUrl,
}

impl UnsupportedOperation {
    /// RPC-style name of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnsupportedOperation::SrDestroy => "SR.destroy",
            UnsupportedOperation::SrStat => "SR.stat",
            UnsupportedOperation::SrReset => "SR.reset",
            UnsupportedOperation::SrList => "SR.list",
            UnsupportedOperation::VdiClone => "VDI.clone",
            UnsupportedOperation::VdiSnapshot => "VDI.snapshot",
            UnsupportedOperation::VdiResize => "VDI.resize",
            UnsupportedOperation::VdiStat => "VDI.stat",
            UnsupportedOperation::VdiSetName => "VDI.set_name_label",
            UnsupportedOperation::VdiSetDescription => "VDI.set_name_description",
            UnsupportedOperation::VdiSetPersistent => "VDI.set_persistent",
            UnsupportedOperation::VdiEpochBegin => "VDI.epoch_begin",
            UnsupportedOperation::VdiEpochEnd => "VDI.epoch_end",
            UnsupportedOperation::VdiSetContentId => "VDI.set_content_id",
            UnsupportedOperation::VdiAddToSmConfig => "VDI.add_to_sm_config",
            UnsupportedOperation::VdiRemoveFromSmConfig => "VDI.remove_from_sm_config",
            UnsupportedOperation::VdiCompose => "VDI.compose",
            UnsupportedOperation::VdiSimilarContent => "VDI.similar_content",
            UnsupportedOperation::VdiGetByName => "VDI.get_by_name",
            UnsupportedOperation::VdiGetUrl => "VDI.get_url",
        }
    }
}

impl fmt::Display for UnsupportedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
