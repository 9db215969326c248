//! Operations this plugin does not provide.

use super::StorageService;
use crate::api::PoolApi;
use crate::error::{Result, StorageError};
use crate::types::{UnsupportedOperation, VdiInfo};

fn unsupported<T>(op: UnsupportedOperation) -> Result<T> {
    Err(StorageError::Unimplemented(op))
}

/// The part of the SR/VDI contract that is not supported.
///
/// Every method has a default that reports [`StorageError::Unimplemented`]
/// without touching the pool API. Arguments mirror the control-plane calls.
pub trait UnsupportedOps {
    fn sr_destroy(&self, _sr: &str) -> Result<()> {
        unsupported(UnsupportedOperation::SrDestroy)
    }

    fn sr_stat(&self, _sr: &str) -> Result<()> {
        unsupported(UnsupportedOperation::SrStat)
    }

    fn sr_reset(&self, _sr: &str) -> Result<()> {
        unsupported(UnsupportedOperation::SrReset)
    }

    fn sr_list(&self) -> Result<Vec<String>> {
        unsupported(UnsupportedOperation::SrList)
    }

    fn vdi_clone(&self, _sr: &str, _vdi: &VdiInfo) -> Result<VdiInfo> {
        unsupported(UnsupportedOperation::VdiClone)
    }

    fn vdi_snapshot(&self, _sr: &str, _vdi: &VdiInfo) -> Result<VdiInfo> {
        unsupported(UnsupportedOperation::VdiSnapshot)
    }

    fn vdi_resize(&self, _sr: &str, _vdi: &str, _new_size: u64) -> Result<u64> {
        unsupported(UnsupportedOperation::VdiResize)
    }

    fn vdi_stat(&self, _sr: &str, _vdi: &str) -> Result<VdiInfo> {
        unsupported(UnsupportedOperation::VdiStat)
    }

    fn vdi_set_name_label(&self, _sr: &str, _vdi: &str, _label: &str) -> Result<()> {
        unsupported(UnsupportedOperation::VdiSetName)
    }

    fn vdi_set_name_description(&self, _sr: &str, _vdi: &str, _description: &str) -> Result<()> {
        unsupported(UnsupportedOperation::VdiSetDescription)
    }

    fn vdi_set_persistent(&self, _sr: &str, _vdi: &str, _persistent: bool) -> Result<()> {
        unsupported(UnsupportedOperation::VdiSetPersistent)
    }

    fn vdi_epoch_begin(&self, _sr: &str, _vdi: &str) -> Result<()> {
        unsupported(UnsupportedOperation::VdiEpochBegin)
    }

    fn vdi_epoch_end(&self, _sr: &str, _vdi: &str) -> Result<()> {
        unsupported(UnsupportedOperation::VdiEpochEnd)
    }

    fn vdi_set_content_id(&self, _sr: &str, _vdi: &str, _content_id: &str) -> Result<()> {
        unsupported(UnsupportedOperation::VdiSetContentId)
    }

    fn vdi_add_to_sm_config(&self, _sr: &str, _vdi: &str, _key: &str, _value: &str) -> Result<()> {
        unsupported(UnsupportedOperation::VdiAddToSmConfig)
    }

    fn vdi_remove_from_sm_config(&self, _sr: &str, _vdi: &str, _key: &str) -> Result<()> {
        unsupported(UnsupportedOperation::VdiRemoveFromSmConfig)
    }

    fn vdi_compose(&self, _sr: &str, _parent: &str, _child: &str) -> Result<()> {
        unsupported(UnsupportedOperation::VdiCompose)
    }

    fn vdi_similar_content(&self, _sr: &str, _vdi: &str) -> Result<Vec<VdiInfo>> {
        unsupported(UnsupportedOperation::VdiSimilarContent)
    }

    fn vdi_get_by_name(&self, _sr: &str, _name: &str) -> Result<VdiInfo> {
        unsupported(UnsupportedOperation::VdiGetByName)
    }

    fn vdi_get_url(&self, _sr: &str, _vdi: &str) -> Result<String> {
        unsupported(UnsupportedOperation::VdiGetUrl)
    }
}

impl<A: PoolApi> UnsupportedOps for StorageService<A> {}
