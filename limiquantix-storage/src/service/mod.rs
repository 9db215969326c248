//! SR and VDI operations.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      StorageService                             │
//! │  - SR.attach/create/detach/scan, VDI.create/destroy/attach/...  │
//! └────────┬──────────────────────┬───────────────────────┬─────────┘
//!          ▼                      ▼                       ▼
//! ┌─────────────────┐   ┌───────────────────┐   ┌───────────────────┐
//! │ Attachment      │   │ Connection        │   │ naming /          │
//! │ Registry        │──▶│ Manager           │   │ descriptor        │
//! └─────────────────┘   └─────────┬─────────┘   └───────────────────┘
//!                                 ▼
//!                       ┌───────────────────┐
//!                       │  PoolApi          │
//!                       │ (libvirt / mock)  │
//!                       └───────────────────┘
//! ```
//!
//! The registry lock is taken before the connection lock whenever both are
//! needed, so an attach can never observe a connection that a concurrent
//! detach is closing. Callers are still expected to serialize requests for
//! the same SR.

mod sr;
mod unsupported;
mod vdi;

pub use unsupported::UnsupportedOps;
pub use vdi::VOLUME_SUFFIX;

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::api::PoolApi;
use crate::connection::ConnectionManager;
use crate::error::{NativeResultExt, Result, StorageError};
use crate::registry::AttachmentRegistry;
use crate::types::{DeviceConfig, VdiInfo};

/// Storage manager bridging the control plane to a pool API.
pub struct StorageService<A: PoolApi> {
    api: Arc<A>,
    connections: ConnectionManager<A>,
    attached: RwLock<AttachmentRegistry<A::Pool>>,
}

impl<A: PoolApi> StorageService<A> {
    /// Create a service with nothing attached and no open connection.
    pub fn new(api: Arc<A>) -> Self {
        Self {
            connections: ConnectionManager::new(api.clone()),
            api,
            attached: RwLock::new(AttachmentRegistry::new()),
        }
    }

    /// The underlying pool API.
    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Number of attached SRs.
    pub async fn attached_count(&self) -> usize {
        self.attached.read().await.count()
    }

    /// Whether the shared connection is open.
    pub async fn is_connected(&self) -> bool {
        self.connections.is_open().await
    }

    /// Pool handle of an attached SR.
    async fn pool(&self, sr: &str) -> Result<A::Pool> {
        self.attached.read().await.get(sr)
    }

    /// Build the VDI record for the volume `name`.
    async fn vdi_record(&self, pool: &A::Pool, name: &str) -> Result<VdiInfo> {
        let source = self.api.name();
        let volume = self
            .api
            .volume_by_name(pool, name)
            .await
            .translate(source, "volume_by_name")?;
        let details = self
            .api
            .volume_details(&volume)
            .await
            .translate(source, "volume_details")?;
        Ok(VdiInfo::from_volume(&details))
    }
}

/// Fetch a required device-config key.
fn require<'a>(config: &'a DeviceConfig, key: &str) -> Result<&'a str> {
    config
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| StorageError::MissingParameter(key.to_string()))
}
