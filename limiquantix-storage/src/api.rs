//! Pool/volume API abstraction.

use async_trait::async_trait;

use crate::error::NativeResult;
use crate::types::VolumeDetails;

/// The external pool/volume library, as the storage manager uses it.
///
/// Implemented by the libvirt bindings and by [`crate::MockPoolApi`]. Every
/// method reports the library's own failure as a [`crate::NativeError`];
/// translation into typed errors happens at the call site.
#[async_trait]
pub trait PoolApi: Send + Sync + 'static {
    /// Live hypervisor connection.
    type Connection: Clone + Send + Sync;
    /// Handle to a storage pool, valid while its connection is open.
    type Pool: Clone + Send + Sync;
    /// Handle to a single volume.
    type Volume: Send + Sync;

    /// Identifying name of the library, used in error reports.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Connection
    // =========================================================================

    /// Open a connection. `None` lets the library pick its default endpoint.
    async fn open(&self, uri: Option<&str>) -> NativeResult<Self::Connection>;

    /// Close a connection.
    async fn close(&self, conn: Self::Connection) -> NativeResult<()>;

    // =========================================================================
    // Pools
    // =========================================================================

    /// Look up a pool by name.
    async fn pool_by_name(&self, conn: &Self::Connection, name: &str) -> NativeResult<Self::Pool>;

    /// Create a pool from a pool descriptor.
    async fn create_pool(&self, conn: &Self::Connection, xml: &str) -> NativeResult<()>;

    /// Names of all volumes in a pool.
    async fn list_volumes(&self, pool: &Self::Pool) -> NativeResult<Vec<String>>;

    // =========================================================================
    // Volumes
    // =========================================================================

    /// Look up a volume by its name within a pool.
    async fn volume_by_name(&self, pool: &Self::Pool, name: &str) -> NativeResult<Self::Volume>;

    /// Look up a volume by its path.
    async fn volume_by_path(&self, pool: &Self::Pool, path: &str) -> NativeResult<Self::Volume>;

    /// Create a volume from a volume descriptor.
    async fn create_volume(&self, pool: &Self::Pool, xml: &str) -> NativeResult<Self::Volume>;

    /// Delete a volume (normal, non-zeroing mode).
    async fn delete_volume(&self, volume: &Self::Volume) -> NativeResult<()>;

    /// Key, name, capacity and allocation of a volume.
    async fn volume_details(&self, volume: &Self::Volume) -> NativeResult<VolumeDetails>;

    /// The volume's XML descriptor.
    async fn volume_xml(&self, volume: &Self::Volume) -> NativeResult<String>;
}
