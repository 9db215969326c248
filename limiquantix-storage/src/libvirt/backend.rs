//! Libvirt pool API implementation.

use async_trait::async_trait;
use tracing::{debug, info, instrument};
use virt::connect::Connect;
use virt::storage_pool::StoragePool;
use virt::storage_vol::StorageVol;

use crate::api::PoolApi;
use crate::error::{NativeError, NativeResult};
use crate::types::VolumeDetails;

fn native(e: virt::error::Error) -> NativeError {
    NativeError::new(e.to_string())
}

/// Storage pool handle together with the connection it was found on.
///
/// Volume path lookups are connection-wide in libvirt, so the pool carries
/// its connection along.
#[derive(Clone)]
pub struct LibvirtPool {
    conn: Connect,
    pool: StoragePool,
}

/// Pool API backed by libvirt storage pools and volumes.
pub struct LibvirtPoolApi;

impl LibvirtPoolApi {
    /// Create the libvirt pool API.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LibvirtPoolApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PoolApi for LibvirtPoolApi {
    type Connection = Connect;
    type Pool = LibvirtPool;
    type Volume = StorageVol;

    fn name(&self) -> &'static str {
        "libvirt"
    }

    /// Common URIs:
    /// - `qemu:///system` - System-wide QEMU/KVM
    /// - `qemu+ssh://user@host/system` - Remote via SSH
    #[instrument(skip(self))]
    async fn open(&self, uri: Option<&str>) -> NativeResult<Connect> {
        info!("Connecting to libvirt");
        let conn = Connect::open(uri).map_err(native)?;
        info!("Connected to libvirt");
        Ok(conn)
    }

    async fn close(&self, mut conn: Connect) -> NativeResult<()> {
        let remaining = conn.close().map_err(native)?;
        debug!(remaining, "Closed libvirt connection");
        Ok(())
    }

    async fn pool_by_name(&self, conn: &Connect, name: &str) -> NativeResult<LibvirtPool> {
        let pool = StoragePool::lookup_by_name(conn, name).map_err(native)?;
        Ok(LibvirtPool {
            conn: conn.clone(),
            pool,
        })
    }

    async fn create_pool(&self, conn: &Connect, xml: &str) -> NativeResult<()> {
        debug!(xml = %xml, "Creating storage pool");
        StoragePool::create_xml(conn, xml, 0).map_err(native)?;
        Ok(())
    }

    async fn list_volumes(&self, pool: &LibvirtPool) -> NativeResult<Vec<String>> {
        pool.pool.list_volumes().map_err(native)
    }

    async fn volume_by_name(&self, pool: &LibvirtPool, name: &str) -> NativeResult<StorageVol> {
        StorageVol::lookup_by_name(&pool.pool, name).map_err(native)
    }

    async fn volume_by_path(&self, pool: &LibvirtPool, path: &str) -> NativeResult<StorageVol> {
        StorageVol::lookup_by_path(&pool.conn, path).map_err(native)
    }

    async fn create_volume(&self, pool: &LibvirtPool, xml: &str) -> NativeResult<StorageVol> {
        debug!(xml = %xml, "Creating storage volume");
        StorageVol::create_xml(&pool.pool, xml, 0).map_err(native)
    }

    async fn delete_volume(&self, volume: &StorageVol) -> NativeResult<()> {
        // 0 = VIR_STORAGE_VOL_DELETE_NORMAL
        volume.delete(0).map_err(native)
    }

    async fn volume_details(&self, volume: &StorageVol) -> NativeResult<VolumeDetails> {
        let info = volume.get_info().map_err(native)?;
        Ok(VolumeDetails {
            key: volume.get_key().map_err(native)?,
            name: volume.get_name().map_err(native)?,
            capacity: info.capacity,
            allocation: info.allocation,
        })
    }

    async fn volume_xml(&self, volume: &StorageVol) -> NativeResult<String> {
        volume.get_xml_desc(0).map_err(native)
    }
}
