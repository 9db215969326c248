//! In-memory pool API for testing and development.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockWriteGuard};
use tracing::{debug, info, instrument};

use crate::api::PoolApi;
use crate::descriptor;
use crate::error::{NativeError, NativeResult};
use crate::types::VolumeDetails;

/// Mock pool API.
///
/// Simulates libvirt pools and RBD-style volumes in memory. Useful for:
/// - Unit and integration testing
/// - Development without libvirt installed (`--dev`)
///
/// Volume keys and paths are `<pool>/<volume>`. The mock counts connection
/// opens/closes and every API call so tests can check what was touched.
pub struct MockPoolApi {
    state: RwLock<MockState>,
    next_conn: AtomicU64,
    opened: AtomicUsize,
    closed: AtomicUsize,
    calls: AtomicUsize,
}

#[derive(Default)]
struct MockState {
    pools: HashMap<String, BTreeMap<String, MockVolume>>,
    live: HashSet<u64>,
    broken: HashSet<String>,
    drop_created: bool,
    fail_close: bool,
}

#[derive(Clone)]
struct MockVolume {
    capacity: u64,
    allocation: u64,
}

/// Mock connection handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockConnection {
    id: u64,
    uri: Option<String>,
}

impl MockConnection {
    /// URI the connection was opened with.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }
}

/// Mock pool handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPool {
    conn: u64,
    name: String,
}

/// Mock volume handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockVolumeRef {
    conn: u64,
    pool: String,
    name: String,
}

impl MockPoolApi {
    /// Create an empty mock.
    pub fn new() -> Self {
        info!("Creating mock pool API");
        Self {
            state: RwLock::new(MockState::default()),
            next_conn: AtomicU64::new(1),
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Add an empty pool.
    pub fn with_pool(self, name: &str) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.pools.entry(name.to_string()).or_default();
        }
        self
    }

    /// Add a fully allocated volume to a pool, creating the pool if needed.
    pub fn with_volume(self, pool: &str, name: &str, capacity: u64) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.pools.entry(pool.to_string()).or_default().insert(
                name.to_string(),
                MockVolume { capacity, allocation: capacity },
            );
        }
        self
    }

    /// Make every lookup of this volume fail as if the library could not read it.
    pub fn with_broken_volume(self, pool: &str, name: &str) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.broken.insert(format!("{}/{}", pool, name));
        }
        self
    }

    /// Accept volume creation but never store the volume.
    pub fn with_dropped_creates(self) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.drop_created = true;
        }
        self
    }

    /// Make every connection close fail after the handle is released.
    pub fn with_failing_close(self) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.fail_close = true;
        }
        self
    }

    /// Number of connections opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of connections closed so far.
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of API calls of any kind.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Whether a pool with this name exists.
    pub fn has_pool(&self, name: &str) -> bool {
        self.state
            .read()
            .map(|s| s.pools.contains_key(name))
            .unwrap_or(false)
    }

    /// Volume names in a pool, sorted.
    pub fn volume_names(&self, pool: &str) -> Vec<String> {
        self.state
            .read()
            .ok()
            .and_then(|s| s.pools.get(pool).map(|v| v.keys().cloned().collect()))
            .unwrap_or_default()
    }

    fn state(&self) -> NativeResult<RwLockWriteGuard<'_, MockState>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.state
            .write()
            .map_err(|_| NativeError::new("Lock poisoned"))
    }
}

impl Default for MockPoolApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockState {
    fn check_conn(&self, conn: u64) -> NativeResult<()> {
        if self.live.contains(&conn) {
            Ok(())
        } else {
            Err(NativeError::new("invalid connection pointer in virConnectRef"))
        }
    }

    fn volume(&self, conn: u64, pool: &str, name: &str) -> NativeResult<MockVolume> {
        self.check_conn(conn)?;
        let key = format!("{}/{}", pool, name);
        if self.broken.contains(&key) {
            return Err(NativeError::new(format!("failed to open the RBD image '{}'", key)));
        }
        self.pools
            .get(pool)
            .and_then(|volumes| volumes.get(name))
            .cloned()
            .ok_or_else(|| NativeError::new(format!(
                "Storage volume not found: no storage vol with matching name '{}'",
                name
            )))
    }
}

#[async_trait]
impl PoolApi for MockPoolApi {
    type Connection = MockConnection;
    type Pool = MockPool;
    type Volume = MockVolumeRef;

    fn name(&self) -> &'static str {
        "mock"
    }

    #[instrument(skip(self))]
    async fn open(&self, uri: Option<&str>) -> NativeResult<MockConnection> {
        let mut state = self.state()?;
        let id = self.next_conn.fetch_add(1, Ordering::SeqCst);
        state.live.insert(id);
        self.opened.fetch_add(1, Ordering::SeqCst);

        debug!(conn = id, "Mock connection opened");
        Ok(MockConnection {
            id,
            uri: uri.map(str::to_string),
        })
    }

    async fn close(&self, conn: MockConnection) -> NativeResult<()> {
        let mut state = self.state()?;
        if !state.live.remove(&conn.id) {
            return Err(NativeError::new("connection already closed"));
        }
        self.closed.fetch_add(1, Ordering::SeqCst);
        if state.fail_close {
            return Err(NativeError::new("failed to close connection: I/O error"));
        }

        debug!(conn = conn.id, "Mock connection closed");
        Ok(())
    }

    async fn pool_by_name(&self, conn: &MockConnection, name: &str) -> NativeResult<MockPool> {
        let state = self.state()?;
        state.check_conn(conn.id)?;
        if !state.pools.contains_key(name) {
            return Err(NativeError::new(format!(
                "Storage pool not found: no storage pool with matching name '{}'",
                name
            )));
        }
        Ok(MockPool {
            conn: conn.id,
            name: name.to_string(),
        })
    }

    async fn create_pool(&self, conn: &MockConnection, xml: &str) -> NativeResult<()> {
        let mut state = self.state()?;
        state.check_conn(conn.id)?;
        let name = descriptor::extract(xml, &["name", "pool"])
            .map_err(|e| NativeError::new(format!("XML error: {}", e)))?;
        if state.pools.contains_key(&name) {
            return Err(NativeError::new(format!(
                "operation failed: pool '{}' already exists",
                name
            )));
        }
        state.pools.insert(name, BTreeMap::new());
        Ok(())
    }

    async fn list_volumes(&self, pool: &MockPool) -> NativeResult<Vec<String>> {
        let state = self.state()?;
        state.check_conn(pool.conn)?;
        Ok(state
            .pools
            .get(&pool.name)
            .map(|v| v.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn volume_by_name(&self, pool: &MockPool, name: &str) -> NativeResult<MockVolumeRef> {
        let state = self.state()?;
        state.volume(pool.conn, &pool.name, name)?;
        Ok(MockVolumeRef {
            conn: pool.conn,
            pool: pool.name.clone(),
            name: name.to_string(),
        })
    }

    async fn volume_by_path(&self, pool: &MockPool, path: &str) -> NativeResult<MockVolumeRef> {
        let state = self.state()?;
        state.check_conn(pool.conn)?;
        let (pool_name, name) = path.split_once('/').ok_or_else(|| {
            NativeError::new(format!(
                "Storage volume not found: no storage vol with matching path '{}'",
                path
            ))
        })?;
        state.volume(pool.conn, pool_name, name)?;
        Ok(MockVolumeRef {
            conn: pool.conn,
            pool: pool_name.to_string(),
            name: name.to_string(),
        })
    }

    async fn create_volume(&self, pool: &MockPool, xml: &str) -> NativeResult<MockVolumeRef> {
        let mut state = self.state()?;
        state.check_conn(pool.conn)?;
        let name = descriptor::extract(xml, &["name", "volume"])
            .map_err(|e| NativeError::new(format!("XML error: {}", e)))?;
        let capacity = descriptor::extract(xml, &["capacity", "volume"])
            .ok()
            .and_then(|c| c.parse::<u64>().ok())
            .ok_or_else(|| NativeError::new("XML error: missing or invalid capacity"))?;

        let drop_created = state.drop_created;
        let volumes = state.pools.get_mut(&pool.name).ok_or_else(|| {
            NativeError::new(format!("storage pool '{}' is not active", pool.name))
        })?;
        if volumes.contains_key(&name) {
            return Err(NativeError::new(format!(
                "storage volume name '{}' already in use.",
                name
            )));
        }
        if !drop_created {
            // Thin provisioned: nothing allocated yet
            volumes.insert(name.clone(), MockVolume { capacity, allocation: 0 });
        }

        Ok(MockVolumeRef {
            conn: pool.conn,
            pool: pool.name.clone(),
            name,
        })
    }

    async fn delete_volume(&self, volume: &MockVolumeRef) -> NativeResult<()> {
        let mut state = self.state()?;
        state.volume(volume.conn, &volume.pool, &volume.name)?;
        if let Some(volumes) = state.pools.get_mut(&volume.pool) {
            volumes.remove(&volume.name);
        }
        Ok(())
    }

    async fn volume_details(&self, volume: &MockVolumeRef) -> NativeResult<VolumeDetails> {
        let state = self.state()?;
        let vol = state.volume(volume.conn, &volume.pool, &volume.name)?;
        Ok(VolumeDetails {
            key: format!("{}/{}", volume.pool, volume.name),
            name: volume.name.clone(),
            capacity: vol.capacity,
            allocation: vol.allocation,
        })
    }

    async fn volume_xml(&self, volume: &MockVolumeRef) -> NativeResult<String> {
        let state = self.state()?;
        let vol = state.volume(volume.conn, &volume.pool, &volume.name)?;
        Ok(format!(
            r#"<volume type='network'>
  <name>{name}</name>
  <key>{pool}/{name}</key>
  <capacity unit='bytes'>{capacity}</capacity>
  <allocation unit='bytes'>{allocation}</allocation>
  <target>
    <path>{pool}/{name}</path>
    <format type='raw'/>
  </target>
</volume>"#,
            name = volume.name,
            pool = volume.pool,
            capacity = vol.capacity,
            allocation = vol.allocation,
        ))
    }
}
