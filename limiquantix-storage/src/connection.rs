//! Shared hypervisor connection.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::PoolApi;
use crate::error::{NativeResultExt, Result};

struct Slot<C> {
    conn: C,
    uri: Option<String>,
}

/// Owns the single hypervisor connection of a storage service.
///
/// The connection is opened on first use and closed once no SR depends on it.
pub struct ConnectionManager<A: PoolApi> {
    api: Arc<A>,
    current: Mutex<Option<Slot<A::Connection>>>,
}

impl<A: PoolApi> ConnectionManager<A> {
    /// Create a manager with no open connection.
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            current: Mutex::new(None),
        }
    }

    /// Return the shared connection, opening it if needed.
    ///
    /// `uri` is only used when the connection is opened. An SR asking for a
    /// different endpoint while a connection is open gets the existing one.
    pub async fn resolve(&self, uri: Option<&str>) -> Result<A::Connection> {
        let mut current = self.current.lock().await;

        if let Some(slot) = current.as_ref() {
            if uri.is_some() && uri != slot.uri.as_deref() {
                warn!(
                    requested = ?uri,
                    connected = ?slot.uri,
                    "Reusing connection to a different endpoint"
                );
            }
            return Ok(slot.conn.clone());
        }

        info!(uri = ?uri, "Opening hypervisor connection");
        let conn = self.api.open(uri).await.translate(self.api.name(), "open")?;
        *current = Some(Slot {
            conn: conn.clone(),
            uri: uri.map(str::to_string),
        });

        Ok(conn)
    }

    /// Close the connection if `attached` (the registry occupancy) is zero.
    pub async fn release_if_unused(&self, attached: usize) -> Result<()> {
        if attached > 0 {
            debug!(attached, "Connection still in use");
            return Ok(());
        }

        let slot = self.current.lock().await.take();
        if let Some(slot) = slot {
            info!(uri = ?slot.uri, "Closing idle hypervisor connection");
            self.api.close(slot.conn).await.translate(self.api.name(), "close")?;
        }

        Ok(())
    }

    /// Whether a connection is currently open.
    pub async fn is_open(&self) -> bool {
        self.current.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPoolApi;

    #[tokio::test]
    async fn test_resolve_opens_once() {
        let api = Arc::new(MockPoolApi::new());
        let manager = ConnectionManager::new(api.clone());

        let first = manager.resolve(Some("qemu:///system")).await.unwrap();
        let second = manager.resolve(Some("qemu+ssh://other/system")).await.unwrap();

        assert_eq!(api.opened(), 1);
        // The second endpoint is ignored
        assert_eq!(first, second);
        assert_eq!(second.uri(), Some("qemu:///system"));
    }

    #[tokio::test]
    async fn test_release_only_when_unused() {
        let api = Arc::new(MockPoolApi::new());
        let manager = ConnectionManager::new(api.clone());
        manager.resolve(None).await.unwrap();

        manager.release_if_unused(2).await.unwrap();
        assert!(manager.is_open().await);
        assert_eq!(api.closed(), 0);

        manager.release_if_unused(0).await.unwrap();
        assert!(!manager.is_open().await);
        assert_eq!(api.closed(), 1);

        // Nothing left to close
        manager.release_if_unused(0).await.unwrap();
        assert_eq!(api.closed(), 1);
    }

    #[tokio::test]
    async fn test_reopen_after_release() {
        let api = Arc::new(MockPoolApi::new());
        let manager = ConnectionManager::new(api.clone());

        manager.resolve(None).await.unwrap();
        manager.release_if_unused(0).await.unwrap();
        let conn = manager.resolve(Some("qemu:///session")).await.unwrap();

        assert_eq!(api.opened(), 2);
        assert_eq!(conn.uri(), Some("qemu:///session"));
    }
}
