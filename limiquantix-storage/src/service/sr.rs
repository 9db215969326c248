//! SR operations.

use tracing::{info, instrument, warn};

use super::{require, StorageService};
use crate::api::PoolApi;
use crate::descriptor;
use crate::error::{NativeResultExt, Result};
use crate::types::{DeviceConfig, VdiInfo, CONFIG_NAME, CONFIG_URI, CONFIG_XML};

impl<A: PoolApi> StorageService<A> {
    /// Attach an SR to the pool named by `config["name"]`.
    ///
    /// `config["uri"]` selects the hypervisor, but only if no connection is
    /// open yet.
    #[instrument(skip(self, config), fields(sr = %sr))]
    pub async fn sr_attach(&self, sr: &str, config: &DeviceConfig) -> Result<()> {
        let name = require(config, CONFIG_NAME)?;
        let uri = config.get(CONFIG_URI).map(String::as_str);

        let mut attached = self.attached.write().await;
        let conn = self.connections.resolve(uri).await?;

        let result = match self.api.pool_by_name(&conn, name).await.translate(self.api.name(), "pool_by_name") {
            Ok(pool) => attached.put(sr, pool),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            warn!(pool = %name, error = %e, "SR attach failed");
            if let Err(close_err) = self.connections.release_if_unused(attached.count()).await {
                warn!(error = %close_err, "Failed to close connection after failed attach");
            }
            return result;
        }

        info!(pool = %name, attached = attached.count(), "SR attached");
        Ok(())
    }

    /// Define and start a pool from `config["name"]` and `config["xml"]`.
    ///
    /// Does not attach the SR. `physical_size` is accepted but not used by
    /// the pool API.
    #[instrument(skip(self, config), fields(sr = %sr))]
    pub async fn sr_create(&self, sr: &str, config: &DeviceConfig, physical_size: u64) -> Result<()> {
        let name = require(config, CONFIG_NAME)?;
        let fragment = require(config, CONFIG_XML)?;
        let uri = config.get(CONFIG_URI).map(String::as_str);

        let attached = self.attached.write().await;
        let conn = self.connections.resolve(uri).await?;

        let xml = descriptor::pool_xml(name, fragment);
        let result = self.api.create_pool(&conn, &xml).await.translate(self.api.name(), "create_pool");

        if let Err(close_err) = self.connections.release_if_unused(attached.count()).await {
            warn!(error = %close_err, "Failed to close connection after pool create");
        }
        result?;

        info!(pool = %name, "Storage pool created");
        Ok(())
    }

    /// List the VDIs of an attached SR.
    ///
    /// Volumes that cannot be read are logged and left out.
    #[instrument(skip(self), fields(sr = %sr))]
    pub async fn sr_scan(&self, sr: &str) -> Result<Vec<VdiInfo>> {
        let pool = self.pool(sr).await?;
        let names = self
            .api
            .list_volumes(&pool)
            .await
            .translate(self.api.name(), "list_volumes")?;

        let mut vdis = Vec::with_capacity(names.len());
        for name in &names {
            match self.vdi_record(&pool, name).await {
                Ok(vdi) => vdis.push(vdi),
                Err(e) => warn!(volume = %name, error = %e, "Skipping unreadable volume"),
            }
        }

        info!(found = names.len(), reported = vdis.len(), "SR scanned");
        Ok(vdis)
    }

    /// Detach an SR, closing the connection if it was the last one.
    #[instrument(skip(self), fields(sr = %sr))]
    pub async fn sr_detach(&self, sr: &str) -> Result<()> {
        let mut attached = self.attached.write().await;
        attached.remove(sr)?;

        info!(attached = attached.count(), "SR detached");
        self.connections.release_if_unused(attached.count()).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::StorageError;
    use crate::mock::MockPoolApi;

    fn config(pairs: &[(&str, &str)]) -> DeviceConfig {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[tokio::test]
    async fn test_attach_requires_name() {
        let service = StorageService::new(Arc::new(MockPoolApi::new()));

        let err = service.sr_attach("sr-1", &config(&[("uri", "qemu:///system")])).await.unwrap_err();
        assert!(matches!(err, StorageError::MissingParameter(ref k) if k == "name"));
        assert_eq!(service.api().opened(), 0);
    }

    #[tokio::test]
    async fn test_failed_first_attach_closes_connection() {
        let api = Arc::new(MockPoolApi::new());
        let service = StorageService::new(api.clone());

        let err = service.sr_attach("sr-1", &config(&[("name", "missing")])).await.unwrap_err();
        assert!(matches!(err, StorageError::Backend { .. }));
        assert_eq!(api.opened(), 1);
        assert_eq!(api.closed(), 1);
        assert!(!service.is_connected().await);
    }

    #[tokio::test]
    async fn test_create_requires_xml() {
        let service = StorageService::new(Arc::new(MockPoolApi::new()));

        let err = service.sr_create("sr-1", &config(&[("name", "gold")]), 0).await.unwrap_err();
        assert!(matches!(err, StorageError::MissingParameter(ref k) if k == "xml"));
    }

    #[tokio::test]
    async fn test_create_then_attach() {
        let api = Arc::new(MockPoolApi::new());
        let service = StorageService::new(api.clone());
        let cfg = config(&[("name", "gold"), ("xml", "<source><name>rbd</name></source>")]);

        service.sr_create("sr-1", &cfg, 1 << 40).await.unwrap();
        assert!(api.has_pool("gold"));
        // Creating does not attach, and does not keep a connection around
        assert_eq!(service.attached_count().await, 0);
        assert!(!service.is_connected().await);

        service.sr_attach("sr-1", &cfg).await.unwrap();
        assert_eq!(service.attached_count().await, 1);
    }

    #[tokio::test]
    async fn test_create_error_survives_failed_close() {
        let api = Arc::new(MockPoolApi::new().with_pool("gold").with_failing_close());
        let service = StorageService::new(api.clone());
        let cfg = config(&[("name", "gold"), ("xml", "<source/>")]);

        let err = service.sr_create("sr-1", &cfg, 0).await.unwrap_err();
        match err {
            StorageError::Backend { ref messages, .. } => {
                assert!(messages.iter().any(|m| m.contains("already exists")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(api.closed(), 1);
        assert!(!service.is_connected().await);
    }

    #[tokio::test]
    async fn test_scan_unattached() {
        let service = StorageService::new(Arc::new(MockPoolApi::new()));
        assert!(matches!(service.sr_scan("sr-x").await, Err(StorageError::NotAttached(_))));
    }
}
