//! VDI operations.

use std::collections::HashMap;
use tracing::{debug, error, info, instrument, warn};

use super::StorageService;
use crate::api::PoolApi;
use crate::descriptor::{self, VOLUME_PATH};
use crate::error::{NativeResultExt, Result, StorageError};
use crate::naming::choose_name;
use crate::types::{AttachInfo, VdiInfo};

/// Suffix appended to a VDI label to form its volume name.
pub const VOLUME_SUFFIX: &str = ".img";

/// Datapath type reported on attach.
const DATAPATH_TYPE: &str = "rbd";

/// Outcome of checking whether a volume name is taken.
enum Probe {
    Taken,
    Free,
}

impl<A: PoolApi> StorageService<A> {
    /// Create a volume for `vdi` and return its record.
    ///
    /// The volume is named `<label>.img`, or `<label>.img.N` if that name is
    /// taken. See [`crate::naming`] for the race this leaves open.
    #[instrument(skip(self, vdi), fields(sr = %sr, label = %vdi.name_label, size = vdi.virtual_size))]
    pub async fn vdi_create(&self, sr: &str, vdi: &VdiInfo) -> Result<VdiInfo> {
        let source = self.api.name();
        let pool = self.pool(sr).await?;

        let candidate = format!("{}{}", vdi.name_label, VOLUME_SUFFIX);
        let name = match self.probe(&pool, &candidate).await {
            Probe::Free => candidate,
            Probe::Taken => {
                let existing = self
                    .api
                    .list_volumes(&pool)
                    .await
                    .translate(source, "list_volumes")?;
                let name = choose_name(&candidate, &existing);
                debug!(candidate = %candidate, chosen = %name, "Volume name taken, picked another");
                name
            }
        };

        let xml = descriptor::volume_xml(&name, vdi.virtual_size);
        self.api
            .create_volume(&pool, &xml)
            .await
            .translate(source, "create_volume")?;

        match self.vdi_record(&pool, &name).await {
            Ok(created) => {
                info!(volume = %name, key = %created.key, "VDI created");
                Ok(created)
            }
            Err(e) => {
                error!(volume = %name, error = %e, "Created volume cannot be found");
                Err(StorageError::VolumeVanished(name))
            }
        }
    }

    /// Delete the volume at path `vdi`.
    #[instrument(skip(self), fields(sr = %sr, vdi = %vdi))]
    pub async fn vdi_destroy(&self, sr: &str, vdi: &str) -> Result<()> {
        let source = self.api.name();
        let pool = self.pool(sr).await?;

        let volume = self
            .api
            .volume_by_path(&pool, vdi)
            .await
            .translate(source, "volume_by_path")?;
        self.api
            .delete_volume(&volume)
            .await
            .translate(source, "delete_volume")?;

        info!("VDI destroyed");
        Ok(())
    }

    /// Return the device path of `vdi`.
    ///
    /// Nothing is changed on the pool; `read_write` is not enforced here.
    #[instrument(skip(self), fields(sr = %sr, vdi = %vdi))]
    pub async fn vdi_attach(&self, sr: &str, vdi: &str, read_write: bool) -> Result<AttachInfo> {
        let pool = self.pool(sr).await?;
        let path = self.device_path(&pool, vdi).await?;

        let mut xenstore_data = HashMap::new();
        xenstore_data.insert("type".to_string(), DATAPATH_TYPE.to_string());
        xenstore_data.insert("name".to_string(), format!("{}:{}", DATAPATH_TYPE, path));

        info!(path = %path, "VDI attached");
        Ok(AttachInfo { path, xenstore_data })
    }

    /// Check that `vdi` still resolves to a device path.
    #[instrument(skip(self), fields(sr = %sr, vdi = %vdi))]
    pub async fn vdi_detach(&self, sr: &str, vdi: &str) -> Result<()> {
        let pool = self.pool(sr).await?;
        self.device_path(&pool, vdi).await?;
        Ok(())
    }

    /// Volumes are usable as soon as the pool is; nothing to do.
    pub async fn vdi_activate(&self, sr: &str, vdi: &str) -> Result<()> {
        debug!(sr = %sr, vdi = %vdi, "VDI activate is a no-op");
        Ok(())
    }

    /// Counterpart of [`Self::vdi_activate`]; nothing to do.
    pub async fn vdi_deactivate(&self, sr: &str, vdi: &str) -> Result<()> {
        debug!(sr = %sr, vdi = %vdi, "VDI deactivate is a no-op");
        Ok(())
    }

    /// Whether a volume called `name` exists. Lookup failures count as free.
    async fn probe(&self, pool: &A::Pool, name: &str) -> Probe {
        match self.api.volume_by_name(pool, name).await {
            Ok(_) => Probe::Taken,
            Err(e) => {
                warn!(volume = %name, error = %e, "Volume lookup failed, treating name as free");
                Probe::Free
            }
        }
    }

    async fn device_path(&self, pool: &A::Pool, vdi: &str) -> Result<String> {
        let source = self.api.name();
        let volume = self
            .api
            .volume_by_path(pool, vdi)
            .await
            .translate(source, "volume_by_path")?;
        let xml = self
            .api
            .volume_xml(&volume)
            .await
            .translate(source, "volume_xml")?;
        descriptor::extract(&xml, &VOLUME_PATH)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::mock::MockPoolApi;
    use crate::types::DeviceConfig;

    async fn attached(api: MockPoolApi) -> StorageService<MockPoolApi> {
        let service = StorageService::new(Arc::new(api));
        let config: DeviceConfig = [("name".to_string(), "gold".to_string())].into_iter().collect();
        service.sr_attach("sr-1", &config).await.unwrap();
        service
    }

    #[tokio::test]
    async fn test_create_free_name() {
        let service = attached(MockPoolApi::new().with_pool("gold")).await;

        let vdi = service.vdi_create("sr-1", &VdiInfo::new("disk1", 1 << 30)).await.unwrap();
        assert_eq!(vdi.name_label, "disk1.img");
        assert_eq!(vdi.key, "gold/disk1.img");
        assert_eq!(vdi.virtual_size, 1 << 30);
    }

    #[tokio::test]
    async fn test_create_taken_name() {
        let api = MockPoolApi::new()
            .with_volume("gold", "disk1.img", 512)
            .with_volume("gold", "disk1.img.2", 512);
        let service = attached(api).await;

        let vdi = service.vdi_create("sr-1", &VdiInfo::new("disk1", 2048)).await.unwrap();
        assert_eq!(vdi.name_label, "disk1.img.3");
        assert_eq!(vdi.virtual_size, 2048);
    }

    #[tokio::test]
    async fn test_create_unreadable_candidate_is_treated_as_free() {
        // The probe swallows the lookup error; the create itself then fails
        let api = MockPoolApi::new()
            .with_volume("gold", "disk1.img", 512)
            .with_broken_volume("gold", "disk1.img");
        let service = attached(api).await;

        let err = service.vdi_create("sr-1", &VdiInfo::new("disk1", 2048)).await.unwrap_err();
        assert!(matches!(err, StorageError::Backend { .. }));
    }

    #[tokio::test]
    async fn test_create_vanished_volume_is_fatal() {
        let service = attached(MockPoolApi::new().with_pool("gold").with_dropped_creates()).await;

        let err = service.vdi_create("sr-1", &VdiInfo::new("ghost", 1)).await.unwrap_err();
        assert!(matches!(err, StorageError::VolumeVanished(ref n) if n == "ghost.img"));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_attach_reports_device_path() {
        let service = attached(MockPoolApi::new().with_volume("gold", "disk1.img", 512)).await;

        let info = service.vdi_attach("sr-1", "gold/disk1.img", true).await.unwrap();
        assert_eq!(info.path, "gold/disk1.img");
        assert_eq!(info.xenstore_data.get("type").map(String::as_str), Some("rbd"));
        assert_eq!(info.xenstore_data.get("name").map(String::as_str), Some("rbd:gold/disk1.img"));
    }

    #[tokio::test]
    async fn test_detach_revalidates_path() {
        let service = attached(MockPoolApi::new().with_volume("gold", "disk1.img", 512)).await;

        service.vdi_detach("sr-1", "gold/disk1.img").await.unwrap();
        assert!(service.vdi_detach("sr-1", "gold/nope.img").await.is_err());
    }

    #[tokio::test]
    async fn test_destroy() {
        let api = Arc::new(MockPoolApi::new().with_volume("gold", "disk1.img", 512));
        let service = StorageService::new(api.clone());
        let config: DeviceConfig = [("name".to_string(), "gold".to_string())].into_iter().collect();
        service.sr_attach("sr-1", &config).await.unwrap();

        service.vdi_destroy("sr-1", "gold/disk1.img").await.unwrap();
        assert!(api.volume_names("gold").is_empty());

        let err = service.vdi_destroy("sr-1", "gold/disk1.img").await.unwrap_err();
        assert!(matches!(err, StorageError::Backend { .. }));
    }

    #[tokio::test]
    async fn test_activate_deactivate_touch_nothing() {
        let api = Arc::new(MockPoolApi::new());
        let service = StorageService::new(api.clone());

        service.vdi_activate("sr-1", "gold/disk1.img").await.unwrap();
        service.vdi_deactivate("sr-1", "gold/disk1.img").await.unwrap();
        assert_eq!(api.calls(), 0);
    }
}
