//! Operator commands driving the storage service.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use limiquantix_storage::{
    DeviceConfig, MockPoolApi, PluginInfo, PoolApi, StorageService, VdiInfo, CONFIG_NAME,
    CONFIG_URI, CONFIG_XML,
};

use crate::cli::Command;
use crate::config::{Config, PoolBackend};

/// SR id used for the duration of a one-shot command.
const COMMAND_SR: &str = "limiquantix-sm";

/// Run a command against the configured pool backend.
pub async fn run(config: Config, command: Command) -> Result<()> {
    match config.libvirt.backend {
        PoolBackend::Mock => {
            info!("Using mock pool backend");
            run_with(mock_api(&config), &config, command).await
        }
        PoolBackend::Libvirt => {
            #[cfg(feature = "libvirt")]
            {
                info!("Using libvirt pool backend");
                run_with(limiquantix_storage::LibvirtPoolApi::new(), &config, command).await
            }
            #[cfg(not(feature = "libvirt"))]
            {
                warn!("Libvirt backend requested but not compiled in, falling back to mock");
                run_with(mock_api(&config), &config, command).await
            }
        }
    }
}

fn mock_api(config: &Config) -> MockPoolApi {
    config
        .dev
        .pools
        .iter()
        .fold(MockPoolApi::new(), |api, pool| api.with_pool(pool))
}

async fn run_with<A: PoolApi>(api: A, config: &Config, command: Command) -> Result<()> {
    run_with_shared(Arc::new(api), config, command).await
}

async fn run_with_shared<A: PoolApi>(api: Arc<A>, config: &Config, command: Command) -> Result<()> {
    let service = StorageService::new(api);

    match command {
        Command::Query => print_json(&PluginInfo::current()),
        Command::SrCreate { name, xml, size } => {
            let mut device_config = device_config(config, &name);
            device_config.insert(CONFIG_XML.to_string(), xml);
            service.sr_create(COMMAND_SR, &device_config, size).await?;
            info!(pool = %name, "Pool created");
            Ok(())
        }
        Command::Probe { name } => {
            let vdis = with_attached(&service, config, &name, |s| s.sr_scan(COMMAND_SR)).await?;
            print_json(&vdis)
        }
        Command::VdiCreate { name, label, size } => {
            let request = VdiInfo::new(label, size);
            let vdi = with_attached(&service, config, &name, |s| s.vdi_create(COMMAND_SR, &request)).await?;
            print_json(&vdi)
        }
        Command::VdiAttach { name, vdi } => {
            let attach = with_attached(&service, config, &name, |s| s.vdi_attach(COMMAND_SR, &vdi, false)).await?;
            print_json(&attach)
        }
        Command::VdiDestroy { name, vdi } => {
            with_attached(&service, config, &name, |s| s.vdi_destroy(COMMAND_SR, &vdi)).await?;
            info!(vdi = %vdi, "Volume deleted");
            Ok(())
        }
    }
}

/// Device config for `pool`, carrying the configured URI if any.
fn device_config(config: &Config, pool: &str) -> DeviceConfig {
    let mut device_config = DeviceConfig::new();
    device_config.insert(CONFIG_NAME.to_string(), pool.to_string());
    if let Some(ref uri) = config.libvirt.uri {
        device_config.insert(CONFIG_URI.to_string(), uri.clone());
    }
    device_config
}

/// Attach `pool`, run `op`, and detach again whatever `op` returned.
async fn with_attached<'s, A, T, F, Fut>(
    service: &'s StorageService<A>,
    config: &Config,
    pool: &str,
    op: F,
) -> Result<T>
where
    A: PoolApi,
    F: FnOnce(&'s StorageService<A>) -> Fut,
    Fut: std::future::Future<Output = limiquantix_storage::Result<T>>,
{
    service.sr_attach(COMMAND_SR, &device_config(config, pool)).await?;

    let result = op(service).await;

    if let Err(e) = service.sr_detach(COMMAND_SR).await {
        warn!(error = %e, "Failed to detach after command");
    }

    Ok(result?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_config(pools: &[&str]) -> Config {
        let mut config = Config::default();
        config.libvirt.backend = PoolBackend::Mock;
        config.dev.pools = pools.iter().map(|p| p.to_string()).collect();
        config
    }

    #[test]
    fn test_device_config_carries_uri() {
        let mut config = Config::default();
        config.libvirt.uri = Some("qemu:///system".to_string());

        let dc = device_config(&config, "gold");
        assert_eq!(dc.get("name").map(String::as_str), Some("gold"));
        assert_eq!(dc.get("uri").map(String::as_str), Some("qemu:///system"));

        let dc = device_config(&Config::default(), "gold");
        assert!(!dc.contains_key("uri"));
    }

    #[tokio::test]
    async fn test_probe_on_mock() {
        let config = dev_config(&["gold"]);
        run(config, Command::Probe { name: "gold".to_string() }).await.unwrap();
    }

    #[tokio::test]
    async fn test_query_touches_no_pool() {
        let api = Arc::new(MockPoolApi::new());
        run_with_shared(api.clone(), &dev_config(&[]), Command::Query).await.unwrap();
        assert_eq!(api.calls(), 0);
        assert_eq!(api.opened(), 0);
    }

    #[tokio::test]
    async fn test_probe_unknown_pool_fails() {
        let config = dev_config(&["gold"]);
        assert!(run(config, Command::Probe { name: "silver".to_string() }).await.is_err());
    }

    #[tokio::test]
    async fn test_detach_after_failed_op() {
        let api = Arc::new(mock_api(&dev_config(&["gold"])));
        let service = StorageService::new(api.clone());
        let config = dev_config(&["gold"]);

        let res = with_attached(&service, &config, "gold", |s| s.vdi_attach(COMMAND_SR, "gold/none.img", false)).await;
        assert!(res.is_err());
        assert_eq!(service.attached_count().await, 0);
        assert_eq!(api.closed(), 1);
    }
}
