//! # limiquantix Storage
//!
//! Storage manager plugin that exposes hypervisor storage pools as SRs and
//! their volumes as VDIs.
//!
//! - **SR** operations map onto libvirt storage pools (attach, create,
//!   detach, scan).
//! - **VDI** operations map onto volumes inside an attached pool (create,
//!   destroy, attach, detach, activate, deactivate).
//!
//! Everything else in the SR/VDI contract is reported as not supported.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            StorageService               │
//! │   (sr_attach, vdi_create, vdi_attach)   │
//! └─────────────────────┬───────────────────┘
//!                       │  PoolApi trait
//!         ┌─────────────┴─────────────┐
//!         ▼                           ▼
//! ┌───────────────────┐     ┌───────────────────┐
//! │  LibvirtPoolApi   │     │   MockPoolApi     │
//! │   (via libvirt)   │     │   (in memory)     │
//! └───────────────────┘     └───────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use limiquantix_storage::{MockPoolApi, StorageService, VdiInfo};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = StorageService::new(Arc::new(MockPoolApi::new().with_pool("gold")));
//!
//!     let config = [("name".to_string(), "gold".to_string())].into_iter().collect();
//!     service.sr_attach("sr-1", &config).await.unwrap();
//!
//!     let vdi = service.vdi_create("sr-1", &VdiInfo::new("disk1", 1 << 30)).await.unwrap();
//!     let attach = service.vdi_attach("sr-1", &vdi.key, true).await.unwrap();
//! }
//! ```

pub mod api;
pub mod capabilities;
pub mod connection;
pub mod descriptor;
pub mod error;
pub mod libvirt;
pub mod mock;
pub mod naming;
pub mod registry;
pub mod service;
pub mod types;

pub use api::PoolApi;
pub use capabilities::PluginInfo;
pub use connection::ConnectionManager;
pub use error::{NativeError, NativeResult, Result, StorageError};
pub use mock::MockPoolApi;
pub use registry::AttachmentRegistry;
pub use service::{StorageService, UnsupportedOps};
pub use types::*;

// Re-export libvirt pool API when available
#[cfg(feature = "libvirt")]
pub use libvirt::LibvirtPoolApi;
