//! Libvirt pool API.
//!
//! This module provides the production pool API using libvirt storage pools.
//! It requires the `libvirt` feature to be enabled and the system to have
//! libvirt installed.

#[cfg(feature = "libvirt")]
mod backend;

#[cfg(feature = "libvirt")]
pub use backend::{LibvirtPool, LibvirtPoolApi};

/// Check if the libvirt pool API is compiled in.
pub fn is_available() -> bool {
    cfg!(feature = "libvirt")
}
