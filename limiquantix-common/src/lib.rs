//! # limiquantix Common
//!
//! Shared utilities for the limiquantix storage components.
//!
//! ## Logging
//!
//! ```rust
//! use limiquantix_common::init_logging;
//!
//! // Initialize with level
//! init_logging("info").unwrap();
//! tracing::info!(sr = "sr-1", "SR attached");
//! ```

pub mod logging;

// Re-export logging functions
pub use logging::{
    init_logging,
    init_logging_json,
    init_logging_with_format,
    LogFormat,
};
