//! # limiquantix Storage Manager
//!
//! Storage manager plugin that exposes libvirt storage pools as SRs and their
//! volumes as VDIs. This binary wires configuration and logging around the
//! `limiquantix-storage` service and offers a few operator commands.
//!
//! ## Usage
//! ```bash
//! limiquantix-sm query
//! limiquantix-sm --libvirt-uri qemu:///system probe --name gold
//! limiquantix-sm --dev vdi-create --name default --label disk1 --size 1073741824
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use limiquantix_storage::StorageError;

mod cli;
mod commands;
mod config;

use cli::Args;
use config::{Config, DEFAULT_CONFIG_PATH};

/// Exit code when the plugin hit an inconsistency it cannot recover from.
const EXIT_FATAL: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let (config, source) = match &args.config {
        Some(config_path) => (Config::load(config_path)?, Some(config_path.as_str())),
        None => match Config::load(DEFAULT_CONFIG_PATH) {
            Ok(cfg) => (cfg, Some(DEFAULT_CONFIG_PATH)),
            Err(_) => (Config::default(), None),
        },
    };
    let config = config.with_cli_overrides(&args)?;

    // Initialize logging
    limiquantix_common::init_logging_with_format(&config.logging.level, config.logging.format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = ?source,
        backend = ?config.libvirt.backend,
        "Starting limiquantix storage manager"
    );

    if let Err(e) = commands::run(config, args.command).await {
        if e.downcast_ref::<StorageError>().is_some_and(StorageError::is_fatal) {
            error!(error = %e, "Fatal storage inconsistency, exiting");
            std::process::exit(EXIT_FATAL);
        }
        error!(error = %e, "Command failed");
        return Err(e);
    }

    Ok(())
}
