//! Command-line argument parsing.

use clap::{Parser, Subcommand};

/// limiquantix Storage Manager - libvirt storage pools as SRs
#[derive(Parser, Debug)]
#[command(name = "limiquantix-sm")]
#[command(about = "limiquantix Storage Manager - libvirt storage pools as SRs")]
#[command(version)]
pub struct Args {
    /// Path to configuration file (optional, defaults used if not found)
    #[arg(short, long, env = "LIMIQUANTIX_SM_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Log format (pretty, json)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Libvirt connection URI (e.g., qemu:///system)
    #[arg(long, env = "LIMIQUANTIX_LIBVIRT_URI")]
    pub libvirt_uri: Option<String>,

    /// Enable development mode (in-memory pools instead of libvirt)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Operator commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the plugin capability descriptor as JSON
    Query,

    /// Define and start a storage pool
    SrCreate {
        /// Pool name
        #[arg(long)]
        name: String,
        /// XML fragment with the pool's <source>/<target> elements
        #[arg(long)]
        xml: String,
        /// Requested size in bytes (not used by libvirt)
        #[arg(long, default_value_t = 0)]
        size: u64,
    },

    /// Attach a pool, list its volumes as VDIs, detach again
    Probe {
        /// Pool name
        #[arg(long)]
        name: String,
    },

    /// Create a volume in a pool and print its VDI record
    VdiCreate {
        /// Pool name
        #[arg(long)]
        name: String,
        /// VDI label; the volume is called <label>.img
        #[arg(long)]
        label: String,
        /// Virtual size in bytes
        #[arg(long)]
        size: u64,
    },

    /// Print the device path and datapath info of a volume
    VdiAttach {
        /// Pool name
        #[arg(long)]
        name: String,
        /// Volume path
        #[arg(long)]
        vdi: String,
    },

    /// Delete a volume
    VdiDestroy {
        /// Pool name
        #[arg(long)]
        name: String,
        /// Volume path
        #[arg(long)]
        vdi: String,
    },
}
