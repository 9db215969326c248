//! Error types for the storage manager.

use thiserror::Error;
use tracing::error;

use crate::types::UnsupportedOperation;

/// Errors returned by SR and VDI operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The SR is not attached.
    #[error("SR not attached: {0}")]
    NotAttached(String),

    /// The SR is already attached.
    #[error("SR already attached: {0}")]
    AlreadyAttached(String),

    /// A required device-config key is absent.
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// The pool API reported a failure.
    #[error("{source_name} error: {}", .messages.join(": "))]
    Backend {
        /// Name of the library that failed (e.g. "libvirt")
        source_name: String,
        /// Native messages, outermost first
        messages: Vec<String>,
    },

    /// The element chain was not present in the descriptor.
    #[error("Path not found in descriptor: {}", .0.join(" < "))]
    PathNotFound(Vec<String>),

    /// The descriptor could not be tokenized.
    #[error("Malformed descriptor: {0}")]
    MalformedDescriptor(String),

    /// A volume that was just created could not be found again.
    #[error("Volume {0} vanished immediately after creation")]
    VolumeVanished(String),

    /// The operation is not provided by this plugin.
    #[error("Operation not supported: {0}")]
    Unimplemented(UnsupportedOperation),
}

impl StorageError {
    /// Whether the error leaves the plugin in a state it cannot reason about.
    ///
    /// Callers are expected to stop serving requests on a fatal error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StorageError::VolumeVanished(_))
    }
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A failure reported by the pool/volume library itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct NativeError {
    /// Library message text
    pub message: String,
}

impl NativeError {
    /// Create a native error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Result type for raw pool API calls.
pub type NativeResult<T> = std::result::Result<T, NativeError>;

/// Converts raw pool API results into typed storage results.
pub trait NativeResultExt<T> {
    /// Log a native failure and wrap it as [`StorageError::Backend`].
    ///
    /// `source_name` identifies the library, `operation` the call that failed.
    fn translate(self, source_name: &str, operation: &str) -> Result<T>;
}

impl<T> NativeResultExt<T> for NativeResult<T> {
    fn translate(self, source_name: &str, operation: &str) -> Result<T> {
        self.map_err(|e| {
            error!(
                source = %source_name,
                operation = %operation,
                error = %e.message,
                "Pool API call failed"
            );
            StorageError::Backend {
                source_name: source_name.to_string(),
                messages: vec![operation.to_string(), e.message],
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_keeps_native_message() {
        let res: NativeResult<()> = Err(NativeError::new("Storage pool not found: no pool with matching name 'gold'"));

        match res.translate("libvirt", "pool_by_name") {
            Err(StorageError::Backend { source_name, messages }) => {
                assert_eq!(source_name, "libvirt");
                assert_eq!(messages[0], "pool_by_name");
                assert!(messages[1].contains("no pool with matching name"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_translate_passes_success_through() {
        let res: NativeResult<u64> = Ok(42);
        assert_eq!(res.translate("libvirt", "capacity").unwrap(), 42);
    }

    #[test]
    fn test_only_vanished_volume_is_fatal() {
        assert!(StorageError::VolumeVanished("disk.img".to_string()).is_fatal());
        assert!(!StorageError::NotAttached("sr".to_string()).is_fatal());
        assert!(!StorageError::Unimplemented(UnsupportedOperation::VdiClone).is_fatal());
    }
}
