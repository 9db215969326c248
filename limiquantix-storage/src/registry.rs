//! Attached SR bookkeeping.

use std::collections::HashMap;

use crate::error::{Result, StorageError};

/// Maps attached SR ids to their pool handles.
///
/// An SR id appears at most once. Entries are unordered.
#[derive(Debug)]
pub struct AttachmentRegistry<P> {
    entries: HashMap<String, P>,
}

impl<P: Clone> AttachmentRegistry<P> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Record that `sr` is attached to `pool`.
    pub fn put(&mut self, sr: &str, pool: P) -> Result<()> {
        if self.entries.contains_key(sr) {
            return Err(StorageError::AlreadyAttached(sr.to_string()));
        }
        self.entries.insert(sr.to_string(), pool);
        Ok(())
    }

    /// Pool handle for an attached SR.
    pub fn get(&self, sr: &str) -> Result<P> {
        self.entries
            .get(sr)
            .cloned()
            .ok_or_else(|| StorageError::NotAttached(sr.to_string()))
    }

    /// Forget an attached SR, returning its pool handle.
    pub fn remove(&mut self, sr: &str) -> Result<P> {
        self.entries
            .remove(sr)
            .ok_or_else(|| StorageError::NotAttached(sr.to_string()))
    }

    /// Number of attached SRs.
    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

impl<P: Clone> Default for AttachmentRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let mut registry = AttachmentRegistry::new();
        registry.put("sr-1", "gold".to_string()).unwrap();

        assert_eq!(registry.count(), 1);
        assert_eq!(registry.get("sr-1").unwrap(), "gold");

        assert_eq!(registry.remove("sr-1").unwrap(), "gold");
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_double_put_rejected() {
        let mut registry = AttachmentRegistry::new();
        registry.put("sr-1", 1u32).unwrap();

        let err = registry.put("sr-1", 2u32).unwrap_err();
        assert!(matches!(err, StorageError::AlreadyAttached(ref id) if id == "sr-1"));
        // The first handle is kept
        assert_eq!(registry.get("sr-1").unwrap(), 1);
    }

    #[test]
    fn test_missing_entries() {
        let mut registry: AttachmentRegistry<u32> = AttachmentRegistry::new();

        assert!(matches!(registry.get("nope"), Err(StorageError::NotAttached(_))));
        assert!(matches!(registry.remove("nope"), Err(StorageError::NotAttached(_))));
    }

    #[test]
    fn test_count_tracks_distinct_ids() {
        let mut registry = AttachmentRegistry::new();
        for id in ["a", "b", "c"] {
            registry.put(id, ()).unwrap();
        }
        assert_eq!(registry.count(), 3);

        registry.remove("b").unwrap();
        assert_eq!(registry.count(), 2);
    }
}
