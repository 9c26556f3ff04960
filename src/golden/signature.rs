//! Exact-match index keyed by question signature.

use std::sync::Arc;

use moka::sync::Cache;

use crate::model::GoldenEntry;

/// Bounded in-memory map from signature to approved entry.
///
/// Eviction only costs a fall-through to the semantic index, which holds every
/// approved entry.
pub struct SignatureIndex {
    entries: Cache<[u8; 32], Arc<GoldenEntry>>,
}

impl SignatureIndex {
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    #[inline]
    pub fn lookup_by_signature(&self, signature: &[u8; 32]) -> Option<Arc<GoldenEntry>> {
        self.entries.get(signature)
    }

    #[inline]
    pub fn insert(&self, entry: Arc<GoldenEntry>) {
        self.entries.insert(entry.signature, entry);
    }

    #[inline]
    pub fn remove(&self, signature: &[u8; 32]) -> Option<Arc<GoldenEntry>> {
        self.entries.remove(signature)
    }

    /// Approximate entry count (moka applies writes lazily).
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SignatureIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureIndex")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}
