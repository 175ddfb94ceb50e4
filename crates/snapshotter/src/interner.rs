//! Shared storage for file names seen during walks

use dashmap::DashMap;
use std::sync::Arc;

/// Concurrent string interner
///
/// Equal names across snapshots share one allocation.
#[derive(Debug, Default)]
pub struct StringInterner {
    strings: DashMap<Arc<str>, ()>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, value: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(value) {
            return existing.key().clone();
        }
        self.strings.entry(Arc::from(value)).or_insert(()).key().clone()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
