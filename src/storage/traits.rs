// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use thiserror::Error;

use crate::search::{Query, SearchEntity, SortSpec, TranslateError, Window};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Item not found")]
    NotFound,
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Storage connection error: {0}")]
    Connection(String),
    #[error("Failed to decode row: {0}")]
    Decode(String),
    #[error("Query cannot be executed: {0}")]
    InvalidQuery(#[from] TranslateError),
}

impl StorageError {
    /// Failures a caller may reasonably retry
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Backend(_) | StorageError::Connection(_))
    }
}

/// Read primitives the search layer needs from a persistence store.
///
/// `find_many` and `count` receive the same criteria value; implementations
/// must apply identical predicate semantics in both.
#[async_trait]
pub trait RecordStore<E: SearchEntity>: Send + Sync {
    /// Records matching `criteria`, ordered by `sort`, restricted to `window`.
    async fn find_many(
        &self,
        criteria: &Query,
        sort: &SortSpec,
        window: Window,
    ) -> Result<Vec<E>, StorageError>;

    /// Number of records matching `criteria`.
    async fn count(&self, criteria: &Query) -> Result<u64, StorageError>;

    /// One record by natural key.
    async fn find(&self, key: &str) -> Result<Option<E>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StorageError::Connection("refused".into()).is_transient());
        assert!(StorageError::Backend("timeout".into()).is_transient());
        assert!(!StorageError::Decode("bad status".into()).is_transient());
        assert!(!StorageError::NotFound.is_transient());
    }
}
