// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use thiserror::Error;

use crate::search::{EntityKind, ValidationError};
use crate::storage::traits::StorageError;

/// Failure of a search-service call.
///
/// Callers branch on the variant: a `Validation` error is the client's to fix
/// and never reached a store, an `Infrastructure` error is the store's and is
/// never turned into an empty page.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{} '{}' not found", .entity.as_str(), .key)]
    NotFound { entity: EntityKind, key: String },
    #[error("search backend unavailable: {0}")]
    Infrastructure(#[from] StorageError),
}

impl SearchError {
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::Infrastructure(e) => e.is_transient(),
            SearchError::Validation(_) | SearchError::NotFound { .. } => false,
        }
    }

    /// HTTP status a route handler should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            SearchError::Validation(_) => 400,
            SearchError::NotFound { .. } => 404,
            SearchError::Infrastructure(_) => 503,
        }
    }

    /// Label used in metrics
    pub(crate) fn status_label(&self) -> &'static str {
        match self {
            SearchError::Validation(_) => "invalid",
            SearchError::NotFound { .. } => "not_found",
            SearchError::Infrastructure(_) => "error",
        }
    }
}
