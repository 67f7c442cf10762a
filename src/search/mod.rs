// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Infrastructure
//!
//! Filtered, sorted, paginated listing of marketplaces, challenges,
//! submissions and reviews.
//!
//! # Architecture
//!
//! ```text
//! RawSearchParams (?q=..&sortBy=..&project=..)
//!     │ validate (per-entity allow-lists)
//!     ▼
//! SearchRequest<E> ──criteria()──→ Query (AST)
//!                                    │
//!                                    ├─→ SqlTranslator → WHERE / ORDER BY / LIMIT
//!                                    └─→ memory_matcher → in-process filter + sort
//! ```
//!
//! The same `Query` value feeds both the page query and the count query.
//!
//! # Example
//!
//! ```rust
//! use labor_market_search::model::Marketplace;
//! use labor_market_search::search::RawSearchParams;
//!
//! let request = RawSearchParams::from_query("q=dune&project=solana&order=asc")
//!     .validate::<Marketplace>()
//!     .unwrap();
//! assert_eq!(request.query(), Some("dune"));
//!
//! let err = RawSearchParams::from_query("first=101")
//!     .validate::<Marketplace>()
//!     .unwrap_err();
//! assert!(err.mentions("first"));
//! ```

mod entity;
pub mod memory_matcher;
mod pagination;
mod query_builder;
mod request;
mod search_cache;
mod sql_translator;

pub use entity::{
    fields, ChallengeFilter, ChallengeSort, EntityKind, FilterKey, MarketplaceFilter,
    MarketplaceSort, ReviewFilter, ReviewSort, SearchEntity, SortField, SubmissionFilter,
    SubmissionSort,
};
pub use memory_matcher::{Document, SortValue};
pub use pagination::{
    total_pages, PageRequest, SearchResult, Window, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use query_builder::{
    fold_case, FieldOperator, FieldQuery, FilterValue, Query, QueryBuilder, QueryNode, QueryValue,
};
pub use request::{FieldIssue, RawSearchParams, SearchRequest, SortOrder, SortSpec, ValidationError};
pub use search_cache::{SearchCache, SearchCacheStats};
pub use sql_translator::{SqlParam, SqlQuery, SqlTarget, SqlTranslator, TableSpec, TranslateError, ALIAS};
