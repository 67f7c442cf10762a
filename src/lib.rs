// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Labor Market Search
//!
//! Search, filter and pagination for the read side of a labor-market
//! platform: marketplaces, their challenges (service requests), submissions
//! to those challenges and reviews of those submissions.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Request Validation                      │
//! │  • RawSearchParams (URL query pairs)                        │
//! │  • Per-entity allow-lists for sortBy and filters            │
//! │  • Page bounds: page ≥ 1, 1 ≤ pageSize ≤ 100                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                     SearchRequest<E>::criteria()
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       SearchService<E>                      │
//! │  • One Query value for both the page and the count          │
//! │  • Optional TTL result cache                                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                       RecordStore<E>
//!                              ▼
//! ┌──────────────────────────────┐ ┌────────────────────────────┐
//! │        InMemoryStore         │ │          SqlStore          │
//! │  • DashMap per entity        │ │  • SQLite / MySQL (Any)    │
//! │  • memory_matcher            │ │  • SqlTranslator           │
//! └──────────────────────────────┘ └────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use labor_market_search::model::{Marketplace, ProgramType};
//! use labor_market_search::search::RawSearchParams;
//! use labor_market_search::{InMemoryStore, SearchService};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = InMemoryStore::new();
//! store.upsert_marketplace(Marketplace {
//!     address: "0x1".into(),
//!     title: "Solana Dashboards".into(),
//!     description: "Weekly analytics".into(),
//!     program_type: ProgramType::Analyze,
//!     projects: vec!["solana".into()],
//!     reward_tokens: vec!["USDC".into()],
//!     capabilities: vec![],
//!     created_at: 0,
//!     service_request_count: 0,
//! });
//!
//! let service = SearchService::<Marketplace>::new();
//! let params = RawSearchParams::from_query("q=dashboards&project=solana");
//! let page = service.search_params(&store, &params).await.unwrap();
//! assert_eq!(page.total_count, 1);
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`search`]: requests, the Query AST, SQL translation, in-memory matching, cache
//! - [`service`]: the [`SearchService`] tying requests to stores
//! - [`storage`]: the [`RecordStore`] trait and its memory and SQL implementations
//! - [`seed`]: deterministic fixtures
//! - [`resilience`]: retry with backoff for store connections and writes

pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod resilience;
pub mod search;
pub mod seed;
pub mod service;
pub mod storage;

pub use config::{ConfigError, SearchServiceConfig};
pub use error::SearchError;
pub use metrics::LatencyTimer;
pub use resilience::retry::RetryConfig;
pub use search::{RawSearchParams, SearchRequest, SearchResult, ValidationError};
pub use seed::{Fixtures, SeedPlan, SeedReport};
pub use service::SearchService;
pub use storage::memory::InMemoryStore;
pub use storage::sql::{SqlEntity, SqlStore};
pub use storage::traits::{RecordStore, StorageError};
