// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Record stores behind the search service.
//!
//! - [`memory::InMemoryStore`]: `DashMap` per entity, predicates evaluated in process
//! - [`sql::SqlStore`]: SQLite/MySQL via sqlx `Any`, predicates translated to SQL

pub mod memory;
pub mod sql;
pub mod traits;
