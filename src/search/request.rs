// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Typed search requests and their validation.
//!
//! Route handlers collect URL query pairs into [`RawSearchParams`] and call
//! [`RawSearchParams::validate`]. A request only exists once every field has
//! passed its allow-list, so the service never sees an unknown sort column,
//! filter key or out-of-range page.
//!
//! ```text
//! ?q=dune&sortBy=title&order=asc&project=solana&project=near&page=2&first=24
//!   │       │            │          └──────── repeatable filter ───┘  │      │
//!   │       │            └─ asc | desc (default desc)                 │      └─ 1..=100 (default 12)
//!   │       └─ per-entity allow-list                                  └─ ≥ 1 (default 1)
//!   └─ free text, blank = absent
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entity::{FilterKey, SearchEntity, SortField};
use super::pagination::{PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use super::query_builder::{FilterValue, Query, QueryBuilder};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Resolved ordering handed to stores: primary field, then the key ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub field: &'static str,
    pub order: SortOrder,
    pub key_field: &'static str,
}

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A request that failed validation, with every reason found.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("invalid search request: {}", format_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldIssue::new(field, message)])
    }

    /// Whether any issue concerns `field`
    pub fn mentions(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.field, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A validated search over entity `E`.
///
/// Filters are held in ordered maps and sets so two requests naming the same
/// criteria in a different order compare (and hash) equal.
pub struct SearchRequest<E: SearchEntity> {
    query: Option<String>,
    sort_by: E::Sort,
    order: SortOrder,
    filters: BTreeMap<E::Filter, BTreeSet<FilterValue>>,
    page: PageRequest,
}

impl<E: SearchEntity> SearchRequest<E> {
    /// Defaults: no text, default sort descending, no filters, page 1 of 12.
    pub fn new() -> Self {
        Self {
            query: None,
            sort_by: E::Sort::DEFAULT,
            order: SortOrder::default(),
            filters: BTreeMap::new(),
            page: PageRequest::default(),
        }
    }

    /// Set the free-text query. Blank text clears it.
    pub fn with_query(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        self.query = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    pub fn sorted_by(mut self, field: E::Sort, order: SortOrder) -> Self {
        self.sort_by = field;
        self.order = order;
        self
    }

    /// Add values for a filter key. Values accumulate; an empty set is no filter.
    pub fn with_filter<I, V>(mut self, key: E::Filter, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        let set = self.filters.entry(key).or_default();
        set.extend(values.into_iter().map(Into::into));
        if set.is_empty() {
            self.filters.remove(&key);
        }
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn sort_by(&self) -> E::Sort {
        self.sort_by
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn page(&self) -> PageRequest {
        self.page
    }

    pub fn filter_values(&self, key: E::Filter) -> Option<&BTreeSet<FilterValue>> {
        self.filters.get(&key)
    }

    /// The predicate shared by `search` and `count`: free text AND each filter.
    pub fn criteria(&self) -> Query {
        let mut builder = QueryBuilder::new();
        if let Some(text) = &self.query {
            builder = builder.contains_any(E::TEXT_FIELDS, text);
        }
        for (key, values) in &self.filters {
            builder = builder.any_of(key.field(), values.iter().cloned().collect());
        }
        builder.build_and()
    }

    pub fn sort_spec(&self) -> SortSpec {
        SortSpec {
            field: self.sort_by.field(),
            order: self.order,
            key_field: E::KEY_FIELD,
        }
    }
}

impl<E: SearchEntity> Default for SearchRequest<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: SearchEntity> Clone for SearchRequest<E> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            sort_by: self.sort_by,
            order: self.order,
            filters: self.filters.clone(),
            page: self.page,
        }
    }
}

impl<E: SearchEntity> PartialEq for SearchRequest<E> {
    fn eq(&self, other: &Self) -> bool {
        self.query == other.query
            && self.sort_by == other.sort_by
            && self.order == other.order
            && self.filters == other.filters
            && self.page == other.page
    }
}

impl<E: SearchEntity> Eq for SearchRequest<E> {}

impl<E: SearchEntity> Hash for SearchRequest<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.query.hash(state);
        self.sort_by.hash(state);
        self.order.hash(state);
        self.filters.hash(state);
        self.page.hash(state);
    }
}

impl<E: SearchEntity> fmt::Debug for SearchRequest<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchRequest")
            .field("entity", &E::KIND)
            .field("query", &self.query)
            .field("sort_by", &self.sort_by)
            .field("order", &self.order)
            .field("filters", &self.filters)
            .field("page", &self.page)
            .finish()
    }
}

/// Untyped query-string pairs, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSearchParams {
    pairs: Vec<(String, String)>,
}

impl RawSearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string (leading `?` allowed).
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            pairs: url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Append a value (repeatable params accumulate).
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Replace every value of `key` with one value. Routes use this to pin a parameter.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.pairs.retain(|(k, _)| *k != key);
        self.pairs.push((key, value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check every pair against `E`'s allow-lists.
    ///
    /// Scalar params (`q`, `sortBy`, `order`, `page`, `first`/`pageSize`) take
    /// their last value. Empty filter values are dropped, so `?project=` is the
    /// same as no project filter. Unknown params are rejected.
    pub fn validate<E: SearchEntity>(&self) -> Result<SearchRequest<E>, ValidationError> {
        let mut issues = Vec::new();
        let mut request = SearchRequest::<E>::new();
        let mut page = 1u32;
        let mut page_size = DEFAULT_PAGE_SIZE;

        for (key, value) in &self.pairs {
            match key.as_str() {
                "q" => request = request.with_query(value.as_str()),
                "sortBy" => match E::Sort::parse(value) {
                    Some(field) => request.sort_by = field,
                    None => issues.push(FieldIssue::new(
                        "sortBy",
                        format!("`{}` is not one of {}", value, sort_params::<E>()),
                    )),
                },
                "order" => match value.as_str() {
                    "asc" => request.order = SortOrder::Asc,
                    "desc" => request.order = SortOrder::Desc,
                    other => issues.push(FieldIssue::new(
                        "order",
                        format!("`{}` is not one of asc, desc", other),
                    )),
                },
                "page" => match value.parse::<u32>() {
                    Ok(n) if n >= 1 => page = n,
                    _ => issues.push(FieldIssue::new("page", "must be an integer of at least 1")),
                },
                "first" | "pageSize" => match value.parse::<u32>() {
                    Ok(n) if (1..=MAX_PAGE_SIZE).contains(&n) => page_size = n,
                    _ => issues.push(FieldIssue::new(
                        key.as_str(),
                        format!("must be an integer between 1 and {}", MAX_PAGE_SIZE),
                    )),
                },
                other => match E::Filter::parse(other) {
                    Some(filter) => {
                        let value = value.trim();
                        if value.is_empty() {
                            continue;
                        }
                        match filter.parse_value(value) {
                            Ok(v) => request = request.with_filter(filter, [v]),
                            Err(message) => issues.push(FieldIssue::new(other, message)),
                        }
                    }
                    None => issues.push(FieldIssue::new(other, "unknown parameter")),
                },
            }
        }

        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }
        let page = PageRequest::new(page, page_size)?;
        Ok(request.with_page(page))
    }
}

fn sort_params<E: SearchEntity>() -> String {
    E::Sort::ALL
        .iter()
        .map(|s| s.param())
        .collect::<Vec<_>>()
        .join(", ")
}
