// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-process evaluation of the Query AST.
//!
//! The counterpart of [`SqlTranslator`](super::SqlTranslator) for stores that
//! hold records in memory. Semantics mirror the SQL output:
//!
//! - `Contains`: substring after [`fold_case`] on both sides, missing field never matches
//! - `In`: any of the record's values for the field is in the set
//! - ordering: primary field, missing values first when ascending, then key ascending

use std::cmp::Ordering;

use super::entity::SearchEntity;
use super::pagination::Window;
use super::query_builder::{
    fold_case, FieldOperator, FieldQuery, FilterValue, Query, QueryNode, QueryValue,
};
use super::request::{SortOrder, SortSpec};

/// Field access for records evaluated in memory.
pub trait Document {
    /// Text of a field for free-text matching
    fn text(&self, field: &str) -> Option<&str>;

    /// Every value the field holds. Scalars yield one value, relations many.
    fn values(&self, field: &str) -> Vec<FilterValue>;

    fn sort_value(&self, field: &str) -> SortValue<'_>;
}

/// Comparable field value. `Missing` sorts first, like SQL `NULL` ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue<'a> {
    Missing,
    Integer(i64),
    Text(&'a str),
}

impl<'a> From<Option<i64>> for SortValue<'a> {
    fn from(value: Option<i64>) -> Self {
        value.map_or(SortValue::Missing, SortValue::Integer)
    }
}

pub fn matches<D: Document>(query: &Query, doc: &D) -> bool {
    matches_node(&query.root, doc)
}

fn matches_node<D: Document>(node: &QueryNode, doc: &D) -> bool {
    match node {
        QueryNode::All => true,
        QueryNode::Field(field) => matches_field(field, doc),
        QueryNode::And(nodes) => nodes.iter().all(|n| matches_node(n, doc)),
        QueryNode::Or(nodes) => nodes.iter().any(|n| matches_node(n, doc)),
    }
}

fn matches_field<D: Document>(field: &FieldQuery, doc: &D) -> bool {
    match (&field.operator, &field.value) {
        (FieldOperator::Contains, QueryValue::Text(needle)) => doc
            .text(&field.field)
            .map(|haystack| fold_case(haystack).contains(&fold_case(needle)))
            .unwrap_or(false),
        (FieldOperator::In, QueryValue::Values(set)) => {
            set.is_empty() || doc.values(&field.field).iter().any(|v| set.contains(v))
        }
        // Unsupported combinations never match
        _ => false,
    }
}

/// Total order for a sort spec: primary field in the requested direction, key ascending.
pub fn compare<E: SearchEntity + Document>(a: &E, b: &E, sort: &SortSpec) -> Ordering {
    let primary = a.sort_value(sort.field).cmp(&b.sort_value(sort.field));
    let primary = match sort.order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| a.key().cmp(b.key()))
}

/// Filter, order and window a snapshot of records.
pub fn select<E: SearchEntity + Document>(
    rows: impl IntoIterator<Item = E>,
    criteria: &Query,
    sort: &SortSpec,
    window: Window,
) -> Vec<E> {
    let mut rows: Vec<E> = rows.into_iter().filter(|r| matches(criteria, r)).collect();
    rows.sort_by(|a, b| compare(a, b, sort));
    rows.into_iter()
        .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
        .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
        .collect()
}

pub fn count<D: Document>(rows: impl IntoIterator<Item = D>, criteria: &Query) -> u64 {
    rows.into_iter().filter(|r| matches(criteria, r)).count() as u64
}
