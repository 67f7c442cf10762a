// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Builder - predicate AST for search criteria
//!
//! A [`Query`] is the single value both the paginated find and the count are
//! computed from. Stores translate it (SQL `WHERE` clause) or evaluate it
//! in process, but never build their own predicate from the request.
//!
//! # Example
//!
//! ```rust
//! use labor_market_search::search::{FilterValue, Query, QueryBuilder};
//!
//! // Free text over two fields, AND a project membership test
//! let query = QueryBuilder::new()
//!     .contains_any(&["title", "description"], "dune")
//!     .any_of("projects", vec![FilterValue::text("solana"), FilterValue::text("near")])
//!     .build_and();
//!
//! // Empty value sets add nothing
//! let all = QueryBuilder::new().any_of("projects", vec![]).build_and();
//! assert!(all.is_match_all());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Case folding for `Contains`. Every store folds both the needle and the
/// haystack with this, so free-text matches agree across stores.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Search query AST
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    /// Root query node
    pub root: QueryNode,
}

impl Query {
    /// Create a new query from a root node
    pub fn new(root: QueryNode) -> Self {
        Self { root }
    }

    /// Query matching every record
    pub fn match_all() -> Self {
        Self::new(QueryNode::All)
    }

    /// Case-insensitive substring match on one text field
    pub fn contains(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(QueryNode::Field(FieldQuery {
            field: field.into(),
            operator: FieldOperator::Contains,
            value: QueryValue::Text(text.into()),
        }))
    }

    /// Membership test: the field (scalar or relation) holds any of `values`
    pub fn any_of(field: impl Into<String>, values: Vec<FilterValue>) -> Self {
        Self::new(QueryNode::Field(FieldQuery {
            field: field.into(),
            operator: FieldOperator::In,
            value: QueryValue::Values(values),
        }))
    }

    /// Combine with AND
    pub fn and(self, other: Query) -> Self {
        match (self.root, other.root) {
            (QueryNode::All, node) | (node, QueryNode::All) => Self::new(node),
            (a, b) => Self::new(QueryNode::And(vec![a, b])),
        }
    }

    pub fn is_match_all(&self) -> bool {
        self.root == QueryNode::All
    }
}

/// Query AST node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryNode {
    /// Matches everything
    All,
    /// Single field predicate
    Field(FieldQuery),
    /// Boolean AND
    And(Vec<QueryNode>),
    /// Boolean OR
    Or(Vec<QueryNode>),
}

/// Field query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldQuery {
    /// Logical field name (e.g., "title", "projects")
    pub field: String,
    /// Comparison operator
    pub operator: FieldOperator,
    /// Query value
    pub value: QueryValue,
}

/// Field comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldOperator {
    /// Case-insensitive substring
    Contains,
    /// Membership in a value set (OR semantics)
    In,
}

/// Query value type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryValue {
    /// Text value
    Text(String),
    /// Value set for membership tests
    Values(Vec<FilterValue>),
}

/// A single filter value after validation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        FilterValue::Text(value.into())
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => f.write_str(s),
            FilterValue::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

/// Builder for conjunctive search criteria
#[derive(Default)]
pub struct QueryBuilder {
    nodes: Vec<QueryNode>,
}

impl QueryBuilder {
    /// Create a new query builder
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a free-text constraint: any of `fields` contains `text`.
    /// Blank text adds nothing.
    pub fn contains_any(mut self, fields: &[&str], text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() || fields.is_empty() {
            return self;
        }
        let mut alternatives: Vec<QueryNode> = fields
            .iter()
            .map(|field| Query::contains(*field, text).root)
            .collect();
        if alternatives.len() == 1 {
            self.nodes.extend(alternatives.pop());
        } else {
            self.nodes.push(QueryNode::Or(alternatives));
        }
        self
    }

    /// Add a membership constraint. An empty value set adds nothing.
    pub fn any_of(mut self, field: impl Into<String>, values: Vec<FilterValue>) -> Self {
        if !values.is_empty() {
            self.nodes.push(Query::any_of(field, values).root);
        }
        self
    }

    /// Build query with AND semantics (all constraints must match)
    pub fn build_and(mut self) -> Query {
        match self.nodes.len() {
            0 => Query::match_all(),
            1 => Query::new(self.nodes.remove(0)),
            _ => Query::new(QueryNode::And(self.nodes)),
        }
    }
}
