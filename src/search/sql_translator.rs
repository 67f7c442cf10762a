// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQL Translator
//!
//! Translates the Query AST into parameterized SQL over a relational schema.
//! Logical field names are resolved through a [`TableSpec`]; anything not in
//! the table spec is an error, so no caller-supplied text is ever spliced into SQL.
//!
//! # SQL Syntax Generated
//!
//! ```sql
//! t.title_folded LIKE ? ESCAPE '!'                        -- Contains
//! t.status IN (?, ?)                                      -- Scalar membership
//! EXISTS (SELECT 1 FROM labor_market_projects r
//!         WHERE r.labor_market_address = t.address
//!           AND r.project_slug IN (?, ?))                 -- Relation membership
//! ```
//!
//! `?` placeholders work for both SQLite and MySQL. `!` is used as the LIKE
//! escape character because backslash means different things in the two
//! dialects' string literals.
//!
//! `Contains` only runs against [`SqlTarget::Text`] fields. The needle is
//! folded with [`fold_case`] and compared with the shadow column the store
//! filled with the same function, so no database-side `LOWER()` is involved.

use thiserror::Error;

use super::pagination::Window;
use super::query_builder::{
    fold_case, FieldOperator, FieldQuery, FilterValue, Query, QueryNode, QueryValue,
};
use super::request::{SortOrder, SortSpec};

/// Alias of the base table in every generated statement
pub const ALIAS: &str = "t";

/// How a logical field maps onto the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlTarget {
    /// A column or scalar expression over the base row (already alias-qualified)
    Column(&'static str),
    /// A text column plus the shadow column holding its folded value
    Text {
        column: &'static str,
        folded: &'static str,
    },
    /// A many-valued relation held in a join table keyed by the owner
    Relation {
        table: &'static str,
        owner_column: &'static str,
        value_column: &'static str,
    },
}

/// Schema description of one searchable table.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub table: &'static str,
    pub key_column: &'static str,
    /// Projection used by `SELECT`, including derived columns
    pub select_columns: &'static str,
    pub fields: &'static [(&'static str, SqlTarget)],
}

impl TableSpec {
    pub fn target(&self, field: &str) -> Option<SqlTarget> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, target)| *target)
    }
}

/// SQL query translator
pub struct SqlTranslator;

/// SQL fragment or statement with parameterized placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub clause: String,
    /// The parameter values in order
    pub params: Vec<SqlParam>,
}

/// SQL parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
}

impl From<&FilterValue> for SqlParam {
    fn from(value: &FilterValue) -> Self {
        match value {
            FilterValue::Text(s) => SqlParam::Text(s.clone()),
            FilterValue::Integer(n) => SqlParam::Integer(*n),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("field '{field}' is not mapped on table '{table}'")]
    UnknownField { table: &'static str, field: String },
    #[error("operator {operator:?} is not supported on field '{field}'")]
    Unsupported { field: String, operator: FieldOperator },
}

impl SqlQuery {
    /// Statement with values inlined.
    ///
    /// Warning: Only use for debugging, not for actual queries (SQL injection risk)
    pub fn inline(&self) -> String {
        let mut result = String::with_capacity(self.clause.len());
        let mut params = self.params.iter();
        // Placeholders only ever appear in the generated clause, never in values
        for c in self.clause.chars() {
            if c != '?' {
                result.push(c);
                continue;
            }
            match params.next() {
                Some(SqlParam::Text(s)) => {
                    result.push('\'');
                    result.push_str(&s.replace('\'', "''"));
                    result.push('\'');
                }
                Some(SqlParam::Integer(n)) => result.push_str(&n.to_string()),
                None => result.push('?'),
            }
        }
        result
    }
}

impl SqlTranslator {
    /// Translate criteria into a `WHERE` clause (without the keyword)
    pub fn translate(query: &Query, spec: &TableSpec) -> Result<SqlQuery, TranslateError> {
        let mut params = Vec::new();
        let clause = Self::translate_node(&query.root, spec, &mut params)?;
        Ok(SqlQuery { clause, params })
    }

    /// `ORDER BY` clause: primary field, then key ascending
    pub fn order_by(spec: &TableSpec, sort: &SortSpec) -> Result<String, TranslateError> {
        let primary = match spec.target(sort.field) {
            Some(SqlTarget::Column(expr)) | Some(SqlTarget::Text { column: expr, .. }) => expr,
            Some(SqlTarget::Relation { .. }) | None => {
                return Err(TranslateError::UnknownField {
                    table: spec.table,
                    field: sort.field.to_string(),
                })
            }
        };
        let direction = match sort.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        Ok(format!(
            "ORDER BY {} {}, {}.{} ASC",
            primary, direction, ALIAS, spec.key_column
        ))
    }

    /// Paginated `SELECT` for the criteria
    pub fn select(
        spec: &TableSpec,
        criteria: &Query,
        sort: &SortSpec,
        window: Window,
    ) -> Result<SqlQuery, TranslateError> {
        let mut filter = Self::translate(criteria, spec)?;
        let order_by = Self::order_by(spec, sort)?;
        filter.params.push(SqlParam::Integer(clamp_i64(window.limit)));
        filter.params.push(SqlParam::Integer(clamp_i64(window.offset)));
        Ok(SqlQuery {
            clause: format!(
                "SELECT {} FROM {} {} WHERE {} {} LIMIT ? OFFSET ?",
                spec.select_columns, spec.table, ALIAS, filter.clause, order_by
            ),
            params: filter.params,
        })
    }

    /// `COUNT(*)` over the same criteria, without ordering or window
    pub fn count(spec: &TableSpec, criteria: &Query) -> Result<SqlQuery, TranslateError> {
        let filter = Self::translate(criteria, spec)?;
        Ok(SqlQuery {
            clause: format!(
                "SELECT COUNT(*) AS total FROM {} {} WHERE {}",
                spec.table, ALIAS, filter.clause
            ),
            params: filter.params,
        })
    }

    fn translate_node(
        node: &QueryNode,
        spec: &TableSpec,
        params: &mut Vec<SqlParam>,
    ) -> Result<String, TranslateError> {
        match node {
            QueryNode::All => Ok("1=1".to_string()),
            QueryNode::Field(field_query) => Self::translate_field(field_query, spec, params),
            QueryNode::And(nodes) => Self::join(nodes, " AND ", spec, params),
            QueryNode::Or(nodes) => Self::join(nodes, " OR ", spec, params),
        }
    }

    fn join(
        nodes: &[QueryNode],
        separator: &str,
        spec: &TableSpec,
        params: &mut Vec<SqlParam>,
    ) -> Result<String, TranslateError> {
        let parts = nodes
            .iter()
            .map(|n| Self::translate_node(n, spec, params))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(match parts.len() {
            0 => "1=1".to_string(),
            1 => parts.into_iter().next().unwrap_or_default(),
            _ => format!("({})", parts.join(separator)),
        })
    }

    fn translate_field(
        field: &FieldQuery,
        spec: &TableSpec,
        params: &mut Vec<SqlParam>,
    ) -> Result<String, TranslateError> {
        let target = spec
            .target(&field.field)
            .ok_or_else(|| TranslateError::UnknownField {
                table: spec.table,
                field: field.field.clone(),
            })?;

        match (field.operator, &field.value, target) {
            (FieldOperator::Contains, QueryValue::Text(text), SqlTarget::Text { folded, .. }) => {
                params.push(SqlParam::Text(format!("%{}%", escape_like(&fold_case(text)))));
                Ok(format!("{} LIKE ? ESCAPE '!'", folded))
            }
            (FieldOperator::In, QueryValue::Values(values), _) if values.is_empty() => {
                Ok("1=1".to_string())
            }
            (FieldOperator::In, QueryValue::Values(values), SqlTarget::Column(expr))
            | (FieldOperator::In, QueryValue::Values(values), SqlTarget::Text { column: expr, .. }) => {
                params.extend(values.iter().map(SqlParam::from));
                Ok(format!("{} IN ({})", expr, placeholders(values.len())))
            }
            (
                FieldOperator::In,
                QueryValue::Values(values),
                SqlTarget::Relation {
                    table,
                    owner_column,
                    value_column,
                },
            ) => {
                params.extend(values.iter().map(SqlParam::from));
                Ok(format!(
                    "EXISTS (SELECT 1 FROM {} r WHERE r.{} = {}.{} AND r.{} IN ({}))",
                    table,
                    owner_column,
                    ALIAS,
                    spec.key_column,
                    value_column,
                    placeholders(values.len())
                ))
            }
            (operator, _, _) => Err(TranslateError::Unsupported {
                field: field.field.clone(),
                operator,
            }),
        }
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Escape LIKE wildcards with `!`
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '!' | '%' | '_') {
            out.push('!');
        }
        out.push(c);
    }
    out
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::query_builder::QueryBuilder;

    const SPEC: TableSpec = TableSpec {
        table: "labor_markets",
        key_column: "address",
        select_columns: "t.address, t.title",
        fields: &[
            ("title", SqlTarget::Text { column: "t.title", folded: "t.title_folded" }),
            ("description", SqlTarget::Text { column: "t.description", folded: "t.description_folded" }),
            ("type", SqlTarget::Column("t.program_type")),
            (
                "projects",
                SqlTarget::Relation {
                    table: "labor_market_projects",
                    owner_column: "labor_market_address",
                    value_column: "project_slug",
                },
            ),
        ],
    };

    fn title_asc() -> SortSpec {
        SortSpec {
            field: "title",
            order: SortOrder::Asc,
            key_field: "address",
        }
    }

    #[test]
    fn test_match_all() {
        let sql = SqlTranslator::translate(&Query::match_all(), &SPEC).unwrap();
        assert_eq!(sql.clause, "1=1");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn test_contains_folds_and_wraps() {
        let sql = SqlTranslator::translate(&Query::contains("title", "Dune"), &SPEC).unwrap();
        assert_eq!(sql.clause, "t.title_folded LIKE ? ESCAPE '!'");
        assert_eq!(sql.params, vec![SqlParam::Text("%dune%".to_string())]);
    }

    #[test]
    fn test_contains_folds_non_ascii_needle() {
        let sql = SqlTranslator::translate(&Query::contains("title", "ÉMILE Über"), &SPEC).unwrap();
        assert_eq!(sql.params, vec![SqlParam::Text("%émile über%".to_string())]);
    }

    #[test]
    fn test_contains_on_plain_column_unsupported() {
        let err = SqlTranslator::translate(&Query::contains("type", "brain"), &SPEC).unwrap_err();
        assert!(matches!(err, TranslateError::Unsupported { .. }));
    }

    #[test]
    fn test_in_on_text_field_reads_original_column() {
        let sql = SqlTranslator::translate(&Query::any_of("title", vec!["Dune".into()]), &SPEC).unwrap();
        assert_eq!(sql.clause, "t.title IN (?)");
    }

    #[test]
    fn test_contains_escapes_wildcards() {
        let sql = SqlTranslator::translate(&Query::contains("title", "50%_off!"), &SPEC).unwrap();
        assert_eq!(sql.params, vec![SqlParam::Text("%50!%!_off!!%".to_string())]);
    }

    #[test]
    fn test_scalar_in() {
        let query = Query::any_of("type", vec!["brainstorm".into(), "analyze".into()]);
        let sql = SqlTranslator::translate(&query, &SPEC).unwrap();
        assert_eq!(sql.clause, "t.program_type IN (?, ?)");
        assert_eq!(
            sql.params,
            vec![
                SqlParam::Text("brainstorm".to_string()),
                SqlParam::Text("analyze".to_string())
            ]
        );
    }

    #[test]
    fn test_relation_in() {
        let query = Query::any_of("projects", vec!["solana".into()]);
        let sql = SqlTranslator::translate(&query, &SPEC).unwrap();
        assert_eq!(
            sql.clause,
            "EXISTS (SELECT 1 FROM labor_market_projects r WHERE r.labor_market_address = t.address AND r.project_slug IN (?))"
        );
    }

    #[test]
    fn test_text_or_and_filters() {
        let query = QueryBuilder::new()
            .contains_any(&["title", "description"], "dune")
            .any_of("type", vec!["brainstorm".into()])
            .build_and();
        let sql = SqlTranslator::translate(&query, &SPEC).unwrap();
        assert_eq!(
            sql.clause,
            "((t.title_folded LIKE ? ESCAPE '!' OR t.description_folded LIKE ? ESCAPE '!') AND t.program_type IN (?))"
        );
        assert_eq!(sql.params.len(), 3);
    }

    #[test]
    fn test_unknown_field_is_error() {
        let err = SqlTranslator::translate(&Query::contains("password", "x"), &SPEC).unwrap_err();
        assert!(matches!(err, TranslateError::UnknownField { .. }));
    }

    #[test]
    fn test_contains_on_relation_unsupported() {
        let err = SqlTranslator::translate(&Query::contains("projects", "sol"), &SPEC).unwrap_err();
        assert!(matches!(err, TranslateError::Unsupported { .. }));
    }

    #[test]
    fn test_order_by_has_key_tiebreak() {
        let clause = SqlTranslator::order_by(&SPEC, &title_asc()).unwrap();
        assert_eq!(clause, "ORDER BY t.title ASC, t.address ASC");

        let mut desc = title_asc();
        desc.order = SortOrder::Desc;
        let clause = SqlTranslator::order_by(&SPEC, &desc).unwrap();
        assert_eq!(clause, "ORDER BY t.title DESC, t.address ASC");
    }

    #[test]
    fn test_select_and_count_share_where_clause() {
        let query = Query::any_of("projects", vec!["solana".into()]);
        let select = SqlTranslator::select(&SPEC, &query, &title_asc(), Window { offset: 24, limit: 12 }).unwrap();
        let count = SqlTranslator::count(&SPEC, &query).unwrap();
        let filter = SqlTranslator::translate(&query, &SPEC).unwrap();

        assert!(select.clause.contains(&filter.clause));
        assert!(count.clause.ends_with(&filter.clause));
        assert!(select.clause.ends_with("LIMIT ? OFFSET ?"));
        assert_eq!(
            &select.params[select.params.len() - 2..],
            &[SqlParam::Integer(12), SqlParam::Integer(24)]
        );
        assert_eq!(count.params, filter.params);
    }

    #[test]
    fn test_unbounded_window_clamps() {
        let select = SqlTranslator::select(&SPEC, &Query::match_all(), &title_asc(), Window::UNBOUNDED).unwrap();
        assert_eq!(select.params[0], SqlParam::Integer(i64::MAX));
    }

    #[test]
    fn test_inline_quotes_text() {
        let sql = SqlTranslator::translate(&Query::any_of("type", vec!["o'neil".into()]), &SPEC).unwrap();
        assert_eq!(sql.inline(), "t.program_type IN ('o''neil')");
    }

    #[test]
    fn test_inline_leaves_question_marks_in_values_alone() {
        let query = Query::any_of("type", vec!["why?".into(), "analyze".into()]);
        let sql = SqlTranslator::translate(&query, &SPEC).unwrap();
        assert_eq!(sql.inline(), "t.program_type IN ('why?', 'analyze')");
    }
}
