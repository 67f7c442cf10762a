// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQL record store (SQLite or MySQL through the sqlx `Any` driver).
//!
//! Schema:
//! ```sql
//! labor_markets             (address PK, title, description, program_type, created_at)
//! labor_market_projects     (labor_market_address, project_slug)
//! labor_market_tokens       (labor_market_address, token_symbol)
//! labor_market_capabilities (labor_market_address, capability)
//! service_requests          (id PK, labor_market_address, title, description, status,
//!                            sponsor, starts_at NULL, ends_at NULL, created_at)
//! submissions               (id PK, service_request_id, author, title, description, created_at)
//! reviews                   (id PK, submission_id, reviewer, score 1..5, created_at)
//! projects                  (slug PK, name)
//! tokens                    (symbol PK, name)
//! ```
//!
//! Derived counts (`service_request_count`, `review_count`) are correlated
//! subqueries, so they are always current and can be sorted on.
//!
//! Free-text columns (`title`, `description`, `reviewer`) each have a
//! `*_folded` shadow written with [`fold_case`] on upsert. `Contains` matches
//! against the shadow, which keeps non-ASCII case folding identical to the
//! in-memory store. MySQL tables use `utf8mb4_bin`, so comparisons and
//! ordering are binary as on SQLite.
//!
//! ## sqlx Any Driver Quirks
//!
//! MySQL TEXT columns come back as BLOB through `Any`, so text is read as
//! `String` first and as `Vec<u8>` second.

use std::collections::HashMap;
use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::any::{AnyArguments, AnyPoolOptions, AnyRow};
use sqlx::{Any, AnyPool, Row};
use tracing::{debug, info};

use super::traits::{RecordStore, StorageError};
use crate::config::SearchServiceConfig;
use crate::model::{
    Capability, Challenge, ChallengeStatus, Marketplace, ProgramType, Project, Review,
    ReviewScore, Submission, Token,
};
use crate::resilience::retry::{retry, retry_if, RetryConfig};
use crate::search::{
    fields, fold_case, Query, SearchEntity, SortSpec, SqlParam, SqlQuery, SqlTarget, SqlTranslator,
    TableSpec, Window,
};

// SQLx `Any` driver requires runtime installation
static INSTALL_DRIVERS: Once = Once::new();

fn install_drivers() {
    INSTALL_DRIVERS.call_once(|| {
        sqlx::any::install_default_drivers();
    });
}

type AnyQuery<'q> = sqlx::query::Query<'q, Any, AnyArguments<'q>>;

pub struct SqlStore {
    pool: AnyPool,
    is_sqlite: bool,
}

impl SqlStore {
    /// Connect with default pool settings.
    pub async fn new(connection_string: &str) -> Result<Self, StorageError> {
        let config = SearchServiceConfig {
            sql_url: connection_string.to_string(),
            ..SearchServiceConfig::default()
        };
        Self::from_config(&config).await
    }

    /// Connect with startup-mode retry (fails fast if config is wrong) and create the schema.
    ///
    /// `sqlite::memory:` databases live and die with their connection, so the
    /// pool is pinned to one connection that is never recycled.
    pub async fn from_config(config: &SearchServiceConfig) -> Result<Self, StorageError> {
        install_drivers();

        let url = config.sql_url.as_str();
        let is_sqlite = url.starts_with("sqlite:");
        let in_memory = is_sqlite && url.contains(":memory:");

        let pool = retry("sql_connect", &RetryConfig::startup(), || async {
            let options = AnyPoolOptions::new().acquire_timeout(config.acquire_timeout());
            let options = if in_memory {
                options.max_connections(1).idle_timeout(None).max_lifetime(None)
            } else {
                options
                    .max_connections(config.max_connections)
                    .idle_timeout(Duration::from_secs(300))
            };
            options.connect(url).await.map_err(connection_error)
        })
        .await?;

        let store = Self { pool, is_sqlite };

        if is_sqlite && !in_memory {
            store.enable_wal_mode().await?;
        }

        store.init_schema().await?;
        info!(sqlite = is_sqlite, "SQL store ready");
        Ok(store)
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Concurrent reads during writes for file-backed SQLite.
    async fn enable_wal_mode(&self) -> Result<(), StorageError> {
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to enable WAL mode: {}", e)))?;

        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to set synchronous mode: {}", e)))?;

        Ok(())
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        let statements = if self.is_sqlite {
            SQLITE_SCHEMA
        } else {
            MYSQL_SCHEMA
        };

        for sql in statements {
            retry("sql_init_schema", &RetryConfig::startup(), || async {
                sqlx::query(sql)
                    .execute(&self.pool)
                    .await
                    .map_err(backend_error)
            })
            .await?;
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Write path
    // ═══════════════════════════════════════════════════════════════════════

    /// Insert or replace a marketplace and its relation rows, atomically.
    pub async fn upsert_marketplace(&self, marketplace: &Marketplace) -> Result<(), StorageError> {
        retry_if(
            "sql_upsert_marketplace",
            &RetryConfig::query(),
            StorageError::is_transient,
            || self.write_marketplace(marketplace),
        )
        .await
    }

    async fn write_marketplace(&self, m: &Marketplace) -> Result<(), StorageError> {
        let sql = if self.is_sqlite {
            "INSERT INTO labor_markets (address, title, description, title_folded, description_folded, program_type, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(address) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                title_folded = excluded.title_folded,
                description_folded = excluded.description_folded,
                program_type = excluded.program_type,
                created_at = excluded.created_at"
        } else {
            "INSERT INTO labor_markets (address, title, description, title_folded, description_folded, program_type, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON DUPLICATE KEY UPDATE
                title = VALUES(title),
                description = VALUES(description),
                title_folded = VALUES(title_folded),
                description_folded = VALUES(description_folded),
                program_type = VALUES(program_type),
                created_at = VALUES(created_at)"
        };

        let mut tx = self.pool.begin().await.map_err(backend_error)?;

        sqlx::query(sql)
            .bind(m.address.clone())
            .bind(m.title.clone())
            .bind(m.description.clone())
            .bind(fold_case(&m.title))
            .bind(fold_case(&m.description))
            .bind(m.program_type.as_str().to_string())
            .bind(m.created_at)
            .execute(&mut *tx)
            .await
            .map_err(backend_error)?;

        let capabilities: Vec<String> = m.capabilities.iter().map(|c| c.as_str().to_string()).collect();
        let relations: [(&str, &str, &[String]); 3] = [
            ("labor_market_projects", "project_slug", m.projects.as_slice()),
            ("labor_market_tokens", "token_symbol", m.reward_tokens.as_slice()),
            ("labor_market_capabilities", "capability", capabilities.as_slice()),
        ];

        for (table, column, values) in relations {
            sqlx::query(&format!("DELETE FROM {} WHERE labor_market_address = ?", table))
                .bind(m.address.clone())
                .execute(&mut *tx)
                .await
                .map_err(backend_error)?;

            let mut seen: Vec<&String> = Vec::with_capacity(values.len());
            for value in values {
                if seen.contains(&value) {
                    continue;
                }
                seen.push(value);
                sqlx::query(&format!(
                    "INSERT INTO {} (labor_market_address, {}) VALUES (?, ?)",
                    table, column
                ))
                .bind(m.address.clone())
                .bind(value.clone())
                .execute(&mut *tx)
                .await
                .map_err(backend_error)?;
            }
        }

        tx.commit().await.map_err(backend_error)?;
        Ok(())
    }

    /// Insert or replace a challenge by id.
    pub async fn upsert_challenge(&self, c: &Challenge) -> Result<(), StorageError> {
        let sql = if self.is_sqlite {
            "INSERT INTO service_requests (id, labor_market_address, title, description, title_folded, description_folded, status, sponsor, starts_at, ends_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                labor_market_address = excluded.labor_market_address,
                title = excluded.title,
                description = excluded.description,
                title_folded = excluded.title_folded,
                description_folded = excluded.description_folded,
                status = excluded.status,
                sponsor = excluded.sponsor,
                starts_at = excluded.starts_at,
                ends_at = excluded.ends_at,
                created_at = excluded.created_at"
        } else {
            "INSERT INTO service_requests (id, labor_market_address, title, description, title_folded, description_folded, status, sponsor, starts_at, ends_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON DUPLICATE KEY UPDATE
                labor_market_address = VALUES(labor_market_address),
                title = VALUES(title),
                description = VALUES(description),
                title_folded = VALUES(title_folded),
                description_folded = VALUES(description_folded),
                status = VALUES(status),
                sponsor = VALUES(sponsor),
                starts_at = VALUES(starts_at),
                ends_at = VALUES(ends_at),
                created_at = VALUES(created_at)"
        };

        retry_if("sql_upsert_challenge", &RetryConfig::query(), StorageError::is_transient, || async {
            sqlx::query(sql)
                .bind(c.id.clone())
                .bind(c.marketplace_address.clone())
                .bind(c.title.clone())
                .bind(c.description.clone())
                .bind(fold_case(&c.title))
                .bind(fold_case(&c.description))
                .bind(c.status.as_str().to_string())
                .bind(c.sponsor.clone())
                .bind(c.starts_at)
                .bind(c.ends_at)
                .bind(c.created_at)
                .execute(&self.pool)
                .await
                .map_err(backend_error)?;
            Ok(())
        })
        .await
    }

    /// Insert or replace a submission by id. `review_count` is derived and not stored.
    pub async fn upsert_submission(&self, s: &Submission) -> Result<(), StorageError> {
        let sql = if self.is_sqlite {
            "INSERT INTO submissions (id, service_request_id, author, title, description, title_folded, description_folded, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                service_request_id = excluded.service_request_id,
                author = excluded.author,
                title = excluded.title,
                description = excluded.description,
                title_folded = excluded.title_folded,
                description_folded = excluded.description_folded,
                created_at = excluded.created_at"
        } else {
            "INSERT INTO submissions (id, service_request_id, author, title, description, title_folded, description_folded, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON DUPLICATE KEY UPDATE
                service_request_id = VALUES(service_request_id),
                author = VALUES(author),
                title = VALUES(title),
                description = VALUES(description),
                title_folded = VALUES(title_folded),
                description_folded = VALUES(description_folded),
                created_at = VALUES(created_at)"
        };

        retry_if("sql_upsert_submission", &RetryConfig::query(), StorageError::is_transient, || async {
            sqlx::query(sql)
                .bind(s.id.clone())
                .bind(s.challenge_id.clone())
                .bind(s.author.clone())
                .bind(s.title.clone())
                .bind(s.description.clone())
                .bind(fold_case(&s.title))
                .bind(fold_case(&s.description))
                .bind(s.created_at)
                .execute(&self.pool)
                .await
                .map_err(backend_error)?;
            Ok(())
        })
        .await
    }

    /// Insert or replace a review by id. The score is stored as its Likert value.
    pub async fn upsert_review(&self, r: &Review) -> Result<(), StorageError> {
        let sql = if self.is_sqlite {
            "INSERT INTO reviews (id, submission_id, reviewer, reviewer_folded, score, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                submission_id = excluded.submission_id,
                reviewer = excluded.reviewer,
                reviewer_folded = excluded.reviewer_folded,
                score = excluded.score,
                created_at = excluded.created_at"
        } else {
            "INSERT INTO reviews (id, submission_id, reviewer, reviewer_folded, score, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON DUPLICATE KEY UPDATE
                submission_id = VALUES(submission_id),
                reviewer = VALUES(reviewer),
                reviewer_folded = VALUES(reviewer_folded),
                score = VALUES(score),
                created_at = VALUES(created_at)"
        };

        retry_if("sql_upsert_review", &RetryConfig::query(), StorageError::is_transient, || async {
            sqlx::query(sql)
                .bind(r.id.clone())
                .bind(r.submission_id.clone())
                .bind(r.reviewer.clone())
                .bind(fold_case(&r.reviewer))
                .bind(r.score.likert())
                .bind(r.created_at)
                .execute(&self.pool)
                .await
                .map_err(backend_error)?;
            Ok(())
        })
        .await
    }

    pub async fn upsert_project(&self, project: &Project) -> Result<(), StorageError> {
        self.upsert_reference("projects", "slug", &project.slug, &project.name).await
    }

    pub async fn upsert_token(&self, token: &Token) -> Result<(), StorageError> {
        self.upsert_reference("tokens", "symbol", &token.symbol, &token.name).await
    }

    async fn upsert_reference(
        &self,
        table: &str,
        key_column: &str,
        key: &str,
        name: &str,
    ) -> Result<(), StorageError> {
        let sql = if self.is_sqlite {
            format!(
                "INSERT INTO {table} ({key_column}, name) VALUES (?, ?) ON CONFLICT({key_column}) DO UPDATE SET name = excluded.name"
            )
        } else {
            format!(
                "INSERT INTO {table} ({key_column}, name) VALUES (?, ?) ON DUPLICATE KEY UPDATE name = VALUES(name)"
            )
        };

        retry_if("sql_upsert_reference", &RetryConfig::query(), StorageError::is_transient, || async {
            sqlx::query(&sql)
                .bind(key.to_string())
                .bind(name.to_string())
                .execute(&self.pool)
                .await
                .map_err(backend_error)?;
            Ok(())
        })
        .await
    }

    /// All projects, by slug. Feeds the marketplace `project` filter options.
    pub async fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        let rows = sqlx::query("SELECT slug, name FROM projects ORDER BY slug")
            .fetch_all(&self.pool)
            .await
            .map_err(backend_error)?;
        rows.iter()
            .map(|row| {
                Ok(Project {
                    slug: get_text(row, "slug")?,
                    name: get_text(row, "name")?,
                })
            })
            .collect()
    }

    /// All tokens, by symbol. Feeds the marketplace `token` filter options.
    pub async fn list_tokens(&self) -> Result<Vec<Token>, StorageError> {
        let rows = sqlx::query("SELECT symbol, name FROM tokens ORDER BY symbol")
            .fetch_all(&self.pool)
            .await
            .map_err(backend_error)?;
        rows.iter()
            .map(|row| {
                Ok(Token {
                    symbol: get_text(row, "symbol")?,
                    name: get_text(row, "name")?,
                })
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Read path
// ═══════════════════════════════════════════════════════════════════════════

/// An entity stored in one base table, decodable from a row of its projection.
#[async_trait]
pub trait SqlEntity: SearchEntity + Sized {
    const TABLE: TableSpec;

    fn from_row(row: &AnyRow) -> Result<Self, StorageError>;

    /// Load many-valued relations for a page of rows.
    async fn hydrate(_pool: &AnyPool, _rows: &mut [Self]) -> Result<(), StorageError> {
        Ok(())
    }
}

fn bind_params<'q>(sql: &'q str, params: &[SqlParam]) -> AnyQuery<'q> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = match param {
            SqlParam::Text(s) => query.bind(s.clone()),
            SqlParam::Integer(n) => query.bind(*n),
        };
    }
    query
}

#[async_trait]
impl<E: SqlEntity> RecordStore<E> for SqlStore {
    async fn find_many(
        &self,
        criteria: &Query,
        sort: &SortSpec,
        window: Window,
    ) -> Result<Vec<E>, StorageError> {
        let sql: SqlQuery = SqlTranslator::select(&E::TABLE, criteria, sort, window)?;
        debug!(entity = E::KIND.as_str(), sql = %sql.clause, params = sql.params.len(), "find_many");

        let rows = bind_params(&sql.clause, &sql.params)
            .fetch_all(&self.pool)
            .await
            .map_err(backend_error)?;

        let mut items = rows.iter().map(E::from_row).collect::<Result<Vec<_>, _>>()?;
        E::hydrate(&self.pool, &mut items).await?;
        Ok(items)
    }

    async fn count(&self, criteria: &Query) -> Result<u64, StorageError> {
        let sql = SqlTranslator::count(&E::TABLE, criteria)?;
        debug!(entity = E::KIND.as_str(), sql = %sql.clause, "count");

        let row = bind_params(&sql.clause, &sql.params)
            .fetch_one(&self.pool)
            .await
            .map_err(backend_error)?;
        get_count(&row, "total")
    }

    async fn find(&self, key: &str) -> Result<Option<E>, StorageError> {
        let spec = &E::TABLE;
        let clause = format!(
            "SELECT {} FROM {} t WHERE t.{} = ?",
            spec.select_columns, spec.table, spec.key_column
        );

        let row = sqlx::query(&clause)
            .bind(key.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)?;

        match row {
            Some(row) => {
                let mut items = vec![E::from_row(&row)?];
                E::hydrate(&self.pool, &mut items).await?;
                Ok(items.pop())
            }
            None => Ok(None),
        }
    }
}

const SERVICE_REQUEST_COUNT: &str =
    "(SELECT COUNT(*) FROM service_requests c WHERE c.labor_market_address = t.address)";

const REVIEW_COUNT: &str = "(SELECT COUNT(*) FROM reviews c WHERE c.submission_id = t.id)";

#[async_trait]
impl SqlEntity for Marketplace {
    const TABLE: TableSpec = TableSpec {
        table: "labor_markets",
        key_column: "address",
        select_columns: "t.address, t.title, t.description, t.program_type, t.created_at, \
             (SELECT COUNT(*) FROM service_requests c WHERE c.labor_market_address = t.address) AS service_request_count",
        fields: &[
            (fields::ADDRESS, SqlTarget::Column("t.address")),
            (fields::TITLE, SqlTarget::Text { column: "t.title", folded: "t.title_folded" }),
            (
                fields::DESCRIPTION,
                SqlTarget::Text { column: "t.description", folded: "t.description_folded" },
            ),
            (fields::PROGRAM_TYPE, SqlTarget::Column("t.program_type")),
            (fields::CREATED_AT, SqlTarget::Column("t.created_at")),
            (fields::SERVICE_REQUEST_COUNT, SqlTarget::Column(SERVICE_REQUEST_COUNT)),
            (
                fields::PROJECTS,
                SqlTarget::Relation {
                    table: "labor_market_projects",
                    owner_column: "labor_market_address",
                    value_column: "project_slug",
                },
            ),
            (
                fields::REWARD_TOKENS,
                SqlTarget::Relation {
                    table: "labor_market_tokens",
                    owner_column: "labor_market_address",
                    value_column: "token_symbol",
                },
            ),
            (
                fields::CAPABILITIES,
                SqlTarget::Relation {
                    table: "labor_market_capabilities",
                    owner_column: "labor_market_address",
                    value_column: "capability",
                },
            ),
        ],
    };

    fn from_row(row: &AnyRow) -> Result<Self, StorageError> {
        Ok(Marketplace {
            address: get_text(row, "address")?,
            title: get_text(row, "title")?,
            description: get_text(row, "description")?,
            program_type: get_text(row, "program_type")?
                .parse::<ProgramType>()
                .map_err(StorageError::Decode)?,
            projects: Vec::new(),
            reward_tokens: Vec::new(),
            capabilities: Vec::new(),
            created_at: get_i64(row, "created_at")?,
            service_request_count: get_count(row, "service_request_count")?,
        })
    }

    async fn hydrate(pool: &AnyPool, rows: &mut [Self]) -> Result<(), StorageError> {
        if rows.is_empty() {
            return Ok(());
        }
        let owners: Vec<String> = rows.iter().map(|m| m.address.clone()).collect();

        let mut projects = load_relation(pool, "labor_market_projects", "project_slug", &owners).await?;
        let mut tokens = load_relation(pool, "labor_market_tokens", "token_symbol", &owners).await?;
        let mut capabilities = load_relation(pool, "labor_market_capabilities", "capability", &owners).await?;

        for m in rows.iter_mut() {
            m.projects = projects.remove(&m.address).unwrap_or_default();
            m.reward_tokens = tokens.remove(&m.address).unwrap_or_default();
            m.capabilities = capabilities
                .remove(&m.address)
                .unwrap_or_default()
                .iter()
                .map(|c| c.parse::<Capability>().map_err(StorageError::Decode))
                .collect::<Result<_, _>>()?;
        }
        Ok(())
    }
}

/// Relation values grouped by owner, each group ordered by value.
async fn load_relation(
    pool: &AnyPool,
    table: &str,
    value_column: &str,
    owners: &[String],
) -> Result<HashMap<String, Vec<String>>, StorageError> {
    let sql = format!(
        "SELECT labor_market_address, {value_column} FROM {table} WHERE labor_market_address IN ({}) ORDER BY labor_market_address, {value_column}",
        vec!["?"; owners.len()].join(", ")
    );
    let mut query = sqlx::query(&sql);
    for owner in owners {
        query = query.bind(owner.clone());
    }
    let rows = query.fetch_all(pool).await.map_err(backend_error)?;

    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for row in &rows {
        grouped
            .entry(get_text(row, "labor_market_address")?)
            .or_default()
            .push(get_text(row, value_column)?);
    }
    Ok(grouped)
}

impl SqlEntity for Challenge {
    const TABLE: TableSpec = TableSpec {
        table: "service_requests",
        key_column: "id",
        select_columns: "t.id, t.labor_market_address, t.title, t.description, t.status, t.sponsor, t.starts_at, t.ends_at, t.created_at",
        fields: &[
            (fields::ID, SqlTarget::Column("t.id")),
            (fields::MARKETPLACE_ADDRESS, SqlTarget::Column("t.labor_market_address")),
            (fields::TITLE, SqlTarget::Text { column: "t.title", folded: "t.title_folded" }),
            (
                fields::DESCRIPTION,
                SqlTarget::Text { column: "t.description", folded: "t.description_folded" },
            ),
            (fields::STATUS, SqlTarget::Column("t.status")),
            (fields::SPONSOR, SqlTarget::Column("t.sponsor")),
            (fields::STARTS_AT, SqlTarget::Column("t.starts_at")),
            (fields::ENDS_AT, SqlTarget::Column("t.ends_at")),
            (fields::CREATED_AT, SqlTarget::Column("t.created_at")),
        ],
    };

    fn from_row(row: &AnyRow) -> Result<Self, StorageError> {
        Ok(Challenge {
            id: get_text(row, "id")?,
            marketplace_address: get_text(row, "labor_market_address")?,
            title: get_text(row, "title")?,
            description: get_text(row, "description")?,
            status: get_text(row, "status")?
                .parse::<ChallengeStatus>()
                .map_err(StorageError::Decode)?,
            sponsor: get_text(row, "sponsor")?,
            starts_at: get_opt_i64(row, "starts_at")?,
            ends_at: get_opt_i64(row, "ends_at")?,
            created_at: get_i64(row, "created_at")?,
        })
    }
}

impl SqlEntity for Submission {
    const TABLE: TableSpec = TableSpec {
        table: "submissions",
        key_column: "id",
        select_columns: "t.id, t.service_request_id, t.author, t.title, t.description, t.created_at, \
             (SELECT COUNT(*) FROM reviews c WHERE c.submission_id = t.id) AS review_count",
        fields: &[
            (fields::ID, SqlTarget::Column("t.id")),
            (fields::CHALLENGE_ID, SqlTarget::Column("t.service_request_id")),
            (fields::AUTHOR, SqlTarget::Column("t.author")),
            (fields::TITLE, SqlTarget::Text { column: "t.title", folded: "t.title_folded" }),
            (
                fields::DESCRIPTION,
                SqlTarget::Text { column: "t.description", folded: "t.description_folded" },
            ),
            (fields::CREATED_AT, SqlTarget::Column("t.created_at")),
            (fields::REVIEW_COUNT, SqlTarget::Column(REVIEW_COUNT)),
        ],
    };

    fn from_row(row: &AnyRow) -> Result<Self, StorageError> {
        Ok(Submission {
            id: get_text(row, "id")?,
            challenge_id: get_text(row, "service_request_id")?,
            author: get_text(row, "author")?,
            title: get_text(row, "title")?,
            description: get_text(row, "description")?,
            created_at: get_i64(row, "created_at")?,
            review_count: get_count(row, "review_count")?,
        })
    }
}

impl SqlEntity for Review {
    const TABLE: TableSpec = TableSpec {
        table: "reviews",
        key_column: "id",
        select_columns: "t.id, t.submission_id, t.reviewer, t.score, t.created_at",
        fields: &[
            (fields::ID, SqlTarget::Column("t.id")),
            (fields::SUBMISSION_ID, SqlTarget::Column("t.submission_id")),
            (fields::REVIEWER, SqlTarget::Text { column: "t.reviewer", folded: "t.reviewer_folded" }),
            (fields::SCORE, SqlTarget::Column("t.score")),
            (fields::CREATED_AT, SqlTarget::Column("t.created_at")),
        ],
    };

    fn from_row(row: &AnyRow) -> Result<Self, StorageError> {
        let likert = get_i64(row, "score")?;
        Ok(Review {
            id: get_text(row, "id")?,
            submission_id: get_text(row, "submission_id")?,
            reviewer: get_text(row, "reviewer")?,
            score: ReviewScore::from_likert(likert)
                .ok_or_else(|| StorageError::Decode(format!("score {} is outside 1..=5", likert)))?,
            created_at: get_i64(row, "created_at")?,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Row decoding
// ═══════════════════════════════════════════════════════════════════════════

/// Text column: String first (SQLite TEXT), then bytes (MySQL TEXT through `Any`).
fn get_text(row: &AnyRow, column: &str) -> Result<String, StorageError> {
    row.try_get::<String, _>(column)
        .or_else(|_| {
            row.try_get::<Vec<u8>, _>(column)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        })
        .map_err(|e| StorageError::Decode(format!("{}: {}", column, e)))
}

fn get_i64(row: &AnyRow, column: &str) -> Result<i64, StorageError> {
    row.try_get::<i64, _>(column)
        .map_err(|e| StorageError::Decode(format!("{}: {}", column, e)))
}

fn get_opt_i64(row: &AnyRow, column: &str) -> Result<Option<i64>, StorageError> {
    row.try_get::<Option<i64>, _>(column)
        .map_err(|e| StorageError::Decode(format!("{}: {}", column, e)))
}

fn get_count(row: &AnyRow, column: &str) -> Result<u64, StorageError> {
    let n = get_i64(row, column)?;
    u64::try_from(n).map_err(|_| StorageError::Decode(format!("{}: negative count {}", column, n)))
}

fn backend_error(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::Connection(e.to_string())
        }
        _ => StorageError::Backend(e.to_string()),
    }
}

fn connection_error(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

// ═══════════════════════════════════════════════════════════════════════════
// Schema
// ═══════════════════════════════════════════════════════════════════════════

const SQLITE_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS labor_markets (
        address TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        title_folded TEXT NOT NULL DEFAULT '',
        description_folded TEXT NOT NULL DEFAULT '',
        program_type TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS labor_market_projects (
        labor_market_address TEXT NOT NULL,
        project_slug TEXT NOT NULL,
        PRIMARY KEY (labor_market_address, project_slug)
    )",
    "CREATE TABLE IF NOT EXISTS labor_market_tokens (
        labor_market_address TEXT NOT NULL,
        token_symbol TEXT NOT NULL,
        PRIMARY KEY (labor_market_address, token_symbol)
    )",
    "CREATE TABLE IF NOT EXISTS labor_market_capabilities (
        labor_market_address TEXT NOT NULL,
        capability TEXT NOT NULL,
        PRIMARY KEY (labor_market_address, capability)
    )",
    "CREATE TABLE IF NOT EXISTS service_requests (
        id TEXT PRIMARY KEY,
        labor_market_address TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        title_folded TEXT NOT NULL DEFAULT '',
        description_folded TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL,
        sponsor TEXT NOT NULL,
        starts_at INTEGER,
        ends_at INTEGER,
        created_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_service_requests_market ON service_requests (labor_market_address)",
    "CREATE TABLE IF NOT EXISTS submissions (
        id TEXT PRIMARY KEY,
        service_request_id TEXT NOT NULL,
        author TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        title_folded TEXT NOT NULL DEFAULT '',
        description_folded TEXT NOT NULL DEFAULT '',
        created_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_submissions_request ON submissions (service_request_id)",
    "CREATE TABLE IF NOT EXISTS reviews (
        id TEXT PRIMARY KEY,
        submission_id TEXT NOT NULL,
        reviewer TEXT NOT NULL,
        reviewer_folded TEXT NOT NULL DEFAULT '',
        score INTEGER NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_reviews_submission ON reviews (submission_id)",
    "CREATE TABLE IF NOT EXISTS projects (
        slug TEXT PRIMARY KEY,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tokens (
        symbol TEXT PRIMARY KEY,
        name TEXT NOT NULL
    )",
];

const MYSQL_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS labor_markets (
        address VARCHAR(64) PRIMARY KEY,
        title VARCHAR(255) NOT NULL,
        description TEXT NOT NULL,
        title_folded TEXT NOT NULL,
        description_folded TEXT NOT NULL,
        program_type VARCHAR(32) NOT NULL,
        created_at BIGINT NOT NULL,
        INDEX idx_title (title),
        INDEX idx_created_at (created_at)
    ) DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_bin",
    "CREATE TABLE IF NOT EXISTS labor_market_projects (
        labor_market_address VARCHAR(64) NOT NULL,
        project_slug VARCHAR(64) NOT NULL,
        PRIMARY KEY (labor_market_address, project_slug),
        INDEX idx_project (project_slug)
    ) DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_bin",
    "CREATE TABLE IF NOT EXISTS labor_market_tokens (
        labor_market_address VARCHAR(64) NOT NULL,
        token_symbol VARCHAR(32) NOT NULL,
        PRIMARY KEY (labor_market_address, token_symbol),
        INDEX idx_token (token_symbol)
    ) DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_bin",
    "CREATE TABLE IF NOT EXISTS labor_market_capabilities (
        labor_market_address VARCHAR(64) NOT NULL,
        capability VARCHAR(32) NOT NULL,
        PRIMARY KEY (labor_market_address, capability)
    ) DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_bin",
    "CREATE TABLE IF NOT EXISTS service_requests (
        id VARCHAR(64) PRIMARY KEY,
        labor_market_address VARCHAR(64) NOT NULL,
        title VARCHAR(255) NOT NULL,
        description TEXT NOT NULL,
        title_folded TEXT NOT NULL,
        description_folded TEXT NOT NULL,
        status VARCHAR(16) NOT NULL,
        sponsor VARCHAR(64) NOT NULL,
        starts_at BIGINT NULL,
        ends_at BIGINT NULL,
        created_at BIGINT NOT NULL,
        INDEX idx_market (labor_market_address),
        INDEX idx_status (status)
    ) DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_bin",
    "CREATE TABLE IF NOT EXISTS submissions (
        id VARCHAR(64) PRIMARY KEY,
        service_request_id VARCHAR(64) NOT NULL,
        author VARCHAR(64) NOT NULL,
        title VARCHAR(255) NOT NULL,
        description TEXT NOT NULL,
        title_folded TEXT NOT NULL,
        description_folded TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        INDEX idx_request (service_request_id)
    ) DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_bin",
    "CREATE TABLE IF NOT EXISTS reviews (
        id VARCHAR(64) PRIMARY KEY,
        submission_id VARCHAR(64) NOT NULL,
        reviewer VARCHAR(64) NOT NULL,
        reviewer_folded VARCHAR(255) NOT NULL,
        score TINYINT NOT NULL,
        created_at BIGINT NOT NULL,
        INDEX idx_submission (submission_id)
    ) DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_bin",
    "CREATE TABLE IF NOT EXISTS projects (
        slug VARCHAR(64) PRIMARY KEY,
        name VARCHAR(255) NOT NULL
    ) DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_bin",
    "CREATE TABLE IF NOT EXISTS tokens (
        symbol VARCHAR(32) PRIMARY KEY,
        name VARCHAR(255) NOT NULL
    ) DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_bin",
];
