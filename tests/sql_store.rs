// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search against an in-memory SQLite store.
//!
//! Every test gets its own `sqlite::memory:` database, so they run in parallel
//! without sharing state.
//!
//! Run with: `cargo test --test sql_store`

use labor_market_search::model::{
    Capability, Challenge, ChallengeStatus, Marketplace, ProgramType, Review, ReviewScore,
    Submission,
};
use labor_market_search::{
    Fixtures, InMemoryStore, RawSearchParams, SearchError, SearchResult, SearchService, SeedPlan,
    SqlEntity, SqlStore,
};

// =============================================================================
// Fixtures
// =============================================================================

fn market(address: &str, title: &str, projects: &[&str]) -> Marketplace {
    Marketplace {
        address: address.to_string(),
        title: title.to_string(),
        description: String::new(),
        program_type: ProgramType::Brainstorm,
        projects: projects.iter().map(|p| p.to_string()).collect(),
        reward_tokens: vec![],
        capabilities: vec![],
        created_at: 0,
        service_request_count: 0,
    }
}

fn challenge(id: &str, marketplace: &str, starts_at: Option<i64>) -> Challenge {
    Challenge {
        id: id.to_string(),
        marketplace_address: marketplace.to_string(),
        title: format!("Challenge {}", id),
        description: String::new(),
        status: ChallengeStatus::Active,
        sponsor: "0xsponsor".to_string(),
        starts_at,
        ends_at: None,
        created_at: 0,
    }
}

fn submission(id: &str, challenge_id: &str) -> Submission {
    Submission {
        id: id.to_string(),
        challenge_id: challenge_id.to_string(),
        author: "0xauthor".to_string(),
        title: format!("Submission {}", id),
        description: String::new(),
        created_at: 0,
        review_count: 0,
    }
}

fn review(id: &str, submission_id: &str, score: ReviewScore) -> Review {
    Review {
        id: id.to_string(),
        submission_id: submission_id.to_string(),
        reviewer: format!("0xreviewer{}", id),
        score,
        created_at: 0,
    }
}

async fn store_with(markets: &[Marketplace]) -> SqlStore {
    let store = SqlStore::new("sqlite::memory:").await.unwrap();
    for m in markets {
        store.upsert_marketplace(m).await.unwrap();
    }
    store
}

async fn search<E: SqlEntity>(store: &SqlStore, query: &str) -> Result<SearchResult<E>, SearchError> {
    SearchService::<E>::new()
        .search_params(store, &RawSearchParams::from_query(query))
        .await
}

fn addresses(rows: &[Marketplace]) -> Vec<&str> {
    rows.iter().map(|m| m.address.as_str()).collect()
}

// =============================================================================
// Marketplaces
// =============================================================================

#[tokio::test]
async fn test_project_filter_and_count_agree() {
    let store = store_with(&[
        market("0x1", "Alpha", &["solana"]),
        market("0x2", "Beta", &["near"]),
        market("0x3", "Gamma", &["solana", "near"]),
    ])
    .await;

    // Default order is title descending
    let page = search::<Marketplace>(&store, "project=solana").await.unwrap();
    assert_eq!(page.total_count, 2);
    assert_eq!(addresses(&page.items), vec!["0x3", "0x1"]);

    let request = RawSearchParams::from_query("project=solana")
        .validate::<Marketplace>()
        .unwrap();
    let counted = SearchService::<Marketplace>::new().count(&store, &request).await.unwrap();
    assert_eq!(counted, 2);
}

#[tokio::test]
async fn test_page_size_bounds_are_enforced() {
    let store = store_with(&[market("0x1", "Alpha", &[])]).await;

    let err = search::<Marketplace>(&store, "first=101").await.unwrap_err();
    assert_eq!(err.status_code(), 400);

    let page = search::<Marketplace>(&store, "first=100").await.unwrap();
    assert_eq!(page.page_size, 100);
    assert_eq!(page.total_count, 1);
}

#[tokio::test]
async fn test_title_ties_break_by_address_ascending() {
    let store = store_with(&[
        market("0x1", "Same", &[]),
        market("0x2", "Apex", &[]),
        market("0x3", "Same", &[]),
    ])
    .await;

    let asc = search::<Marketplace>(&store, "sortBy=title&order=asc").await.unwrap();
    assert_eq!(addresses(&asc.items), vec!["0x2", "0x1", "0x3"]);

    let desc = search::<Marketplace>(&store, "sortBy=title&order=desc").await.unwrap();
    assert_eq!(addresses(&desc.items), vec!["0x1", "0x3", "0x2"]);
}

#[tokio::test]
async fn test_page_past_the_end_keeps_totals() {
    let store = store_with(&[
        market("0x1", "A", &[]),
        market("0x2", "B", &[]),
        market("0x3", "C", &[]),
    ])
    .await;

    let page = search::<Marketplace>(&store, "page=5&first=2").await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_count, 3);
    assert_eq!(page.total_pages, 2);
    assert!(!page.has_next_page());
}

#[tokio::test]
async fn test_free_text_is_case_insensitive() {
    let mut described = market("0x2", "Other", &[]);
    described.description = "Weekly SOLANA dashboards".to_string();
    let store = store_with(&[market("0x1", "Solana Summer", &[]), described, market("0x3", "Near", &[])]).await;

    let page = search::<Marketplace>(&store, "q=solana").await.unwrap();
    assert_eq!(addresses(&page.items), vec!["0x1", "0x2"]);
    assert_eq!(page.total_count, 2);
}

#[tokio::test]
async fn test_free_text_wildcards_match_literally() {
    let store = store_with(&[
        market("0x1", "Top 50% payout", &[]),
        market("0x2", "Top 500 payout", &[]),
        market("0x3", "snake_case", &[]),
        market("0x4", "snakeXcase", &[]),
    ])
    .await;

    let pct = search::<Marketplace>(&store, "q=50%25").await.unwrap();
    assert_eq!(addresses(&pct.items), vec!["0x1"]);

    let underscore = search::<Marketplace>(&store, "q=e_c").await.unwrap();
    assert_eq!(addresses(&underscore.items), vec!["0x3"]);
}

#[tokio::test]
async fn test_free_text_folds_non_ascii_like_memory_store() {
    let rows = [
        market("0x1", "Émile Dashboards", &[]),
        market("0x2", "ÜBER DAO", &[]),
        market("0x3", "über dao weekly", &[]),
        market("0x4", "Emile Dashboards", &[]),
    ];
    let sql = store_with(&rows).await;
    let memory = InMemoryStore::new();
    for m in &rows {
        memory.upsert_marketplace(m.clone());
    }
    let service = SearchService::<Marketplace>::new();

    for (query, expected) in [
        ("q=%C3%89mile", vec!["0x1"]),
        ("q=%C3%A9MILE", vec!["0x1"]),
        ("q=%C3%BCber&sortBy=title&order=asc", vec!["0x2", "0x3"]),
        ("q=%C3%9CBER%20DAO&sortBy=title&order=asc", vec!["0x2", "0x3"]),
    ] {
        let params = RawSearchParams::from_query(query);
        let from_sql = service.search_params(&sql, &params).await.unwrap();
        let from_memory = service.search_params(&memory, &params).await.unwrap();

        assert_eq!(addresses(&from_sql.items), expected, "sql for `{}`", query);
        assert_eq!(from_sql, from_memory, "stores disagree for `{}`", query);
    }
}

#[tokio::test]
async fn test_review_free_text_folds_reviewer() {
    let store = store_with(&[market("0x1", "A", &[])]).await;
    store.upsert_challenge(&challenge("c1", "0x1", None)).await.unwrap();
    store.upsert_submission(&submission("s1", "c1")).await.unwrap();
    let mut named = review("r1", "s1", ReviewScore::Good);
    named.reviewer = "Ørsted.eth".to_string();
    store.upsert_review(&named).await.unwrap();
    store.upsert_review(&review("r2", "s1", ReviewScore::Bad)).await.unwrap();

    let page = search::<Review>(&store, "q=%C3%B8RSTED").await.unwrap();
    let ids: Vec<&str> = page.items.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1"]);
}

#[tokio::test]
async fn test_filters_and_title_order_compare_bytes() {
    let rows = [
        market("0x1", "alpha", &["solana"]),
        market("0x2", "Beta", &["SOLANA"]),
        market("0x3", "Alpha", &["near"]),
        market("0x4", "Émile", &[]),
    ];
    let sql = store_with(&rows).await;
    let memory = InMemoryStore::new();
    for m in &rows {
        memory.upsert_marketplace(m.clone());
    }
    let service = SearchService::<Marketplace>::new();

    for (query, expected) in [
        ("project=solana", vec!["0x1"]),
        ("project=SOLANA", vec!["0x2"]),
        ("project=Near", vec![]),
        // Uppercase sorts before lowercase, non-ASCII after both
        ("sortBy=title&order=asc", vec!["0x3", "0x2", "0x1", "0x4"]),
    ] {
        let params = RawSearchParams::from_query(query);
        let from_sql = service.search_params(&sql, &params).await.unwrap();
        let from_memory = service.search_params(&memory, &params).await.unwrap();

        assert_eq!(addresses(&from_sql.items), expected, "sql for `{}`", query);
        assert_eq!(from_sql, from_memory, "stores disagree for `{}`", query);
    }
}

#[tokio::test]
async fn test_sort_by_service_request_count() {
    let store = store_with(&[
        market("0x1", "A", &[]),
        market("0x2", "B", &[]),
        market("0x3", "C", &[]),
    ])
    .await;
    store.upsert_challenge(&challenge("c1", "0x2", None)).await.unwrap();
    store.upsert_challenge(&challenge("c2", "0x2", None)).await.unwrap();
    store.upsert_challenge(&challenge("c3", "0x3", None)).await.unwrap();

    let page = search::<Marketplace>(&store, "sortBy=serviceRequests&order=desc").await.unwrap();
    assert_eq!(addresses(&page.items), vec!["0x2", "0x3", "0x1"]);
    let counts: Vec<u64> = page.items.iter().map(|m| m.service_request_count).collect();
    assert_eq!(counts, vec![2, 1, 0]);
}

#[tokio::test]
async fn test_capability_filter() {
    let mut open = market("0x1", "Open", &[]);
    open.capabilities = vec![Capability::Submit, Capability::Review];
    let mut closed = market("0x2", "Closed", &[]);
    closed.capabilities = vec![Capability::Launch];
    let store = store_with(&[open, closed]).await;

    let page = search::<Marketplace>(&store, "filter=review").await.unwrap();
    assert_eq!(addresses(&page.items), vec!["0x1"]);

    let err = search::<Marketplace>(&store, "filter=delete").await.unwrap_err();
    assert!(matches!(err, SearchError::Validation(ref v) if v.mentions("filter")));
}

#[tokio::test]
async fn test_unknown_sort_field_is_rejected() {
    let store = store_with(&[]).await;
    let err = search::<Marketplace>(&store, "sortBy=address").await.unwrap_err();
    assert!(matches!(err, SearchError::Validation(ref v) if v.mentions("sortBy")));
}

// =============================================================================
// Challenges, submissions, reviews
// =============================================================================

#[tokio::test]
async fn test_missing_start_sorts_first_ascending() {
    let store = store_with(&[market("0x1", "A", &[])]).await;
    store.upsert_challenge(&challenge("c1", "0x1", Some(200))).await.unwrap();
    store.upsert_challenge(&challenge("c2", "0x1", None)).await.unwrap();
    store.upsert_challenge(&challenge("c3", "0x1", Some(100))).await.unwrap();

    let page = search::<Challenge>(&store, "sortBy=startsAt&order=asc").await.unwrap();
    let ids: Vec<&str> = page.items.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c2", "c3", "c1"]);
}

#[tokio::test]
async fn test_challenge_filter_by_marketplace_and_status() {
    let store = store_with(&[market("0x1", "A", &[]), market("0x2", "B", &[])]).await;
    let mut pending = challenge("c1", "0x1", None);
    pending.status = ChallengeStatus::Pending;
    store.upsert_challenge(&pending).await.unwrap();
    store.upsert_challenge(&challenge("c2", "0x1", None)).await.unwrap();
    store.upsert_challenge(&challenge("c3", "0x2", None)).await.unwrap();

    let page = search::<Challenge>(&store, "marketplace=0x1&status=active").await.unwrap();
    let ids: Vec<&str> = page.items.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c2"]);
}

#[tokio::test]
async fn test_submission_filter_and_review_count() {
    let store = store_with(&[market("0x1", "A", &[])]).await;
    store.upsert_challenge(&challenge("c1", "0x1", None)).await.unwrap();
    store.upsert_challenge(&challenge("c2", "0x1", None)).await.unwrap();
    store.upsert_submission(&submission("s1", "c1")).await.unwrap();
    store.upsert_submission(&submission("s2", "c1")).await.unwrap();
    store.upsert_submission(&submission("s3", "c2")).await.unwrap();
    store.upsert_review(&review("r1", "s2", ReviewScore::Good)).await.unwrap();
    store.upsert_review(&review("r2", "s2", ReviewScore::Spam)).await.unwrap();

    let page = search::<Submission>(&store, "challenge=c1&sortBy=reviews&order=desc").await.unwrap();
    let ids: Vec<&str> = page.items.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s2", "s1"]);
    assert_eq!(page.items[0].review_count, 2);
}

#[tokio::test]
async fn test_review_score_filter_and_sort() {
    let store = store_with(&[market("0x1", "A", &[])]).await;
    store.upsert_challenge(&challenge("c1", "0x1", None)).await.unwrap();
    store.upsert_submission(&submission("s1", "c1")).await.unwrap();
    store.upsert_review(&review("r1", "s1", ReviewScore::Great)).await.unwrap();
    store.upsert_review(&review("r2", "s1", ReviewScore::Bad)).await.unwrap();
    store.upsert_review(&review("r3", "s1", ReviewScore::Great)).await.unwrap();

    let great = search::<Review>(&store, "score=Great").await.unwrap();
    assert_eq!(great.total_count, 2);
    assert!(great.items.iter().all(|r| r.score == ReviewScore::Great));

    let by_score = search::<Review>(&store, "submission=s1&sortBy=score&order=asc").await.unwrap();
    let ids: Vec<&str> = by_score.items.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r2", "r1", "r3"]);
}

#[tokio::test]
async fn test_find_missing_submission_is_not_found() {
    let store = store_with(&[]).await;
    let err = SearchService::<Submission>::new().find(&store, "nope").await.unwrap_err();
    assert!(matches!(err, SearchError::NotFound { .. }));
    assert_eq!(err.status_code(), 404);
}

// =============================================================================
// Parity with the in-memory store
// =============================================================================

const PARITY_QUERIES: &[&str] = &[
    "",
    "sortBy=title&order=asc&first=7",
    "sortBy=serviceRequests&order=desc&page=2&first=5",
    "sortBy=createdAt&project=solana",
    "q=dao&token=USDC&first=50",
    "type=analyze&filter=submit&sortBy=title&order=desc",
];

#[tokio::test]
async fn test_sql_and_memory_stores_agree_on_seeded_data() {
    let plan = SeedPlan {
        seed: 7,
        marketplaces: 30,
        challenges_per_marketplace: 2,
        submissions_per_challenge: 2,
        max_reviews_per_submission: 3,
    };
    let fixtures = Fixtures::generate(&plan);

    let sql = SqlStore::new("sqlite::memory:").await.unwrap();
    fixtures.load_sql(&sql).await.unwrap();
    let memory = InMemoryStore::new();
    fixtures.load_memory(&memory);

    let service = SearchService::<Marketplace>::new();
    for query in PARITY_QUERIES {
        let params = RawSearchParams::from_query(query);
        let from_sql = service.search_params(&sql, &params).await.unwrap();
        let from_memory = service.search_params(&memory, &params).await.unwrap();

        assert_eq!(from_sql.total_count, from_memory.total_count, "total for `{}`", query);
        assert_eq!(addresses(&from_sql.items), addresses(&from_memory.items), "page for `{}`", query);
    }

    let reviews = SearchService::<Review>::new();
    for query in ["sortBy=score&order=desc&first=20", "score=5", "score=Spam&sortBy=createdAt"] {
        let params = RawSearchParams::from_query(query);
        let from_sql = reviews.search_params(&sql, &params).await.unwrap();
        let from_memory = reviews.search_params(&memory, &params).await.unwrap();
        assert_eq!(from_sql, from_memory, "reviews for `{}`", query);
    }

    sql.close().await;
}
