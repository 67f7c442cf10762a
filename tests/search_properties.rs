// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Property-based tests for search, count and pagination.
//!
//! Uses proptest to generate random marketplaces and requests and checks the
//! invariants every store must hold, against the in-memory store.
//!
//! Run with: `cargo test --test search_properties`

use std::collections::HashSet;
use std::future::Future;

use proptest::prelude::*;

use labor_market_search::model::{Marketplace, ProgramType};
use labor_market_search::search::{
    FilterValue, MarketplaceFilter, MarketplaceSort, PageRequest, SortField, SortOrder, Window,
    MAX_PAGE_SIZE,
};
use labor_market_search::{InMemoryStore, RawSearchParams, RecordStore, SearchRequest, SearchService};

const SLUGS: &[&str] = &["solana", "near", "flow", "axelar"];
const TITLES: &[&str] = &["Alpha", "Beta", "Solana Summer", "Gamma Analytics", "beta"];
const NEEDLES: &[&str] = &["sol", "an", "BETA", "zzz"];

fn block_on<F: Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(f)
}

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Marketplaces with few distinct titles and timestamps, so ties are common
fn marketplaces_strategy() -> impl Strategy<Value = Vec<Marketplace>> {
    prop::collection::vec(
        (
            prop::sample::select(TITLES.to_vec()),
            prop::sample::subsequence(SLUGS.to_vec(), 0..=2),
            0i64..4,
            any::<bool>(),
        ),
        0..40,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (title, projects, created_at, analyze))| Marketplace {
                address: format!("0x{:04}", i),
                title: title.to_string(),
                description: String::new(),
                program_type: if analyze { ProgramType::Analyze } else { ProgramType::Brainstorm },
                projects: projects.into_iter().map(String::from).collect(),
                reward_tokens: vec![],
                capabilities: vec![],
                created_at,
                service_request_count: 0,
            })
            .collect()
    })
}

fn request_strategy() -> impl Strategy<Value = SearchRequest<Marketplace>> {
    (
        prop::option::of(prop::sample::select(NEEDLES.to_vec())),
        prop::sample::select(MarketplaceSort::ALL.to_vec()),
        any::<bool>(),
        prop::sample::subsequence(SLUGS.to_vec(), 0..=2),
        1u32..=10,
    )
        .prop_map(|(needle, sort, asc, projects, page_size)| {
            let order = if asc { SortOrder::Asc } else { SortOrder::Desc };
            let mut request = SearchRequest::new()
                .sorted_by(sort, order)
                .with_filter(MarketplaceFilter::Project, projects)
                .with_page(PageRequest::new(1, page_size).unwrap());
            if let Some(needle) = needle {
                request = request.with_query(needle);
            }
            request
        })
}

fn load(rows: &[Marketplace]) -> InMemoryStore {
    let store = InMemoryStore::new();
    for m in rows {
        store.upsert_marketplace(m.clone());
    }
    store
}

fn keys(rows: &[Marketplace]) -> Vec<String> {
    rows.iter().map(|m| m.address.clone()).collect()
}

// =============================================================================
// Count and pagination
// =============================================================================

proptest! {
    /// total_count equals count() equals the length of the unpaginated match list
    #[test]
    fn prop_count_matches_unpaginated(rows in marketplaces_strategy(), request in request_strategy()) {
        let store = load(&rows);
        let service = SearchService::<Marketplace>::new();

        let (result, counted, all) = block_on(async {
            let result = service.search(&store, &request).await.unwrap();
            let counted = service.count(&store, &request).await.unwrap();
            let all = RecordStore::<Marketplace>::find_many(
                &store,
                &request.criteria(), &request.sort_spec(), Window::UNBOUNDED)
                .await
                .unwrap();
            (result, counted, all)
        });

        prop_assert_eq!(result.total_count, counted);
        prop_assert_eq!(counted, all.len() as u64);
        prop_assert!(result.items.len() <= request.page().page_size() as usize);
    }

    /// Walking every page yields the full ordered list exactly once
    #[test]
    fn prop_pages_concatenate_to_full_list(rows in marketplaces_strategy(), request in request_strategy()) {
        let store = load(&rows);
        let service = SearchService::<Marketplace>::new();
        let page_size = request.page().page_size();

        let (pages, all) = block_on(async {
            let first = service.search(&store, &request).await.unwrap();
            let mut pages = Vec::new();
            for n in 1..=first.total_pages.max(1) {
                let page = request.clone().with_page(PageRequest::new(n as u32, page_size).unwrap());
                pages.extend(service.search(&store, &page).await.unwrap().items);
            }
            let all = RecordStore::<Marketplace>::find_many(
                &store,
                &request.criteria(), &request.sort_spec(), Window::UNBOUNDED)
                .await
                .unwrap();
            (pages, all)
        });

        let walked = keys(&pages);
        let unique: HashSet<&String> = walked.iter().collect();
        prop_assert_eq!(unique.len(), walked.len());
        prop_assert_eq!(walked, keys(&all));
    }

    /// Same request, same store, same page
    #[test]
    fn prop_search_is_idempotent(rows in marketplaces_strategy(), request in request_strategy()) {
        let store = load(&rows);
        let service = SearchService::<Marketplace>::new();

        let (a, b) = block_on(async {
            (
                service.search(&store, &request).await.unwrap(),
                service.search(&store, &request).await.unwrap(),
            )
        });
        prop_assert_eq!(a, b);
    }

    /// A page past the last is empty but still reports the true totals
    #[test]
    fn prop_out_of_range_page_is_empty(rows in marketplaces_strategy(), request in request_strategy(), extra in 1u32..5) {
        let store = load(&rows);
        let service = SearchService::<Marketplace>::new();
        let page_size = request.page().page_size();

        let (first, beyond) = block_on(async {
            let first = service.search(&store, &request).await.unwrap();
            let past = u32::try_from(first.total_pages).unwrap() + extra;
            let beyond = request.clone().with_page(PageRequest::new(past, page_size).unwrap());
            (first, service.search(&store, &beyond).await.unwrap())
        });

        prop_assert!(beyond.items.is_empty());
        prop_assert_eq!(beyond.total_count, first.total_count);
        prop_assert_eq!(beyond.total_pages, first.total_pages);
    }
}

// =============================================================================
// Filters and ordering
// =============================================================================

proptest! {
    /// An empty value set for a key is the same as not filtering on it
    #[test]
    fn prop_empty_filter_is_absent(rows in marketplaces_strategy(), request in request_strategy()) {
        let store = load(&rows);
        let service = SearchService::<Marketplace>::new();
        let with_empty = request.clone().with_filter(MarketplaceFilter::Token, Vec::<FilterValue>::new());

        let (a, b) = block_on(async {
            (
                service.search(&store, &request).await.unwrap(),
                service.search(&store, &with_empty).await.unwrap(),
            )
        });
        prop_assert_eq!(a, b);
    }

    /// Every returned item satisfies the filter and the free-text query
    #[test]
    fn prop_items_match_criteria(rows in marketplaces_strategy(), request in request_strategy()) {
        let store = load(&rows);
        let service = SearchService::<Marketplace>::new();
        let result = block_on(service.search(&store, &request)).unwrap();

        let wanted = request.filter_values(MarketplaceFilter::Project);
        for m in &result.items {
            if let Some(wanted) = wanted {
                prop_assert!(m.projects.iter().any(|p| wanted.contains(&FilterValue::text(p.as_str()))));
            }
            if let Some(needle) = request.query() {
                let needle = needle.to_lowercase();
                prop_assert!(
                    m.title.to_lowercase().contains(&needle) || m.description.to_lowercase().contains(&needle)
                );
            }
        }
    }

    /// Title ties always fall back to address ascending, in both directions
    #[test]
    fn prop_ties_break_by_key_ascending(rows in marketplaces_strategy(), asc in any::<bool>()) {
        let store = load(&rows);
        let service = SearchService::<Marketplace>::new();
        let order = if asc { SortOrder::Asc } else { SortOrder::Desc };
        let request = SearchRequest::new()
            .sorted_by(MarketplaceSort::Title, order)
            .with_page(PageRequest::new(1, MAX_PAGE_SIZE).unwrap());

        let result = block_on(service.search(&store, &request)).unwrap();
        for pair in result.items.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.title == b.title {
                prop_assert!(a.address < b.address);
            } else if asc {
                prop_assert!(a.title < b.title);
            } else {
                prop_assert!(a.title > b.title);
            }
        }
    }

    /// Page sizes outside 1..=100 never validate
    #[test]
    fn prop_page_size_bounds(size in 0u32..1000) {
        let query = format!("first={}", size);
        let result = RawSearchParams::from_query(&query).validate::<Marketplace>();
        prop_assert_eq!(result.is_ok(), (1..=MAX_PAGE_SIZE).contains(&size));
    }

    /// Arbitrary query strings never panic validation
    #[test]
    fn prop_validation_never_panics(query in ".{0,200}") {
        let _ = RawSearchParams::from_query(&query).validate::<Marketplace>();
    }
}
