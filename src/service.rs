// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search service: validated request in, one page plus total count out.
//!
//! The service is stateless apart from the optional result cache. The store
//! is passed in on every call; its lifecycle belongs to the caller.
//!
//! ```text
//! RawSearchParams ─validate─→ SearchRequest<E> ─criteria()─┬─→ store.find_many(window)
//!                                                           └─→ store.count
//!                                                                  │ try_join
//!                                                                  ▼
//!                                                           SearchResult<E>
//! ```

use std::marker::PhantomData;

use tracing::{debug, warn};

use crate::config::SearchServiceConfig;
use crate::error::SearchError;
use crate::metrics::{self, LatencyTimer};
use crate::search::{
    RawSearchParams, SearchCache, SearchCacheStats, SearchEntity, SearchRequest, SearchResult,
    DEFAULT_PAGE_SIZE,
};
use crate::storage::traits::RecordStore;

pub struct SearchService<E: SearchEntity> {
    cache: Option<SearchCache<SearchRequest<E>, SearchResult<E>>>,
    default_page_size: u32,
    _entity: PhantomData<fn() -> E>,
}

impl<E: SearchEntity> Default for SearchService<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: SearchEntity> SearchService<E> {
    /// No cache; every call reaches the store.
    pub fn new() -> Self {
        Self {
            cache: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            _entity: PhantomData,
        }
    }

    pub fn with_cache(mut self, cache: SearchCache<SearchRequest<E>, SearchResult<E>>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn from_config(config: &SearchServiceConfig) -> Self {
        let mut service = Self::new();
        service.default_page_size = config.default_page_size;
        if config.cache_enabled() {
            service = service.with_cache(SearchCache::new(config.cache_max_entries, config.cache_ttl()));
        }
        service
    }

    /// One page of matches plus the total count.
    ///
    /// A page past the end is not an error: it comes back empty with the
    /// true `total_count` and `total_pages`.
    pub async fn search<S>(
        &self,
        store: &S,
        request: &SearchRequest<E>,
    ) -> Result<SearchResult<E>, SearchError>
    where
        S: RecordStore<E> + ?Sized,
    {
        let entity = E::KIND.as_str();

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(E::KIND, request) {
                metrics::record_cache(entity, true);
                metrics::record_query(entity, "search", "success");
                return Ok(hit);
            }
            metrics::record_cache(entity, false);
        }

        let criteria = request.criteria();
        let sort = request.sort_spec();
        let page = request.page();
        debug!(
            entity,
            page = page.page(),
            page_size = page.page_size(),
            sort = sort.field,
            order = sort.order.as_str(),
            "search"
        );

        let outcome = {
            let _timer = LatencyTimer::new(entity, "search");
            tokio::try_join!(
                store.find_many(&criteria, &sort, page.window()),
                store.count(&criteria)
            )
        };

        let (items, total_count) = match outcome {
            Ok(found) => found,
            Err(e) => {
                warn!(entity, error = %e, "search failed");
                metrics::record_query(entity, "search", "error");
                return Err(e.into());
            }
        };

        let result = SearchResult::new(items, total_count, page);
        metrics::record_query(entity, "search", "success");
        metrics::record_results(entity, result.items.len(), total_count);

        if let Some(cache) = &self.cache {
            cache.insert(E::KIND, request, result.clone());
        }
        Ok(result)
    }

    /// Number of matches, ignoring sort and page.
    pub async fn count<S>(&self, store: &S, request: &SearchRequest<E>) -> Result<u64, SearchError>
    where
        S: RecordStore<E> + ?Sized,
    {
        let entity = E::KIND.as_str();
        let criteria = request.criteria();

        let outcome = {
            let _timer = LatencyTimer::new(entity, "count");
            store.count(&criteria).await
        };

        match outcome {
            Ok(n) => {
                metrics::record_query(entity, "count", "success");
                Ok(n)
            }
            Err(e) => {
                warn!(entity, error = %e, "count failed");
                metrics::record_query(entity, "count", "error");
                Err(e.into())
            }
        }
    }

    /// One record by natural key.
    pub async fn find<S>(&self, store: &S, key: &str) -> Result<E, SearchError>
    where
        S: RecordStore<E> + ?Sized,
    {
        let entity = E::KIND.as_str();
        let outcome = {
            let _timer = LatencyTimer::new(entity, "find");
            store.find(key).await
        };

        let err = match outcome {
            Ok(Some(found)) => {
                metrics::record_query(entity, "find", "success");
                return Ok(found);
            }
            Ok(None) => SearchError::NotFound {
                entity: E::KIND,
                key: key.to_string(),
            },
            Err(e) => {
                warn!(entity, key, error = %e, "find failed");
                SearchError::Infrastructure(e)
            }
        };
        metrics::record_query(entity, "find", err.status_label());
        Err(err)
    }

    /// Validate query-string parameters, then search.
    ///
    /// Nothing reaches the store when validation fails.
    pub async fn search_params<S>(
        &self,
        store: &S,
        params: &RawSearchParams,
    ) -> Result<SearchResult<E>, SearchError>
    where
        S: RecordStore<E> + ?Sized,
    {
        let request = self.validate(params).map_err(|e| {
            metrics::record_query(E::KIND.as_str(), "search", e.status_label());
            e
        })?;
        self.search(store, &request).await
    }

    /// Validate with this service's default page size.
    pub fn validate(&self, params: &RawSearchParams) -> Result<SearchRequest<E>, SearchError> {
        if params.get("first").is_none()
            && params.get("pageSize").is_none()
            && self.default_page_size != DEFAULT_PAGE_SIZE
        {
            let mut params = params.clone();
            params.set("pageSize", self.default_page_size.to_string());
            return Ok(params.validate::<E>()?);
        }
        Ok(params.validate::<E>()?)
    }

    pub fn cache_stats(&self) -> Option<SearchCacheStats> {
        self.cache.as_ref().map(|c| {
            let stats = c.stats();
            metrics::set_cache_stats(stats.entry_count, stats.hit_rate);
            stats
        })
    }

    /// Drop cached pages. Write paths call this after changing records.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }
}
