// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory record store.
//!
//! Holds every entity in its own `DashMap`, keyed by natural key. Reads take
//! a snapshot, fill in derived counts, then evaluate the Query AST with
//! [`memory_matcher`](crate::search::memory_matcher).

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use super::traits::{RecordStore, StorageError};
use crate::model::{Challenge, Marketplace, Review, Submission};
use crate::search::memory_matcher::{self, Document, SortValue};
use crate::search::{fields, FilterValue, Query, SortSpec, Window};

#[derive(Default)]
pub struct InMemoryStore {
    marketplaces: DashMap<String, Marketplace>,
    challenges: DashMap<String, Challenge>,
    submissions: DashMap<String, Submission>,
    reviews: DashMap<String, Review>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by address.
    pub fn upsert_marketplace(&self, marketplace: Marketplace) {
        self.marketplaces.insert(marketplace.address.clone(), marketplace);
    }

    /// Insert or replace by id.
    pub fn upsert_challenge(&self, challenge: Challenge) {
        self.challenges.insert(challenge.id.clone(), challenge);
    }

    /// Insert or replace by id.
    pub fn upsert_submission(&self, submission: Submission) {
        self.submissions.insert(submission.id.clone(), submission);
    }

    /// Insert or replace by id.
    pub fn upsert_review(&self, review: Review) {
        self.reviews.insert(review.id.clone(), review);
    }

    /// Total records across all entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.marketplaces.len() + self.challenges.len() + self.submissions.len() + self.reviews.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.marketplaces.clear();
        self.challenges.clear();
        self.submissions.clear();
        self.reviews.clear();
    }

    fn marketplace_snapshot(&self) -> Vec<Marketplace> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for c in self.challenges.iter() {
            *counts.entry(c.marketplace_address.clone()).or_default() += 1;
        }
        self.marketplaces
            .iter()
            .map(|r| {
                let mut m = r.value().clone();
                m.service_request_count = counts.get(&m.address).copied().unwrap_or(0);
                m
            })
            .collect()
    }

    fn submission_snapshot(&self) -> Vec<Submission> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for r in self.reviews.iter() {
            *counts.entry(r.submission_id.clone()).or_default() += 1;
        }
        self.submissions
            .iter()
            .map(|r| {
                let mut s = r.value().clone();
                s.review_count = counts.get(&s.id).copied().unwrap_or(0);
                s
            })
            .collect()
    }

    fn challenge_snapshot(&self) -> Vec<Challenge> {
        self.challenges.iter().map(|r| r.value().clone()).collect()
    }

    fn review_snapshot(&self) -> Vec<Review> {
        self.reviews.iter().map(|r| r.value().clone()).collect()
    }
}

#[async_trait]
impl RecordStore<Marketplace> for InMemoryStore {
    async fn find_many(
        &self,
        criteria: &Query,
        sort: &SortSpec,
        window: Window,
    ) -> Result<Vec<Marketplace>, StorageError> {
        Ok(memory_matcher::select(self.marketplace_snapshot(), criteria, sort, window))
    }

    async fn count(&self, criteria: &Query) -> Result<u64, StorageError> {
        Ok(memory_matcher::count(self.marketplace_snapshot(), criteria))
    }

    async fn find(&self, key: &str) -> Result<Option<Marketplace>, StorageError> {
        Ok(self
            .marketplace_snapshot()
            .into_iter()
            .find(|m| m.address == key))
    }
}

#[async_trait]
impl RecordStore<Challenge> for InMemoryStore {
    async fn find_many(
        &self,
        criteria: &Query,
        sort: &SortSpec,
        window: Window,
    ) -> Result<Vec<Challenge>, StorageError> {
        Ok(memory_matcher::select(self.challenge_snapshot(), criteria, sort, window))
    }

    async fn count(&self, criteria: &Query) -> Result<u64, StorageError> {
        Ok(memory_matcher::count(self.challenge_snapshot(), criteria))
    }

    async fn find(&self, key: &str) -> Result<Option<Challenge>, StorageError> {
        Ok(self.challenges.get(key).map(|r| r.value().clone()))
    }
}

#[async_trait]
impl RecordStore<Submission> for InMemoryStore {
    async fn find_many(
        &self,
        criteria: &Query,
        sort: &SortSpec,
        window: Window,
    ) -> Result<Vec<Submission>, StorageError> {
        Ok(memory_matcher::select(self.submission_snapshot(), criteria, sort, window))
    }

    async fn count(&self, criteria: &Query) -> Result<u64, StorageError> {
        Ok(memory_matcher::count(self.submission_snapshot(), criteria))
    }

    async fn find(&self, key: &str) -> Result<Option<Submission>, StorageError> {
        let Some(mut submission) = self.submissions.get(key).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        submission.review_count = self
            .reviews
            .iter()
            .filter(|r| r.submission_id == submission.id)
            .count() as u64;
        Ok(Some(submission))
    }
}

#[async_trait]
impl RecordStore<Review> for InMemoryStore {
    async fn find_many(
        &self,
        criteria: &Query,
        sort: &SortSpec,
        window: Window,
    ) -> Result<Vec<Review>, StorageError> {
        Ok(memory_matcher::select(self.review_snapshot(), criteria, sort, window))
    }

    async fn count(&self, criteria: &Query) -> Result<u64, StorageError> {
        Ok(memory_matcher::count(self.review_snapshot(), criteria))
    }

    async fn find(&self, key: &str) -> Result<Option<Review>, StorageError> {
        Ok(self.reviews.get(key).map(|r| r.value().clone()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Field access
// ═══════════════════════════════════════════════════════════════════════════

fn text_values<'a>(values: impl IntoIterator<Item = &'a String>) -> Vec<FilterValue> {
    values.into_iter().map(|v| FilterValue::text(v.as_str())).collect()
}

impl Document for Marketplace {
    fn text(&self, field: &str) -> Option<&str> {
        match field {
            fields::TITLE => Some(&self.title),
            fields::DESCRIPTION => Some(&self.description),
            _ => None,
        }
    }

    fn values(&self, field: &str) -> Vec<FilterValue> {
        match field {
            fields::ADDRESS => vec![FilterValue::text(self.address.as_str())],
            fields::PROGRAM_TYPE => vec![self.program_type.into()],
            fields::PROJECTS => text_values(&self.projects),
            fields::REWARD_TOKENS => text_values(&self.reward_tokens),
            fields::CAPABILITIES => self.capabilities.iter().map(|c| (*c).into()).collect(),
            _ => Vec::new(),
        }
    }

    fn sort_value(&self, field: &str) -> SortValue<'_> {
        match field {
            fields::TITLE => SortValue::Text(&self.title),
            fields::CREATED_AT => SortValue::Integer(self.created_at),
            fields::SERVICE_REQUEST_COUNT => SortValue::Integer(self.service_request_count as i64),
            fields::ADDRESS => SortValue::Text(&self.address),
            _ => SortValue::Missing,
        }
    }
}

impl Document for Challenge {
    fn text(&self, field: &str) -> Option<&str> {
        match field {
            fields::TITLE => Some(&self.title),
            fields::DESCRIPTION => Some(&self.description),
            _ => None,
        }
    }

    fn values(&self, field: &str) -> Vec<FilterValue> {
        match field {
            fields::ID => vec![FilterValue::text(self.id.as_str())],
            fields::MARKETPLACE_ADDRESS => vec![FilterValue::text(self.marketplace_address.as_str())],
            fields::STATUS => vec![self.status.into()],
            fields::SPONSOR => vec![FilterValue::text(self.sponsor.as_str())],
            _ => Vec::new(),
        }
    }

    fn sort_value(&self, field: &str) -> SortValue<'_> {
        match field {
            fields::TITLE => SortValue::Text(&self.title),
            fields::CREATED_AT => SortValue::Integer(self.created_at),
            fields::STARTS_AT => self.starts_at.into(),
            fields::ENDS_AT => self.ends_at.into(),
            fields::ID => SortValue::Text(&self.id),
            _ => SortValue::Missing,
        }
    }
}

impl Document for Submission {
    fn text(&self, field: &str) -> Option<&str> {
        match field {
            fields::TITLE => Some(&self.title),
            fields::DESCRIPTION => Some(&self.description),
            _ => None,
        }
    }

    fn values(&self, field: &str) -> Vec<FilterValue> {
        match field {
            fields::ID => vec![FilterValue::text(self.id.as_str())],
            fields::CHALLENGE_ID => vec![FilterValue::text(self.challenge_id.as_str())],
            fields::AUTHOR => vec![FilterValue::text(self.author.as_str())],
            _ => Vec::new(),
        }
    }

    fn sort_value(&self, field: &str) -> SortValue<'_> {
        match field {
            fields::TITLE => SortValue::Text(&self.title),
            fields::CREATED_AT => SortValue::Integer(self.created_at),
            fields::REVIEW_COUNT => SortValue::Integer(self.review_count as i64),
            fields::ID => SortValue::Text(&self.id),
            _ => SortValue::Missing,
        }
    }
}

impl Document for Review {
    fn text(&self, field: &str) -> Option<&str> {
        match field {
            fields::REVIEWER => Some(&self.reviewer),
            _ => None,
        }
    }

    fn values(&self, field: &str) -> Vec<FilterValue> {
        match field {
            fields::ID => vec![FilterValue::text(self.id.as_str())],
            fields::SUBMISSION_ID => vec![FilterValue::text(self.submission_id.as_str())],
            fields::REVIEWER => vec![FilterValue::text(self.reviewer.as_str())],
            fields::SCORE => vec![self.score.into()],
            _ => Vec::new(),
        }
    }

    fn sort_value(&self, field: &str) -> SortValue<'_> {
        match field {
            fields::CREATED_AT => SortValue::Integer(self.created_at),
            fields::SCORE => SortValue::Integer(self.score.likert()),
            fields::ID => SortValue::Text(&self.id),
            _ => SortValue::Missing,
        }
    }
}
