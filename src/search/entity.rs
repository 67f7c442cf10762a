// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Searchable entities and their allow-lists.
//!
//! Every entity declares, at compile time, which columns it may be sorted by,
//! which filter keys it accepts, and which text fields free-text search
//! covers. Requests can only name values from these enums, so nothing a
//! caller sends ever reaches a store as a column name.
//!
//! | Entity      | sortBy                                        | filters                              |
//! |-------------|-----------------------------------------------|--------------------------------------|
//! | Marketplace | `title`, `serviceRequests`, `createdAt`       | `project`, `token`, `type`, `filter` |
//! | Challenge   | `title`, `createdAt`, `startsAt`, `endsAt`    | `marketplace`, `status`, `sponsor`   |
//! | Submission  | `createdAt`, `title`, `reviews`               | `challenge`, `author`                |
//! | Review      | `createdAt`, `score`                          | `submission`, `score`, `reviewer`    |

use std::fmt::Debug;
use std::hash::Hash;

use serde::Serialize;

use super::query_builder::FilterValue;
use crate::model::{
    Capability, Challenge, ChallengeStatus, Marketplace, ProgramType, Review, ReviewScore,
    Submission,
};

/// Which entity a request or cache entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Marketplace,
    Challenge,
    Submission,
    Review,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Marketplace => "marketplace",
            EntityKind::Challenge => "challenge",
            EntityKind::Submission => "submission",
            EntityKind::Review => "review",
        }
    }
}

/// An allow-listed sort column.
pub trait SortField: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    const ALL: &'static [Self];
    const DEFAULT: Self;

    /// Name accepted in the `sortBy` URL parameter
    fn param(self) -> &'static str;

    /// Logical field name resolved by stores
    fn field(self) -> &'static str;

    fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.param() == raw)
    }
}

/// An allow-listed filter key.
pub trait FilterKey: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    /// Name of the (repeatable) URL parameter
    fn param(self) -> &'static str;

    /// Logical field name resolved by stores
    fn field(self) -> &'static str;

    /// Validate one raw value. Enumerated keys normalize to their canonical form.
    fn parse_value(self, raw: &str) -> Result<FilterValue, String> {
        Ok(FilterValue::text(raw))
    }

    fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.param() == raw)
    }
}

/// A record type the search layer can list.
pub trait SearchEntity: Clone + Send + Sync + 'static {
    type Sort: SortField;
    type Filter: FilterKey;

    const KIND: EntityKind;

    /// Logical name of the natural key, also the ordering tiebreaker
    const KEY_FIELD: &'static str;

    /// Fields covered by free-text search
    const TEXT_FIELDS: &'static [&'static str];

    fn key(&self) -> &str;
}

/// Logical field names shared by the entity descriptors and the stores.
pub mod fields {
    pub const ADDRESS: &str = "address";
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const CREATED_AT: &str = "created_at";

    pub const PROGRAM_TYPE: &str = "type";
    pub const PROJECTS: &str = "projects";
    pub const REWARD_TOKENS: &str = "reward_tokens";
    pub const CAPABILITIES: &str = "capabilities";
    pub const SERVICE_REQUEST_COUNT: &str = "service_request_count";

    pub const MARKETPLACE_ADDRESS: &str = "marketplace_address";
    pub const STATUS: &str = "status";
    pub const SPONSOR: &str = "sponsor";
    pub const STARTS_AT: &str = "starts_at";
    pub const ENDS_AT: &str = "ends_at";

    pub const CHALLENGE_ID: &str = "challenge_id";
    pub const AUTHOR: &str = "author";
    pub const REVIEW_COUNT: &str = "review_count";

    pub const SUBMISSION_ID: &str = "submission_id";
    pub const REVIEWER: &str = "reviewer";
    pub const SCORE: &str = "score";
}

// ═══════════════════════════════════════════════════════════════════════════
// Marketplace
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketplaceSort {
    Title,
    ServiceRequests,
    CreatedAt,
}

impl SortField for MarketplaceSort {
    const ALL: &'static [Self] = &[Self::Title, Self::ServiceRequests, Self::CreatedAt];
    const DEFAULT: Self = Self::Title;

    fn param(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::ServiceRequests => "serviceRequests",
            Self::CreatedAt => "createdAt",
        }
    }

    fn field(self) -> &'static str {
        match self {
            Self::Title => fields::TITLE,
            Self::ServiceRequests => fields::SERVICE_REQUEST_COUNT,
            Self::CreatedAt => fields::CREATED_AT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarketplaceFilter {
    /// Project slugs
    Project,
    /// Reward token symbols
    Token,
    /// Program type
    Type,
    /// Capability ("I am able to ...")
    Capability,
}

impl FilterKey for MarketplaceFilter {
    const ALL: &'static [Self] = &[Self::Project, Self::Token, Self::Type, Self::Capability];

    fn param(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Token => "token",
            Self::Type => "type",
            Self::Capability => "filter",
        }
    }

    fn field(self) -> &'static str {
        match self {
            Self::Project => fields::PROJECTS,
            Self::Token => fields::REWARD_TOKENS,
            Self::Type => fields::PROGRAM_TYPE,
            Self::Capability => fields::CAPABILITIES,
        }
    }

    fn parse_value(self, raw: &str) -> Result<FilterValue, String> {
        match self {
            Self::Type => raw.parse::<ProgramType>().map(Into::into),
            Self::Capability => raw.parse::<Capability>().map(Into::into),
            Self::Project | Self::Token => Ok(FilterValue::text(raw)),
        }
    }
}

impl SearchEntity for Marketplace {
    type Sort = MarketplaceSort;
    type Filter = MarketplaceFilter;

    const KIND: EntityKind = EntityKind::Marketplace;
    const KEY_FIELD: &'static str = fields::ADDRESS;
    const TEXT_FIELDS: &'static [&'static str] = &[fields::TITLE, fields::DESCRIPTION];

    fn key(&self) -> &str {
        &self.address
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Challenge
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeSort {
    Title,
    CreatedAt,
    StartsAt,
    EndsAt,
}

impl SortField for ChallengeSort {
    const ALL: &'static [Self] = &[Self::Title, Self::CreatedAt, Self::StartsAt, Self::EndsAt];
    const DEFAULT: Self = Self::CreatedAt;

    fn param(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::CreatedAt => "createdAt",
            Self::StartsAt => "startsAt",
            Self::EndsAt => "endsAt",
        }
    }

    fn field(self) -> &'static str {
        match self {
            Self::Title => fields::TITLE,
            Self::CreatedAt => fields::CREATED_AT,
            Self::StartsAt => fields::STARTS_AT,
            Self::EndsAt => fields::ENDS_AT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChallengeFilter {
    Marketplace,
    Status,
    Sponsor,
}

impl FilterKey for ChallengeFilter {
    const ALL: &'static [Self] = &[Self::Marketplace, Self::Status, Self::Sponsor];

    fn param(self) -> &'static str {
        match self {
            Self::Marketplace => "marketplace",
            Self::Status => "status",
            Self::Sponsor => "sponsor",
        }
    }

    fn field(self) -> &'static str {
        match self {
            Self::Marketplace => fields::MARKETPLACE_ADDRESS,
            Self::Status => fields::STATUS,
            Self::Sponsor => fields::SPONSOR,
        }
    }

    fn parse_value(self, raw: &str) -> Result<FilterValue, String> {
        match self {
            Self::Status => raw.parse::<ChallengeStatus>().map(Into::into),
            Self::Marketplace | Self::Sponsor => Ok(FilterValue::text(raw)),
        }
    }
}

impl SearchEntity for Challenge {
    type Sort = ChallengeSort;
    type Filter = ChallengeFilter;

    const KIND: EntityKind = EntityKind::Challenge;
    const KEY_FIELD: &'static str = fields::ID;
    const TEXT_FIELDS: &'static [&'static str] = &[fields::TITLE, fields::DESCRIPTION];

    fn key(&self) -> &str {
        &self.id
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Submission
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionSort {
    CreatedAt,
    Title,
    Reviews,
}

impl SortField for SubmissionSort {
    const ALL: &'static [Self] = &[Self::CreatedAt, Self::Title, Self::Reviews];
    const DEFAULT: Self = Self::CreatedAt;

    fn param(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::Title => "title",
            Self::Reviews => "reviews",
        }
    }

    fn field(self) -> &'static str {
        match self {
            Self::CreatedAt => fields::CREATED_AT,
            Self::Title => fields::TITLE,
            Self::Reviews => fields::REVIEW_COUNT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubmissionFilter {
    Challenge,
    Author,
}

impl FilterKey for SubmissionFilter {
    const ALL: &'static [Self] = &[Self::Challenge, Self::Author];

    fn param(self) -> &'static str {
        match self {
            Self::Challenge => "challenge",
            Self::Author => "author",
        }
    }

    fn field(self) -> &'static str {
        match self {
            Self::Challenge => fields::CHALLENGE_ID,
            Self::Author => fields::AUTHOR,
        }
    }
}

impl SearchEntity for Submission {
    type Sort = SubmissionSort;
    type Filter = SubmissionFilter;

    const KIND: EntityKind = EntityKind::Submission;
    const KEY_FIELD: &'static str = fields::ID;
    const TEXT_FIELDS: &'static [&'static str] = &[fields::TITLE, fields::DESCRIPTION];

    fn key(&self) -> &str {
        &self.id
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Review
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewSort {
    CreatedAt,
    Score,
}

impl SortField for ReviewSort {
    const ALL: &'static [Self] = &[Self::CreatedAt, Self::Score];
    const DEFAULT: Self = Self::CreatedAt;

    fn param(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::Score => "score",
        }
    }

    fn field(self) -> &'static str {
        match self {
            Self::CreatedAt => fields::CREATED_AT,
            Self::Score => fields::SCORE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReviewFilter {
    Submission,
    Score,
    Reviewer,
}

impl FilterKey for ReviewFilter {
    const ALL: &'static [Self] = &[Self::Submission, Self::Score, Self::Reviewer];

    fn param(self) -> &'static str {
        match self {
            Self::Submission => "submission",
            Self::Score => "score",
            Self::Reviewer => "reviewer",
        }
    }

    fn field(self) -> &'static str {
        match self {
            Self::Submission => fields::SUBMISSION_ID,
            Self::Score => fields::SCORE,
            Self::Reviewer => fields::REVIEWER,
        }
    }

    fn parse_value(self, raw: &str) -> Result<FilterValue, String> {
        match self {
            Self::Score => raw.parse::<ReviewScore>().map(Into::into),
            Self::Submission | Self::Reviewer => Ok(FilterValue::text(raw)),
        }
    }
}

impl SearchEntity for Review {
    type Sort = ReviewSort;
    type Filter = ReviewFilter;

    const KIND: EntityKind = EntityKind::Review;
    const KEY_FIELD: &'static str = fields::ID;
    const TEXT_FIELDS: &'static [&'static str] = &[fields::REVIEWER];

    fn key(&self) -> &str {
        &self.id
    }
}

// Enumerated values normalize to the representation stores hold.

impl From<ProgramType> for FilterValue {
    fn from(value: ProgramType) -> Self {
        FilterValue::text(value.as_str())
    }
}

impl From<Capability> for FilterValue {
    fn from(value: Capability) -> Self {
        FilterValue::text(value.as_str())
    }
}

impl From<ChallengeStatus> for FilterValue {
    fn from(value: ChallengeStatus) -> Self {
        FilterValue::text(value.as_str())
    }
}

impl From<ReviewScore> for FilterValue {
    fn from(value: ReviewScore) -> Self {
        FilterValue::Integer(value.likert())
    }
}
