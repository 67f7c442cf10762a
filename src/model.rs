// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Domain records read by the search layer.
//!
//! Ownership is strictly one-to-many:
//!
//! ```text
//! Marketplace (address) ──< Challenge (id) ──< Submission (id) ──< Review (id)
//! ```
//!
//! Records are produced by the write path (chain-confirmed transactions or
//! direct upserts) and only read here. Derived counts
//! (`service_request_count`, `review_count`) are filled in by the store at
//! read time and ignored on write.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a closed, string-backed enum with `as_str`, `ALL`, `Display` and `FromStr`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| {
                        let expected: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        format!("`{}` is not one of {}", s, expected.join(", "))
                    })
            }
        }
    };
}

string_enum! {
    /// Kind of program a marketplace runs.
    pub enum ProgramType {
        Brainstorm => "brainstorm",
        Analyze => "analyze",
    }
}

string_enum! {
    /// An action a participant may be permitted to perform on a marketplace.
    pub enum Capability {
        Launch => "launch",
        Submit => "submit",
        Review => "review",
    }
}

string_enum! {
    /// Challenge lifecycle: `pending → active → review → closed`.
    pub enum ChallengeStatus {
        Pending => "pending",
        Active => "active",
        Review => "review",
        Closed => "closed",
    }
}

/// Ordinal review grade. Stored externally as a Likert score, 5 (Great) to 1 (Spam).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReviewScore {
    Great,
    Good,
    Average,
    Bad,
    Spam,
}

impl ReviewScore {
    pub const ALL: &'static [ReviewScore] = &[
        ReviewScore::Great,
        ReviewScore::Good,
        ReviewScore::Average,
        ReviewScore::Bad,
        ReviewScore::Spam,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewScore::Great => "Great",
            ReviewScore::Good => "Good",
            ReviewScore::Average => "Average",
            ReviewScore::Bad => "Bad",
            ReviewScore::Spam => "Spam",
        }
    }

    pub fn likert(self) -> i64 {
        match self {
            ReviewScore::Great => 5,
            ReviewScore::Good => 4,
            ReviewScore::Average => 3,
            ReviewScore::Bad => 2,
            ReviewScore::Spam => 1,
        }
    }

    pub fn from_likert(value: i64) -> Option<Self> {
        ReviewScore::ALL.iter().copied().find(|s| s.likert() == value)
    }
}

impl fmt::Display for ReviewScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewScore {
    type Err = String;

    /// Accepts a grade name (any case) or a Likert digit `1`..`5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(n) = s.parse::<i64>() {
            return ReviewScore::from_likert(n)
                .ok_or_else(|| format!("score {} is outside the 1-5 scale", n));
        }
        ReviewScore::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("`{}` is not one of Great, Good, Average, Bad, Spam", s))
    }
}

/// A labor market hosting challenges under shared reputation and reward rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marketplace {
    /// On-chain address, the natural key
    pub address: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub program_type: ProgramType,
    /// Project slugs (many-to-many)
    #[serde(default)]
    pub projects: Vec<String>,
    /// Reward token symbols (many-to-many)
    #[serde(default)]
    pub reward_tokens: Vec<String>,
    /// Actions open to participants
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    /// Creation timestamp (epoch millis)
    pub created_at: i64,
    /// Number of challenges owned by this marketplace (derived)
    #[serde(default)]
    pub service_request_count: u64,
}

/// A unit of work posted within a marketplace (a "service request").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    /// Owning marketplace
    pub marketplace_address: String,
    pub title: String,
    pub description: String,
    pub status: ChallengeStatus,
    pub sponsor: String,
    pub starts_at: Option<i64>,
    pub ends_at: Option<i64>,
    pub created_at: i64,
}

/// An author's response to a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    /// Owning challenge
    pub challenge_id: String,
    pub author: String,
    pub title: String,
    pub description: String,
    pub created_at: i64,
    /// Number of reviews on this submission (derived)
    #[serde(default)]
    pub review_count: u64,
}

/// A reviewer's score on a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    /// Owning submission
    pub submission_id: String,
    pub reviewer: String,
    pub score: ReviewScore,
    pub created_at: i64,
}

/// Reference data: a chain or project a marketplace can be tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub slug: String,
    pub name: String,
}

/// Reference data: a reward token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub name: String,
}
