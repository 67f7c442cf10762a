// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Deterministic seed fixtures.
//!
//! Generates reference data (projects, tokens) and a tree of marketplaces,
//! challenges, submissions and reviews from a fixed RNG seed, so two runs
//! with the same [`SeedPlan`] produce identical rows.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::metrics;
use crate::model::{
    Capability, Challenge, ChallengeStatus, Marketplace, ProgramType, Project, Review,
    ReviewScore, Submission, Token,
};
use crate::storage::memory::InMemoryStore;
use crate::storage::sql::SqlStore;
use crate::storage::traits::StorageError;

pub const PROJECTS: &[(&str, &str)] = &[
    ("solana", "Solana"),
    ("metricsdao", "MetricsDAO"),
    ("avalanche", "Avalanche"),
    ("polygon", "Polygon"),
    ("arbitrum", "Arbitrum"),
    ("axelar", "Axelar"),
    ("near", "Near"),
    ("flow", "Flow"),
    ("ethereum", "Ethereum"),
];

pub const TOKENS: &[(&str, &str)] = &[
    ("ETH", "Ethereum"),
    ("SOL", "Solana"),
    ("USDC", "USD Coin"),
    ("MATIC", "Polygon"),
    ("AXL", "Axelar"),
    ("NEAR", "Near"),
    ("FLOW", "Flow"),
    ("AVAX", "Avalanche"),
];

const ADJECTIVES: &[&str] = &[
    "Onchain", "Weekly", "Open", "Deep", "Cross-chain", "Community", "Rapid", "Quarterly",
];

const SUBJECTS: &[&str] = &[
    "Bridge Flows", "NFT Markets", "Validator Health", "DEX Volume", "Wallet Retention",
    "Governance Turnout", "Stablecoin Supply", "Staking Yields",
];

const KINDS: &[&str] = &["Dashboard", "Deep Dive", "Bounty", "Review", "Brainstorm"];

/// November 2022, the platform's launch month
const EPOCH_MS: i64 = 1_667_260_800_000;
const HOUR_MS: i64 = 3_600_000;

/// Shape of a fixture set.
#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub seed: u64,
    pub marketplaces: usize,
    pub challenges_per_marketplace: usize,
    pub submissions_per_challenge: usize,
    /// Upper bound; each submission gets 0..=max reviews
    pub max_reviews_per_submission: usize,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            seed: 42,
            marketplaces: 100,
            challenges_per_marketplace: 1,
            submissions_per_challenge: 3,
            max_reviews_per_submission: 3,
        }
    }
}

/// A generated fixture set, ready to load into a store.
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub projects: Vec<Project>,
    pub tokens: Vec<Token>,
    pub marketplaces: Vec<Marketplace>,
    pub challenges: Vec<Challenge>,
    pub submissions: Vec<Submission>,
    pub reviews: Vec<Review>,
}

/// Rows written per entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub projects: usize,
    pub tokens: usize,
    pub marketplaces: usize,
    pub challenges: usize,
    pub submissions: usize,
    pub reviews: usize,
}

fn address(rng: &mut StdRng) -> String {
    format!("0x{:016x}{:016x}{:08x}", rng.gen::<u64>(), rng.gen::<u64>(), rng.gen::<u32>())
}

fn pick<'a>(rng: &mut StdRng, words: &[&'a str]) -> &'a str {
    words.choose(rng).copied().unwrap_or_default()
}

fn title(rng: &mut StdRng) -> String {
    format!("{} {} {}", pick(rng, ADJECTIVES), pick(rng, SUBJECTS), pick(rng, KINDS))
}

/// `1..=max` distinct elements, in source order
fn subset(rng: &mut StdRng, values: &[&str], max: usize) -> Vec<String> {
    let n = rng.gen_range(1..=max.clamp(1, values.len()));
    let mut chosen: Vec<&str> = values.choose_multiple(rng, n).copied().collect();
    chosen.sort_by_key(|v| values.iter().position(|x| x == v));
    chosen.into_iter().map(String::from).collect()
}

impl Fixtures {
    pub fn generate(plan: &SeedPlan) -> Self {
        let mut rng = StdRng::seed_from_u64(plan.seed);
        let mut out = Fixtures {
            projects: PROJECTS
                .iter()
                .map(|(slug, name)| Project { slug: slug.to_string(), name: name.to_string() })
                .collect(),
            tokens: TOKENS
                .iter()
                .map(|(symbol, name)| Token { symbol: symbol.to_string(), name: name.to_string() })
                .collect(),
            ..Default::default()
        };

        let project_slugs: Vec<&str> = PROJECTS.iter().map(|(s, _)| *s).collect();
        let token_symbols: Vec<&str> = TOKENS.iter().map(|(s, _)| *s).collect();
        let capability_names: Vec<&str> = Capability::ALL.iter().map(|c| c.as_str()).collect();

        for m in 0..plan.marketplaces {
            let market_created = EPOCH_MS + (m as i64) * HOUR_MS + rng.gen_range(0..HOUR_MS);
            let marketplace = Marketplace {
                address: address(&mut rng),
                title: title(&mut rng),
                description: format!("Marketplace {} for {}", m + 1, pick(&mut rng, SUBJECTS).to_lowercase()),
                program_type: *ProgramType::ALL.choose(&mut rng).unwrap_or(&ProgramType::Brainstorm),
                projects: subset(&mut rng, &project_slugs, 2),
                reward_tokens: subset(&mut rng, &token_symbols, token_symbols.len()),
                capabilities: subset(&mut rng, &capability_names, capability_names.len())
                    .iter()
                    .filter_map(|c| c.parse().ok())
                    .collect(),
                created_at: market_created,
                service_request_count: 0,
            };

            for c in 0..plan.challenges_per_marketplace {
                let challenge_created = market_created + (c as i64 + 1) * HOUR_MS;
                let status = *ChallengeStatus::ALL.choose(&mut rng).unwrap_or(&ChallengeStatus::Pending);
                let starts_at = (status != ChallengeStatus::Pending)
                    .then(|| challenge_created + rng.gen_range(1..24) * HOUR_MS);
                let challenge = Challenge {
                    id: format!("sr-{:04}-{:02}", m + 1, c + 1),
                    marketplace_address: marketplace.address.clone(),
                    title: title(&mut rng),
                    description: format!("Challenge {} in {}", c + 1, marketplace.title),
                    status,
                    sponsor: address(&mut rng),
                    starts_at,
                    ends_at: starts_at.map(|s| s + rng.gen_range(24..24 * 14) * HOUR_MS),
                    created_at: challenge_created,
                };

                for s in 0..plan.submissions_per_challenge {
                    let submission_created = challenge_created + (s as i64 + 1) * HOUR_MS;
                    let submission = Submission {
                        id: format!("{}-sub-{:02}", challenge.id, s + 1),
                        challenge_id: challenge.id.clone(),
                        author: address(&mut rng),
                        title: title(&mut rng),
                        description: format!("Submission {} to {}", s + 1, challenge.title),
                        created_at: submission_created,
                        review_count: 0,
                    };

                    let reviews = rng.gen_range(0..=plan.max_reviews_per_submission);
                    for r in 0..reviews {
                        out.reviews.push(Review {
                            id: format!("{}-rev-{:02}", submission.id, r + 1),
                            submission_id: submission.id.clone(),
                            reviewer: address(&mut rng),
                            score: *ReviewScore::ALL.choose(&mut rng).unwrap_or(&ReviewScore::Average),
                            created_at: submission_created + (r as i64 + 1) * HOUR_MS,
                        });
                    }
                    out.submissions.push(submission);
                }
                out.challenges.push(challenge);
            }
            out.marketplaces.push(marketplace);
        }

        out
    }

    pub fn report(&self) -> SeedReport {
        SeedReport {
            projects: self.projects.len(),
            tokens: self.tokens.len(),
            marketplaces: self.marketplaces.len(),
            challenges: self.challenges.len(),
            submissions: self.submissions.len(),
            reviews: self.reviews.len(),
        }
    }

    /// Load into an in-memory store. Reference data has no place there.
    pub fn load_memory(&self, store: &InMemoryStore) -> SeedReport {
        for m in &self.marketplaces {
            store.upsert_marketplace(m.clone());
        }
        for c in &self.challenges {
            store.upsert_challenge(c.clone());
        }
        for s in &self.submissions {
            store.upsert_submission(s.clone());
        }
        for r in &self.reviews {
            store.upsert_review(r.clone());
        }
        SeedReport {
            projects: 0,
            tokens: 0,
            ..self.report()
        }
    }

    /// Load into a SQL store. Upserts make reruns idempotent.
    pub async fn load_sql(&self, store: &SqlStore) -> Result<SeedReport, StorageError> {
        for p in &self.projects {
            store.upsert_project(p).await?;
        }
        for t in &self.tokens {
            store.upsert_token(t).await?;
        }
        for m in &self.marketplaces {
            store.upsert_marketplace(m).await?;
        }
        for c in &self.challenges {
            store.upsert_challenge(c).await?;
        }
        for s in &self.submissions {
            store.upsert_submission(s).await?;
        }
        for r in &self.reviews {
            store.upsert_review(r).await?;
        }

        let report = self.report();
        metrics::record_seeded("project", report.projects);
        metrics::record_seeded("token", report.tokens);
        metrics::record_seeded("marketplace", report.marketplaces);
        metrics::record_seeded("challenge", report.challenges);
        metrics::record_seeded("submission", report.submissions);
        metrics::record_seeded("review", report.reviews);
        info!(
            marketplaces = report.marketplaces,
            challenges = report.challenges,
            submissions = report.submissions,
            reviews = report.reviews,
            "Seeded SQL store"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SeedPlan {
        SeedPlan {
            seed: 7,
            marketplaces: 5,
            challenges_per_marketplace: 2,
            submissions_per_challenge: 3,
            max_reviews_per_submission: 2,
        }
    }

    #[test]
    fn test_same_seed_same_fixtures() {
        let a = Fixtures::generate(&small());
        let b = Fixtures::generate(&small());
        assert_eq!(a.marketplaces, b.marketplaces);
        assert_eq!(a.reviews, b.reviews);
    }

    #[test]
    fn test_shape_follows_plan() {
        let f = Fixtures::generate(&small());
        assert_eq!(f.projects.len(), 9);
        assert_eq!(f.tokens.len(), 8);
        assert_eq!(f.marketplaces.len(), 5);
        assert_eq!(f.challenges.len(), 10);
        assert_eq!(f.submissions.len(), 30);
        assert!(f.reviews.len() <= 60);
    }

    #[test]
    fn test_marketplaces_have_one_or_two_projects() {
        let f = Fixtures::generate(&SeedPlan::default());
        for m in &f.marketplaces {
            assert!((1..=2).contains(&m.projects.len()), "{:?}", m.projects);
            assert!(!m.reward_tokens.is_empty());
            assert!(!m.capabilities.is_empty());
        }
    }

    #[test]
    fn test_pending_challenges_have_no_dates() {
        let f = Fixtures::generate(&SeedPlan::default());
        for c in &f.challenges {
            if c.status == ChallengeStatus::Pending {
                assert_eq!(c.starts_at, None);
                assert_eq!(c.ends_at, None);
            } else {
                assert!(c.ends_at > c.starts_at);
            }
        }
    }

    #[test]
    fn test_load_memory_is_idempotent() {
        let f = Fixtures::generate(&small());
        let store = InMemoryStore::new();
        f.load_memory(&store);
        let first = store.len();
        f.load_memory(&store);
        assert_eq!(store.len(), first);
        assert_eq!(first, 5 + 10 + 30 + f.reviews.len());
    }
}
