// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Labor market search CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Seed a SQLite file with the default fixture plan
//! labor-market-search --sql-url "sqlite:labor.db?mode=rwc" seed
//!
//! # Search marketplaces with URL-style params
//! labor-market-search --sql-url "sqlite:labor.db" search marketplace "q=dune&project=solana&order=asc"
//!
//! # Show the SQL that would run
//! labor-market-search --sql-url "sqlite:labor.db" search challenge "status=active" --explain
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use labor_market_search::model::{Challenge, Marketplace, Review, Submission};
use labor_market_search::search::SqlTranslator;
use labor_market_search::{
    Fixtures, RawSearchParams, SearchService, SearchServiceConfig, SeedPlan, SqlEntity, SqlStore,
};

#[derive(Parser, Debug)]
#[command(name = "labor-market-search")]
#[command(about = "Search and seed labor market data")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "LABOR_MARKET_SEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// SQL connection string (overrides the config file)
    #[arg(long, env = "DATABASE_URL")]
    sql_url: Option<String>,

    /// Pool size (overrides the config file)
    #[arg(long)]
    max_connections: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write deterministic fixtures into the database
    Seed {
        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value_t = 100)]
        marketplaces: usize,

        #[arg(long, default_value_t = 1)]
        challenges_per_marketplace: usize,

        #[arg(long, default_value_t = 3)]
        submissions_per_challenge: usize,

        #[arg(long, default_value_t = 3)]
        max_reviews_per_submission: usize,
    },
    /// Run one search and print the page as JSON
    Search {
        entity: Entity,

        /// URL query string, e.g. "q=dune&sortBy=title&project=solana"
        #[arg(default_value = "")]
        params: String,

        /// Print the SQL for the page query instead of running it
        #[arg(long)]
        explain: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Entity {
    Marketplace,
    Challenge,
    Submission,
    Review,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SearchServiceConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SearchServiceConfig::default(),
    };
    if let Some(url) = args.sql_url {
        config.sql_url = url;
    }
    if let Some(n) = args.max_connections {
        config.max_connections = n;
    }
    config.validate()?;

    let store = SqlStore::from_config(&config)
        .await
        .context("connecting to the SQL store")?;

    let outcome = run(args.command, &config, &store).await;
    store.close().await;
    outcome
}

async fn run(command: Command, config: &SearchServiceConfig, store: &SqlStore) -> anyhow::Result<()> {
    match command {
        Command::Seed {
            seed,
            marketplaces,
            challenges_per_marketplace,
            submissions_per_challenge,
            max_reviews_per_submission,
        } => {
            let plan = SeedPlan {
                seed,
                marketplaces,
                challenges_per_marketplace,
                submissions_per_challenge,
                max_reviews_per_submission,
            };
            info!(?plan, "Seeding");
            let report = Fixtures::generate(&plan).load_sql(store).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Search { entity, params, explain } => {
            let params = RawSearchParams::from_query(&params);
            match entity {
                Entity::Marketplace => search::<Marketplace>(config, store, &params, explain).await,
                Entity::Challenge => search::<Challenge>(config, store, &params, explain).await,
                Entity::Submission => search::<Submission>(config, store, &params, explain).await,
                Entity::Review => search::<Review>(config, store, &params, explain).await,
            }
        }
    }
}

async fn search<E>(
    config: &SearchServiceConfig,
    store: &SqlStore,
    params: &RawSearchParams,
    explain: bool,
) -> anyhow::Result<()>
where
    E: SqlEntity + Serialize,
{
    let service = SearchService::<E>::from_config(config);

    if explain {
        let request = service.validate(params)?;
        let sql = SqlTranslator::select(&E::TABLE, &request.criteria(), &request.sort_spec(), request.page().window())?;
        println!("{}", sql.inline());
        return Ok(());
    }

    let page = service.search_params(store, params).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}
