pub mod toml_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, validate_url, Validate};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use toml_config::FileConfig;

pub const DEFAULT_TTL_SECS: i64 = 600;
pub const DEFAULT_CHECK_INTERVAL_SECS: i64 = 30;

#[derive(Debug, Clone, Parser)]
#[command(name = "fanart-catalog")]
#[command(about = "Fan-art catalog: ordinals, ratings, leaderboards")]
pub struct CliConfig {
    /// Remote document store endpoint.
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// TOML config file with store/cache settings.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub ttl_secs: Option<i64>,

    #[arg(long, global = true)]
    pub check_interval_secs: Option<i64>,

    /// Run against an in-memory store instead of the remote endpoint.
    #[arg(long, global = true)]
    pub demo: bool,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Add a catalog item at the next free ordinal for its tier.
    Add {
        name: String,
        #[arg(long)]
        creator: String,
        #[arg(long)]
        elevated: bool,
        #[arg(long)]
        image_ref: Option<String>,
    },
    /// Cast or overwrite one voter's score for an item.
    Vote {
        item_id: String,
        #[arg(long)]
        voter: String,
        #[arg(long)]
        score: f64,
    },
    /// Print the catalog in display order.
    List,
    /// Print the leaderboard, optionally scoped to one creator.
    Leaderboard {
        #[arg(long)]
        creator: Option<String>,
    },
    /// Rewrite ordinals to a dense, tier-ordered sequence.
    Reorganize,
    /// Remove one voter's entries from every ledger (destructive).
    Withdraw {
        voter: String,
        #[arg(long)]
        confirm: String,
    },
    /// Delete an item and its ledger (destructive).
    Remove {
        item_id: String,
        #[arg(long)]
        confirm: String,
    },
    /// Drop every locally cached payload.
    ClearCache,
}

/// Effective settings after layering CLI flags over the optional TOML
/// file and the built-in defaults. CLI wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub store_endpoint: String,
    pub cache_ttl_secs: i64,
    pub check_interval_secs: i64,
}

impl Settings {
    pub fn resolve(cli: &CliConfig, file: Option<&FileConfig>) -> Self {
        let file_cache = file.and_then(|f| f.cache.as_ref());
        Settings {
            store_endpoint: cli
                .endpoint
                .clone()
                .or_else(|| file.map(|f| f.store.endpoint.clone()))
                .unwrap_or_default(),
            cache_ttl_secs: cli
                .ttl_secs
                .or_else(|| file_cache.and_then(|c| c.ttl_secs))
                .unwrap_or(DEFAULT_TTL_SECS),
            check_interval_secs: cli
                .check_interval_secs
                .or_else(|| file_cache.and_then(|c| c.check_interval_secs))
                .unwrap_or(DEFAULT_CHECK_INTERVAL_SECS),
        }
    }
}

impl ConfigProvider for Settings {
    fn store_endpoint(&self) -> &str {
        &self.store_endpoint
    }

    fn cache_ttl_secs(&self) -> i64 {
        self.cache_ttl_secs
    }

    fn check_interval_secs(&self) -> i64 {
        self.check_interval_secs
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("store_endpoint", &self.store_endpoint)?;
        validate_positive_number("cache_ttl_secs", self.cache_ttl_secs.max(0) as u64, 1)?;
        validate_positive_number(
            "check_interval_secs",
            self.check_interval_secs.max(0) as u64,
            1,
        )?;
        Ok(())
    }
}
