use clap::Parser;
use fanart_catalog::adapters::memory::{MemoryLocalStore, MemoryStore};
use fanart_catalog::adapters::rest::RestStore;
use fanart_catalog::config::toml_config::FileConfig;
use fanart_catalog::domain::ports::{
    Clock, ConfigProvider, ItemStore, LedgerStore, LocalStore, MarkerStore, SystemClock,
};
use fanart_catalog::utils::{logger, validation::Validate};
use fanart_catalog::{
    CacheConfig, CatalogService, CliConfig, Command, LeaderboardScope, NewItem, Settings, Tier,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);
    tracing::info!("Starting fanart-catalog CLI");

    let file_config = match &cli.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let settings = Settings::resolve(&cli, file_config.as_ref());

    let cache_config = CacheConfig::new(settings.cache_ttl_secs(), settings.check_interval_secs());
    let clock = Arc::new(SystemClock);
    let local = Arc::new(MemoryLocalStore::new());

    let outcome = if cli.demo {
        tracing::info!("Demo mode: in-memory store");
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let service = CatalogService::new(
            store.clone(),
            store.clone(),
            store,
            local,
            clock,
            cache_config,
        );
        run(&service, cli.command).await
    } else {
        if let Err(e) = settings.validate() {
            tracing::error!("Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
        let store = Arc::new(RestStore::new(settings.store_endpoint())?);
        let service = CatalogService::new(
            store.clone(),
            store.clone(),
            store,
            local,
            clock,
            cache_config,
        );
        run(&service, cli.command).await
    };

    if let Err(e) = outcome {
        tracing::error!("Command failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run<T, S, K>(
    service: &CatalogService<T, T, T, S, K>,
    command: Command,
) -> fanart_catalog::Result<()>
where
    T: ItemStore + LedgerStore + MarkerStore,
    S: LocalStore,
    K: Clock,
{
    match command {
        Command::Add {
            name,
            creator,
            elevated,
            image_ref,
        } => {
            let tier = if elevated { Tier::Elevated } else { Tier::Regular };
            let id = service
                .add_item(
                    tier,
                    NewItem {
                        name,
                        creator,
                        image_ref,
                    },
                )
                .await?;
            println!("✅ Added item {}", id);
        }
        Command::Vote {
            item_id,
            voter,
            score,
        } => {
            service.cast_vote(&item_id, &voter, score).await?;
            println!("✅ Recorded {} for {} by {}", score, item_id, voter);
        }
        Command::List => {
            let items = service.get_catalog().await;
            if items.is_empty() {
                println!("(catalog is empty or unreachable)");
            }
            for item in items {
                println!(
                    "{:>4}  {:?}  {}  by {}",
                    item.ordinal, item.tier, item.name, item.creator
                );
            }
        }
        Command::Leaderboard { creator } => {
            let scope = match creator {
                Some(creator) => LeaderboardScope::Creator(creator),
                None => LeaderboardScope::Global,
            };
            let ranked = service.get_leaderboard(scope).await;
            if ranked.is_empty() {
                println!("(no rated items)");
            }
            for entry in ranked {
                println!(
                    "#{:<3} {}  avg {:.2}  pts {:.1}  ({} votes)",
                    entry.rank,
                    entry.item_id,
                    entry.average_score,
                    entry.total_points,
                    entry.vote_count
                );
            }
        }
        Command::Reorganize => {
            let report = service.force_reorganize().await?;
            println!(
                "✅ Reorganized {} items ({} ordinals rewritten)",
                report.total_items, report.writes
            );
        }
        Command::Withdraw { voter, confirm } => {
            let touched = service.withdraw_voter(&voter, &confirm).await?;
            println!("✅ Withdrew {} from {} ledgers", voter, touched);
        }
        Command::Remove { item_id, confirm } => {
            service.remove_item(&item_id, &confirm).await?;
            println!("✅ Removed {}", item_id);
        }
        Command::ClearCache => {
            service.clear_cache();
            println!("✅ Local cache cleared");
        }
    }
    Ok(())
}
