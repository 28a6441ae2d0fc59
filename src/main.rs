use anyhow::{Context, Result};
use clap::Parser;
use room_finder::config::Config;
use room_finder::normalizer::SubletPolicy;
use room_finder::notify::{Notifier, NtfyNotifier};
use room_finder::pipeline::Pipeline;
use room_finder::scheduler::Scheduler;
use room_finder::scrapers::{
    ChromeFetcher, HttpFetcher, RegionTable, SearchCriteria, WgZimmerScraper, WgZimmerSite,
    WokoScraper,
};
use room_finder::store::{ListingStore, SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "room-finder", about = "Push notifications for new room listings")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, env = "ROOM_FINDER_CONFIG", default_value = "config/room-finder.toml")]
    config: PathBuf,

    /// Free text included in the startup notification
    note: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    // Initialize logging
    let _log_guard = room_finder::logging::init(&config.log)?;

    info!("🏠 Room Finder");
    if cli.config.exists() {
        info!(path = %cli.config.display(), "Loaded config");
    } else {
        warn!(path = %cli.config.display(), "Config file not found, using defaults");
    }
    if config.log.to_file {
        info!(dir = %config.log.dir.display(), "Writing log file");
    }

    let store = SqliteStore::connect(&config.store.path)
        .await
        .context("Failed to open listing store")?;
    store
        .initialize()
        .await
        .context("Failed to initialize listing store")?;

    let notifier: Arc<dyn Notifier> = Arc::new(
        NtfyNotifier::new(&config.notify.server, &config.notify.topic)
            .with_timeout(config.notify.timeout_secs),
    );
    let policy = SubletPolicy::new(config.filters.ignore_sublets);

    let http = HttpFetcher::new(Duration::from_secs(config.woko.timeout_secs))
        .context("Failed to create HTTP client")?;
    let woko = WokoScraper::with_params(
        Arc::new(http),
        &config.woko.base_url,
        config.woko.pages.clone(),
        policy,
    );

    let chrome = ChromeFetcher::new(
        config.wgzimmer.headless,
        Duration::from_secs(config.wgzimmer.navigation_timeout_secs),
    );
    let criteria = SearchCriteria {
        regions: config.wgzimmer.cities.clone(),
        min_price: Some(config.wgzimmer.price_min),
        max_price: Some(config.wgzimmer.price_max),
        sublets: policy,
    };
    let wgzimmer = WgZimmerScraper::with_params(
        Arc::new(chrome),
        WgZimmerSite::from_config(&config.wgzimmer),
        criteria,
        RegionTable::wgzimmer(),
    );

    let pipeline = Arc::new(Pipeline::new(Arc::new(store), notifier.clone(), policy));

    let mut scheduler = Scheduler::new(pipeline, notifier, config.schedule.heartbeat())
        .with_tick(config.schedule.tick())
        .register(Arc::new(woko), config.schedule.woko_interval())
        .register(Arc::new(wgzimmer), config.schedule.wgzimmer_interval());

    scheduler.announce_start(cli.note.as_deref()).await;
    scheduler.run_forever().await;

    Ok(())
}
