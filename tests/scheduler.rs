// tests/scheduler.rs
mod common;

use anyhow::Result;
use async_trait::async_trait;
use common::{listing, RecordingNotifier};
use room_finder::models::{Listing, Source};
use room_finder::normalizer::SubletPolicy;
use room_finder::pipeline::Pipeline;
use room_finder::scheduler::Scheduler;
use room_finder::scrapers::ScraperTrait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

enum Behaviour {
    Listings(Vec<Listing>),
    Fail,
    Panic,
}

struct FakeScraper {
    source: Source,
    behaviour: Behaviour,
    runs: AtomicUsize,
}

impl FakeScraper {
    fn new(source: Source, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            source,
            behaviour,
            runs: AtomicUsize::new(0),
        })
    }

    fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScraperTrait for FakeScraper {
    async fn fetch_and_parse(&self) -> Result<Vec<Listing>> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Listings(listings) => Ok(listings.clone()),
            Behaviour::Fail => anyhow::bail!("layout changed"),
            Behaviour::Panic => panic!("parser exploded"),
        }
    }

    fn source(&self) -> Source {
        self.source
    }
}

const WOKO_EVERY: Duration = Duration::from_secs(300);
const WGZIMMER_EVERY: Duration = Duration::from_secs(1800);
const HEARTBEAT_EVERY: Duration = Duration::from_secs(3600);

async fn scheduler_with(
    woko: Arc<FakeScraper>,
    wgzimmer: Arc<FakeScraper>,
) -> (tempfile::TempDir, Arc<RecordingNotifier>, Scheduler) {
    let (tmp, store) = common::temp_store().await;
    let notifier = Arc::new(RecordingNotifier::default());
    let pipeline = Arc::new(Pipeline::new(store, notifier.clone(), SubletPolicy::default()));

    let scheduler = Scheduler::new(pipeline, notifier.clone(), HEARTBEAT_EVERY)
        .register(woko, WOKO_EVERY)
        .register(wgzimmer, WGZIMMER_EVERY);

    (tmp, notifier, scheduler)
}

#[tokio::test]
async fn sources_run_on_first_tick_then_wait_their_interval() {
    let woko = FakeScraper::new(Source::Woko, Behaviour::Listings(vec![]));
    let wgzimmer = FakeScraper::new(Source::WgZimmer, Behaviour::Listings(vec![]));
    let (_tmp, _notifier, mut scheduler) = scheduler_with(woko.clone(), wgzimmer.clone()).await;

    let start = Instant::now();
    scheduler.tick(start).await;
    assert_eq!((woko.runs(), wgzimmer.runs()), (1, 1));

    scheduler.tick(start + Duration::from_secs(1)).await;
    assert_eq!((woko.runs(), wgzimmer.runs()), (1, 1));

    scheduler.tick(start + WOKO_EVERY + Duration::from_secs(5)).await;
    assert_eq!((woko.runs(), wgzimmer.runs()), (2, 1));

    scheduler.tick(start + WGZIMMER_EVERY + Duration::from_secs(5)).await;
    assert_eq!((woko.runs(), wgzimmer.runs()), (3, 2));
}

#[tokio::test]
async fn last_run_is_stamped_after_completion() {
    let woko = FakeScraper::new(Source::Woko, Behaviour::Listings(vec![]));
    let wgzimmer = FakeScraper::new(Source::WgZimmer, Behaviour::Listings(vec![]));
    let (_tmp, _notifier, mut scheduler) = scheduler_with(woko, wgzimmer).await;

    let before = Instant::now();
    scheduler.tick(before).await;

    let entry = scheduler.schedule().entry(Source::Woko).unwrap();
    assert!(entry.last_run.unwrap() >= before);
    assert_eq!(entry.interval, WOKO_EVERY);
}

#[tokio::test]
async fn new_listings_flow_through_to_notifications() {
    let woko = FakeScraper::new(
        Source::Woko,
        Behaviour::Listings(vec![
            listing("u1", "Room A", Source::Woko),
            listing("u1", "Room A", Source::Woko),
        ]),
    );
    let wgzimmer = FakeScraper::new(Source::WgZimmer, Behaviour::Listings(vec![]));
    let (_tmp, notifier, mut scheduler) = scheduler_with(woko, wgzimmer).await;

    let start = Instant::now();
    scheduler.tick(start).await;
    scheduler.tick(start + WOKO_EVERY * 2).await;

    assert_eq!(notifier.titles(), vec!["New room from WOKO: Room A"]);
}

#[tokio::test]
async fn failing_source_raises_alert_and_others_keep_running() {
    let woko = FakeScraper::new(Source::Woko, Behaviour::Fail);
    let wgzimmer = FakeScraper::new(
        Source::WgZimmer,
        Behaviour::Listings(vec![listing("w1", "Zürich Wiedikon", Source::WgZimmer)]),
    );
    let (_tmp, notifier, mut scheduler) = scheduler_with(woko.clone(), wgzimmer.clone()).await;

    let start = Instant::now();
    scheduler.tick(start).await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].title, "❌ CRITICAL ERROR: WOKO");
    assert!(sent[0].body.contains("layout changed"));
    assert_eq!(sent[0].tag, "rotating_light");
    assert_eq!(sent[1].title, "New room from WGZimmer: Zürich Wiedikon");

    // The failed source waits a full interval like any other run
    scheduler.tick(start + Duration::from_secs(10)).await;
    assert_eq!(woko.runs(), 1);
    scheduler.tick(start + WOKO_EVERY + Duration::from_secs(5)).await;
    assert_eq!(woko.runs(), 2);
}

#[tokio::test]
async fn panicking_source_is_contained() {
    let woko = FakeScraper::new(Source::Woko, Behaviour::Listings(vec![]));
    let wgzimmer = FakeScraper::new(Source::WgZimmer, Behaviour::Panic);
    let (_tmp, notifier, mut scheduler) = scheduler_with(woko.clone(), wgzimmer).await;

    scheduler.tick(Instant::now()).await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "❌ CRITICAL ERROR: WGZimmer");
    assert!(sent[0].body.contains("parser exploded"));
    assert_eq!(woko.runs(), 1);
}

#[tokio::test]
async fn heartbeat_fires_after_its_interval() {
    let woko = FakeScraper::new(Source::Woko, Behaviour::Listings(vec![]));
    let wgzimmer = FakeScraper::new(Source::WgZimmer, Behaviour::Listings(vec![]));
    let (_tmp, notifier, mut scheduler) = scheduler_with(woko, wgzimmer).await;

    let start = Instant::now();
    scheduler.tick(start).await;
    assert!(notifier.sent().is_empty());

    scheduler.tick(start + HEARTBEAT_EVERY + Duration::from_secs(5)).await;
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "❤️ Scraper Heartbeat");
    assert_eq!(sent[0].tag, "stopwatch");
}

#[tokio::test]
async fn startup_notification_lists_intervals_and_note() {
    let woko = FakeScraper::new(Source::Woko, Behaviour::Listings(vec![]));
    let wgzimmer = FakeScraper::new(Source::WgZimmer, Behaviour::Listings(vec![]));
    let (_tmp, notifier, scheduler) = scheduler_with(woko, wgzimmer).await;

    scheduler.announce_start(Some("deployed v2")).await;

    let sent = notifier.sent();
    assert_eq!(sent[0].title, "✅ Scraper Started");
    assert_eq!(
        sent[0].body,
        "WOKO every 300s, WGZimmer every 1800s. Additional info: deployed v2"
    );
    assert_eq!(sent[0].tag, "rocket");
}
