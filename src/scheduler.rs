//! Single control loop firing each source on its own interval.

use crate::models::Source;
use crate::notify::Notifier;
use crate::pipeline::Pipeline;
use crate::scrapers::ScraperTrait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Interval and last completion time of one recurring job
#[derive(Debug, Clone, Copy)]
pub struct ScheduleEntry {
    pub interval: Duration,
    pub last_run: Option<Instant>,
}

impl ScheduleEntry {
    /// A job that has never run is due right away
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    pub fn starting_at(interval: Duration, at: Instant) -> Self {
        Self {
            interval,
            last_run: Some(at),
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.interval,
        }
    }
}

/// Timing state of every source plus the heartbeat
#[derive(Debug, Clone)]
pub struct Schedule {
    sources: HashMap<Source, ScheduleEntry>,
    heartbeat: ScheduleEntry,
}

impl Schedule {
    pub fn new(heartbeat_interval: Duration, started_at: Instant) -> Self {
        Self {
            sources: HashMap::new(),
            heartbeat: ScheduleEntry::starting_at(heartbeat_interval, started_at),
        }
    }

    pub fn entry(&self, source: Source) -> Option<&ScheduleEntry> {
        self.sources.get(&source)
    }

    fn is_due(&self, source: Source, now: Instant) -> bool {
        self.sources.get(&source).is_some_and(|e| e.is_due(now))
    }

    fn mark_run(&mut self, source: Source, at: Instant) {
        if let Some(entry) = self.sources.get_mut(&source) {
            entry.last_run = Some(at);
        }
    }
}

pub struct Scheduler {
    scrapers: Vec<Arc<dyn ScraperTrait>>,
    schedule: Schedule,
    pipeline: Arc<Pipeline>,
    notifier: Arc<dyn Notifier>,
    tick_interval: Duration,
}

impl Scheduler {
    pub fn new(pipeline: Arc<Pipeline>, notifier: Arc<dyn Notifier>, heartbeat: Duration) -> Self {
        Self {
            scrapers: Vec::new(),
            schedule: Schedule::new(heartbeat, Instant::now()),
            pipeline,
            notifier,
            tick_interval: Duration::from_secs(1),
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick_interval = tick;
        self
    }

    /// Add a source that runs every `interval`, starting on the first tick
    pub fn register(mut self, scraper: Arc<dyn ScraperTrait>, interval: Duration) -> Self {
        self.schedule
            .sources
            .insert(scraper.source(), ScheduleEntry::new(interval));
        self.scrapers.push(scraper);
        self
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Send the startup notification listing every source's interval
    pub async fn announce_start(&self, note: Option<&str>) {
        let intervals = self
            .scrapers
            .iter()
            .filter_map(|s| {
                let entry = self.schedule.entry(s.source())?;
                Some(format!("{} every {}s", s.source(), entry.interval.as_secs()))
            })
            .collect::<Vec<_>>()
            .join(", ");

        let extra = note
            .map(|n| format!(" Additional info: {n}"))
            .unwrap_or_default();

        self.notifier
            .send("✅ Scraper Started", &format!("{intervals}.{extra}"), "rocket")
            .await;
    }

    pub async fn run_forever(&mut self) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.tick(Instant::now()).await;
        }
    }

    /// One pass of the control loop: run every due source, then the heartbeat.
    ///
    /// `last_run` is stamped after a source finishes, so the next run comes at
    /// least one interval after the previous one ended.
    pub async fn tick(&mut self, now: Instant) {
        for idx in 0..self.scrapers.len() {
            let scraper = Arc::clone(&self.scrapers[idx]);
            let source = scraper.source();
            if !self.schedule.is_due(source, now) {
                continue;
            }

            self.run_source(scraper).await;
            self.schedule.mark_run(source, Instant::now());
        }

        if self.schedule.heartbeat.is_due(now) {
            info!("Sending heartbeat notification...");
            self.notifier
                .send(
                    "❤️ Scraper Heartbeat",
                    "The application is still up and running.",
                    "stopwatch",
                )
                .await;
            self.schedule.heartbeat.last_run = Some(Instant::now());
        }
    }

    /// Scrape and process one source, containing any error or panic it raises
    async fn run_source(&self, scraper: Arc<dyn ScraperTrait>) {
        let source = scraper.source();
        let pipeline = Arc::clone(&self.pipeline);

        let outcome = tokio::spawn(async move {
            let listings = scraper.fetch_and_parse().await?;
            Ok::<_, anyhow::Error>(pipeline.process(&listings).await)
        })
        .await;

        let failure = match outcome {
            Ok(Ok(summary)) => {
                debug!(source = %source, ?summary, "Source run finished");
                return;
            }
            Ok(Err(e)) => format!("{e:#}"),
            Err(e) if e.is_panic() => format!("panicked: {}", panic_message(e.into_panic())),
            Err(e) => e.to_string(),
        };

        error!(source = %source, "{} scraper failed catastrophically: {}", source, failure);
        self.notifier
            .send(
                &format!("❌ CRITICAL ERROR: {source}"),
                &format!("The {source} scraper has crashed: {failure}"),
                "rotating_light",
            )
            .await;
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
