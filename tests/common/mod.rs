#![allow(dead_code)]

use async_trait::async_trait;
use room_finder::models::{Listing, Source};
use room_finder::notify::Notifier;
use room_finder::store::{ListingStore, SqliteStore};
use std::io;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing::subscriber::DefaultGuard;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub title: String,
    pub body: String,
    pub tag: String,
}

/// Notifier that only remembers what it was asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.title).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, title: &str, body: &str, tag: &str) {
        self.sent.lock().unwrap().push(Sent {
            title: title.to_string(),
            body: body.to_string(),
            tag: tag.to_string(),
        });
    }
}

pub fn listing(id: &str, title: &str, source: Source) -> Listing {
    Listing {
        id: id.to_string(),
        title: title.to_string(),
        details: format!("Price: 650 | URL: {id}"),
        source,
    }
}

/// Fresh initialized store in a temp dir; keep the `TempDir` alive for the test
pub async fn temp_store() -> (TempDir, Arc<SqliteStore>) {
    let tmp = TempDir::new().unwrap();
    let store = SqliteStore::connect(&tmp.path().join("data/listings.db"))
        .await
        .unwrap();
    store.initialize().await.unwrap();
    (tmp, Arc::new(store))
}

/// Collects formatted log lines emitted on the current thread
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Route this thread's tracing output into the buffer until the guard drops
    pub fn install(&self) -> DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
