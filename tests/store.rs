// tests/store.rs
mod common;

use chrono::{TimeZone, Utc};
use room_finder::error::StoreError;
use room_finder::models::Source;
use room_finder::store::{ListingStore, SqliteStore};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tempfile::TempDir;

/// Write a row directly, bypassing `commit`
async fn insert_raw(path: &Path, id: &str, added_at: &str) {
    let pool = SqlitePool::connect_with(SqliteConnectOptions::new().filename(path))
        .await
        .unwrap();
    sqlx::query("INSERT INTO listings (id, source, added_at) VALUES (?, 'WOKO', ?)")
        .bind(id)
        .bind(added_at)
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;
}

#[tokio::test]
async fn id_is_new_until_committed() {
    let (_tmp, store) = common::temp_store().await;
    let id = "https://www.woko.ch/en/zimmer-in-zuerich-details/1001";

    assert!(store.is_new(id).await);
    assert!(store.commit(id, Source::Woko).await);
    assert!(!store.is_new(id).await);
}

#[tokio::test]
async fn recommitting_is_a_silent_no_op() {
    let (_tmp, store) = common::temp_store().await;
    let id = "https://www.wgzimmer.ch/en/wgzimmer/rooms/a.html";

    assert!(store.commit(id, Source::WgZimmer).await);
    let first = store.record(id).await.unwrap().unwrap();

    assert!(!store.commit(id, Source::WgZimmer).await);
    assert_eq!(store.count().await.unwrap(), 1);

    let second = store.record(id).await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(second.source, "WGZimmer");
}

#[tokio::test]
async fn initialize_is_idempotent() {
    let (_tmp, store) = common::temp_store().await;
    store.commit("u1", Source::Woko).await;

    store.initialize().await.unwrap();
    store.initialize().await.unwrap();

    assert!(!store.is_new("u1").await);
}

#[tokio::test]
async fn records_survive_reopening() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("listings.db");

    {
        let store = SqliteStore::connect(&path).await.unwrap();
        store.initialize().await.unwrap();
        store.commit("u1", Source::Woko).await;
        store.close().await;
    }

    let reopened = SqliteStore::connect(&path).await.unwrap();
    reopened.initialize().await.unwrap();
    assert!(!reopened.is_new("u1").await);
    assert!(reopened.is_new("u2").await);
}

#[tokio::test]
async fn unreadable_store_fails_closed() {
    let (_tmp, store) = common::temp_store().await;
    store.close().await;

    let logs = common::LogCapture::default();
    let _guard = logs.install();

    assert!(!store.is_new("never-seen").await);
    assert!(!store.commit("never-seen", Source::Woko).await);

    let output = logs.contents();
    assert!(output.contains("ERROR"), "{output}");
    assert!(output.contains("Error checking listing ID"), "{output}");
    assert!(output.contains("listing_id=\"never-seen\""), "{output}");
}

#[tokio::test]
async fn sqlite_default_timestamps_are_read_as_utc() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("listings.db");
    let store = SqliteStore::connect(&path).await.unwrap();
    store.initialize().await.unwrap();

    insert_raw(&path, "legacy", "2025-03-14 09:26:53").await;

    let record = store.record("legacy").await.unwrap().unwrap();
    assert_eq!(
        record.added_at,
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    );
}

#[tokio::test]
async fn garbage_timestamp_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("listings.db");
    let store = SqliteStore::connect(&path).await.unwrap();
    store.initialize().await.unwrap();

    insert_raw(&path, "broken", "yesterday-ish").await;

    let err = store.record("broken").await.unwrap_err();
    assert!(matches!(err, StoreError::Timestamp { ref id, .. } if id == "broken"));
    assert!(!store.is_new("broken").await);
}

#[tokio::test]
async fn missing_table_fails_closed() {
    let tmp = TempDir::new().unwrap();
    let store = SqliteStore::connect(&tmp.path().join("uninitialized.db"))
        .await
        .unwrap();

    assert!(!store.is_new("u1").await);
}
