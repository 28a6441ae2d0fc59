use crate::models::{Listing, Source};
use anyhow::Result;
use async_trait::async_trait;

/// Common contract for all housing-site adapters.
///
/// Per-region and per-fragment failures are handled inside the adapter; an
/// `Err` here means something unexpected went wrong for the whole source.
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Fetch every configured region and parse it into listings
    async fn fetch_and_parse(&self) -> Result<Vec<Listing>>;

    /// Site this adapter scrapes
    fn source(&self) -> Source;
}
