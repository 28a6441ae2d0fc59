use crate::error::ParseError;
use crate::models::{Listing, Source};
use crate::normalizer::{normalize, RawListing, SubletPolicy};
use crate::scrapers::fetch::{DocumentFetcher, FetchRequest};
use crate::scrapers::text_of;
use crate::scrapers::traits::ScraperTrait;
use anyhow::Result;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// WOKO scraper: one static listing page per region
pub struct WokoScraper {
    fetcher: Arc<dyn DocumentFetcher>,
    base_url: String,
    pages: Vec<String>,
    policy: SubletPolicy,
}

impl WokoScraper {
    pub fn with_params(
        fetcher: Arc<dyn DocumentFetcher>,
        base_url: impl Into<String>,
        pages: Vec<String>,
        policy: SubletPolicy,
    ) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
            pages,
            policy,
        }
    }

    /// Parse every `div.inserat` on a WOKO page.
    ///
    /// Malformed entries are logged and skipped.
    pub fn parse_listings(&self, html: &str) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let item_selector = Selector::parse("div.inserat").unwrap();

        let mut listings = Vec::new();
        for (idx, item) in document.select(&item_selector).enumerate() {
            let raw = match extract_fields(item) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Could not parse WOKO item {}: {}", idx, e);
                    continue;
                }
            };

            match normalize(raw, &self.base_url, &self.policy) {
                Ok(Some(listing)) => listings.push(listing),
                Ok(None) => {}
                Err(e) => warn!("Could not normalize WOKO item {}: {}", idx, e),
            }
        }

        listings
    }
}

fn extract_fields(item: ElementRef<'_>) -> Result<RawListing, ParseError> {
    let link_selector = Selector::parse("a[href]").unwrap();
    let table_selector = Selector::parse("table").unwrap();
    let cell_selector = Selector::parse("td").unwrap();
    let price_selector = Selector::parse("div.preis").unwrap();

    let href = item
        .select(&link_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or(ParseError::MissingField("link"))?;

    // Only the first table holds title, date and address
    let cells: Vec<String> = item
        .select(&table_selector)
        .next()
        .map(|table| table.select(&cell_selector).map(text_of).collect())
        .unwrap_or_default();
    let cell = |idx: usize, name: &'static str| {
        cells
            .get(idx)
            .cloned()
            .ok_or(ParseError::MissingField(name))
    };

    let price = item
        .select(&price_selector)
        .next()
        .map(text_of)
        .ok_or(ParseError::MissingField("price"))?;

    Ok(RawListing::Woko {
        href: href.to_string(),
        title: cell(0, "title")?,
        date: cell(1, "date")?,
        address: cell(3, "address")?,
        price,
    })
}

#[async_trait]
impl ScraperTrait for WokoScraper {
    async fn fetch_and_parse(&self) -> Result<Vec<Listing>> {
        info!("Scraping WOKO...");
        let mut all_rooms = Vec::new();

        for page in &self.pages {
            let html = match self.fetcher.fetch(&FetchRequest::get(page)).await {
                Ok(html) => html,
                Err(e) => {
                    error!("Error fetching WOKO page {}: {}", page, e);
                    continue;
                }
            };

            let rooms = self.parse_listings(&html);
            if rooms.is_empty() {
                warn!("Found 0 listings on WOKO page {}", page);
            } else {
                debug!("Found {} listings on WOKO page {}", rooms.len(), page);
            }
            all_rooms.extend(rooms);
        }

        info!("Found {} listings on WOKO.", all_rooms.len());
        Ok(all_rooms)
    }

    fn source(&self) -> Source {
        Source::Woko
    }
}
