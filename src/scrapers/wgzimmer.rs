use crate::config::WgZimmerConfig;
use crate::error::ParseError;
use crate::models::{Listing, Source};
use crate::normalizer::{normalize, RawListing};
use crate::scrapers::fetch::{DocumentFetcher, FetchRequest, FetchedPage, InteractionStep};
use crate::scrapers::text_of;
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::{Region, RegionTable, SearchCriteria};
use anyhow::Result;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const CONSENT_BUTTON: &str = ".fc-cta-consent";
const AD_SLOT_CLASS: &str = "search-result-entry-slot";
const REAL_RESULT: &str = "li.search-result-entry:not(.search-result-entry-slot)";

/// Site-level settings for wgzimmer.ch
#[derive(Debug, Clone)]
pub struct WgZimmerSite {
    pub base_url: String,
    pub search_url: String,
    pub consent_timeout: Duration,
    pub results_timeout: Duration,
    pub debug_dir: Option<PathBuf>,
}

impl WgZimmerSite {
    pub fn from_config(config: &WgZimmerConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            search_url: config.search_url.clone(),
            consent_timeout: Duration::from_secs(config.consent_timeout_secs),
            results_timeout: Duration::from_secs(config.results_timeout_secs),
            debug_dir: config.debug_dir.clone(),
        }
    }
}

impl Default for WgZimmerSite {
    fn default() -> Self {
        Self::from_config(&WgZimmerConfig::default())
    }
}

/// WGZimmer scraper: submits the search form once per region
pub struct WgZimmerScraper {
    fetcher: Arc<dyn DocumentFetcher>,
    site: WgZimmerSite,
    criteria: SearchCriteria,
    regions: RegionTable,
}

impl WgZimmerScraper {
    pub fn with_params(
        fetcher: Arc<dyn DocumentFetcher>,
        site: WgZimmerSite,
        criteria: SearchCriteria,
        regions: RegionTable,
    ) -> Self {
        Self {
            fetcher,
            site,
            criteria,
            regions,
        }
    }

    /// Page interactions that run a search for one region
    pub fn search_request(&self, region: &Region) -> FetchRequest {
        let mut request = FetchRequest::get(&self.site.search_url).with_step(
            InteractionStep::Click {
                selector: CONSENT_BUTTON.to_string(),
                timeout: self.site.consent_timeout,
                optional: true,
            },
        );

        let bounds = [
            ("priceMin", self.criteria.min_price),
            ("priceMax", self.criteria.max_price),
        ];
        for (name, bound) in bounds {
            if let Some(value) = bound {
                request = request.with_step(InteractionStep::SelectOption {
                    selector: format!("select[name=\"{name}\"]"),
                    value: value.to_string(),
                    optional: true,
                });
            }
        }

        if self.site.debug_dir.is_some() {
            request = request.with_screenshot();
        }

        request
            .with_step(InteractionStep::SelectOption {
                selector: "select[name=\"wgState\"]".to_string(),
                value: region.code.clone(),
                optional: false,
            })
            .with_step(InteractionStep::SubmitWithEnter {
                selector: "input[name=\"query\"]".to_string(),
            })
            .with_step(InteractionStep::WaitForSelector {
                selector: REAL_RESULT.to_string(),
                timeout: self.site.results_timeout,
            })
    }

    /// Parse the search results of one region, skipping ad slots and malformed entries
    pub fn parse_listings(&self, html: &str, region_name: &str) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let result_selector = Selector::parse("li.search-result-entry").unwrap();

        let mut listings = Vec::new();
        for (idx, result) in document.select(&result_selector).enumerate() {
            if result.value().classes().any(|c| c == AD_SLOT_CLASS) {
                debug!("Skipping ad slot {}", idx);
                continue;
            }

            let raw = match extract_fields(result, region_name) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Could not parse WGZimmer result {}: {}", idx, e);
                    continue;
                }
            };

            match normalize(raw, &self.site.base_url, &self.criteria.sublets) {
                Ok(Some(listing)) => listings.push(listing),
                Ok(None) => {}
                Err(e) => warn!("Could not normalize WGZimmer result {}: {}", idx, e),
            }
        }

        listings
    }

    async fn dump_debug_page(&self, region: &Region, page: &FetchedPage) {
        let Some(dir) = &self.site.debug_dir else {
            return;
        };

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!("Could not create debug dir {}: {}", dir.display(), e);
            return;
        }

        let base = format!("debug_page_{}", region.code);
        if let Some(png) = &page.screenshot {
            let path = dir.join(format!("{base}.png"));
            match tokio::fs::write(&path, png).await {
                Ok(()) => warn!("Screenshot saved to: {}", path.display()),
                Err(e) => warn!("Could not save screenshot {}: {}", path.display(), e),
            }
        }

        let path = dir.join(format!("{base}.html"));
        match tokio::fs::write(&path, &page.html).await {
            Ok(()) => warn!("HTML content saved to: {}", path.display()),
            Err(e) => warn!("Could not save debug page {}: {}", path.display(), e),
        }
    }
}

fn extract_fields(result: ElementRef<'_>, region_name: &str) -> Result<RawListing, ParseError> {
    let link_selector = Selector::parse("a[href]").unwrap();
    let location_selector = Selector::parse("span.thumbState").unwrap();
    let strong_selector = Selector::parse("strong").unwrap();
    let cost_selector = Selector::parse("span.cost").unwrap();
    let date_selector = Selector::parse("span.from-date").unwrap();
    let posted_selector = Selector::parse("div.create-date").unwrap();

    let link = result
        .select(&link_selector)
        .next()
        .ok_or(ParseError::MissingField("link"))?;
    let href = link.value().attr("href").unwrap_or_default();

    let location_tag = link
        .select(&location_selector)
        .next()
        .ok_or(ParseError::MissingField("location"))?;
    let price = link
        .select(&cost_selector)
        .next()
        .map(text_of)
        .ok_or(ParseError::MissingField("price"))?;
    let available_from = link
        .select(&date_selector)
        .next()
        .map(text_of)
        .ok_or(ParseError::MissingField("availability date"))?;

    Ok(RawListing::WgZimmer {
        href: href.to_string(),
        location: location_tag.select(&strong_selector).next().map(text_of),
        price,
        available_from,
        posted: result.select(&posted_selector).next().map(text_of),
        region_name: region_name.to_string(),
    })
}

#[async_trait]
impl ScraperTrait for WgZimmerScraper {
    async fn fetch_and_parse(&self) -> Result<Vec<Listing>> {
        info!("--- Starting WGZimmer scrape ---");

        let regions = self.regions.resolve(&self.criteria.regions);
        if regions.is_empty() {
            warn!("No valid cities configured for WGZimmer scrape.");
            return Ok(Vec::new());
        }

        let mut all_rooms = Vec::new();
        for region in &regions {
            info!("-> WGZimmer: Searching in: {}...", region.name);

            let page = match self.fetcher.fetch_page(&self.search_request(region)).await {
                Ok(page) => page,
                Err(e) => {
                    error!("WGZimmer search failed for {}: {}", region.name, e);
                    continue;
                }
            };

            let rooms = self.parse_listings(&page.html, &region.name);
            if rooms.is_empty() {
                warn!("Found 0 listings in {}.", region.name);
                self.dump_debug_page(region, &page).await;
            } else {
                info!("Found {} listings in {}.", rooms.len(), region.name);
            }
            all_rooms.extend(rooms);
        }

        info!(
            "--- WGZimmer scrape complete. Found a total of {} listings. ---",
            all_rooms.len()
        );
        Ok(all_rooms)
    }

    fn source(&self) -> Source {
        Source::WgZimmer
    }
}
