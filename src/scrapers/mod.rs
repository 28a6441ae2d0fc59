pub mod browser;
pub mod fetch;
pub mod traits;
pub mod types;
pub mod wgzimmer;
pub mod woko;

pub use browser::ChromeFetcher;
pub use fetch::{DocumentFetcher, FetchRequest, FetchedPage, HttpFetcher, InteractionStep};
pub use traits::ScraperTrait;
pub use types::{Region, RegionTable, SearchCriteria};
pub use wgzimmer::{WgZimmerScraper, WgZimmerSite};
pub use woko::WokoScraper;

use scraper::ElementRef;

/// Text content of an element with whitespace runs collapsed
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
