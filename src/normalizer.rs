//! Mapping of site-specific fields into [`Listing`], plus the sublet content filter.

use crate::error::ParseError;
use crate::models::{Listing, Source};
use reqwest::Url;
use tracing::info;

const SUBLET_MARKER: &str = "sublet";

/// Content filter for temporary sublets.
///
/// WOKO advertises sublets alongside regular rooms and marks them in the title.
/// WGZimmer sublets are excluded by the search form itself, so only WOKO titles
/// are inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubletPolicy {
    pub ignore_sublets: bool,
}

impl Default for SubletPolicy {
    fn default() -> Self {
        Self {
            ignore_sublets: true,
        }
    }
}

impl SubletPolicy {
    pub fn new(ignore_sublets: bool) -> Self {
        Self { ignore_sublets }
    }

    pub fn suppresses(&self, source: Source, title: &str) -> bool {
        self.ignore_sublets
            && source == Source::Woko
            && title.to_lowercase().contains(SUBLET_MARKER)
    }
}

/// Fields pulled out of one listing fragment, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawListing {
    Woko {
        href: String,
        title: String,
        date: String,
        address: String,
        price: String,
    },
    WgZimmer {
        href: String,
        location: Option<String>,
        price: String,
        available_from: String,
        posted: Option<String>,
        region_name: String,
    },
}

impl RawListing {
    pub fn source(&self) -> Source {
        match self {
            RawListing::Woko { .. } => Source::Woko,
            RawListing::WgZimmer { .. } => Source::WgZimmer,
        }
    }

    fn href(&self) -> &str {
        match self {
            RawListing::Woko { href, .. } | RawListing::WgZimmer { href, .. } => href,
        }
    }
}

/// Join a site base URL and a fragment link into the canonical listing id
pub fn absolute_link(base_url: &str, href: &str) -> Result<String, ParseError> {
    let invalid = |reason: String| ParseError::InvalidLink {
        href: href.to_string(),
        reason,
    };

    if href.trim().is_empty() {
        return Err(ParseError::MissingField("link"));
    }

    let base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    let url = base.join(href.trim()).map_err(|e| invalid(e.to_string()))?;
    Ok(url.to_string())
}

/// Build a [`Listing`] from raw fields.
///
/// Returns `Ok(None)` when the sublet policy suppresses the listing. Such
/// listings are dropped here and never reach the store.
pub fn normalize(
    raw: RawListing,
    base_url: &str,
    policy: &SubletPolicy,
) -> Result<Option<Listing>, ParseError> {
    let source = raw.source();
    let url = absolute_link(base_url, raw.href())?;

    let listing = match raw {
        RawListing::Woko {
            title,
            date,
            address,
            price,
            ..
        } => {
            if policy.suppresses(source, &title) {
                info!("Ignoring WOKO sublet based on title: {}", title);
                return Ok(None);
            }
            Listing {
                title: format!("{} ({})", title, date),
                details: format!("Price: {}, Address: {}\nLink: {}", price, address, url),
                id: url,
                source,
            }
        }
        RawListing::WgZimmer {
            location,
            price,
            available_from,
            posted,
            region_name,
            ..
        } => Listing {
            title: format!(
                "{} [{}]",
                location.as_deref().unwrap_or("N/A"),
                region_name
            ),
            details: format!(
                "Price: {} | Available: {} | Posted: {} | URL: {}",
                price,
                available_from,
                posted.as_deref().unwrap_or("N/A"),
                url
            ),
            id: url,
            source,
        },
    };

    Ok(Some(listing))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn woko(title: &str) -> RawListing {
        RawListing::Woko {
            href: "/en/zimmer-in-zuerich-details/1234".to_string(),
            title: title.to_string(),
            date: "01.11.2026".to_string(),
            address: "Hönggerstrasse 1, 8037 Zürich".to_string(),
            price: "650.--".to_string(),
        }
    }

    #[test]
    fn woko_listing_uses_absolute_url_as_id() {
        let base = "https://www.woko.ch";
        let listing = normalize(woko("Room in shared flat"), base, &SubletPolicy::default())
            .unwrap()
            .unwrap();

        assert_eq!(listing.id, "https://www.woko.ch/en/zimmer-in-zuerich-details/1234");
        assert_eq!(listing.title, "Room in shared flat (01.11.2026)");
        assert_eq!(
            listing.details,
            "Price: 650.--, Address: Hönggerstrasse 1, 8037 Zürich\nLink: https://www.woko.ch/en/zimmer-in-zuerich-details/1234"
        );
        assert_eq!(listing.source, Source::Woko);
    }

    #[test]
    fn woko_sublet_is_dropped_when_policy_enabled() {
        let base = "https://www.woko.ch";
        assert!(normalize(woko("Sublet: room until March"), base, &SubletPolicy::new(true))
            .unwrap()
            .is_none());
        assert!(normalize(woko("SUBLET room"), base, &SubletPolicy::new(false))
            .unwrap()
            .is_some());
    }

    #[test]
    fn wgzimmer_sublet_marker_is_not_inspected() {
        let policy = SubletPolicy::new(true);
        assert!(!policy.suppresses(Source::WgZimmer, "Sublet in Oerlikon"));
        assert!(policy.suppresses(Source::Woko, "Sublet in Oerlikon"));
    }

    #[test]
    fn wgzimmer_missing_optional_fields_render_as_na() {
        let raw = RawListing::WgZimmer {
            href: "/en/wgzimmer/rooms/abc.html".to_string(),
            location: None,
            price: "SFr. 700.00".to_string(),
            available_from: "1.12.2026".to_string(),
            posted: None,
            region_name: "Zurich (City)".to_string(),
        };

        let listing = normalize(raw, "https://www.wgzimmer.ch", &SubletPolicy::default())
            .unwrap()
            .unwrap();

        assert_eq!(listing.title, "N/A [Zurich (City)]");
        assert!(listing.details.contains("Posted: N/A"));
        assert_eq!(listing.id, "https://www.wgzimmer.ch/en/wgzimmer/rooms/abc.html");
    }

    #[test]
    fn empty_link_is_a_parse_error() {
        let err = absolute_link("https://www.woko.ch", "  ").unwrap_err();
        assert!(matches!(err, ParseError::MissingField("link")));
    }
}
