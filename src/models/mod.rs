use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Site a listing was scraped from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Source {
    /// woko.ch, a plain listing page
    Woko,
    /// wgzimmer.ch, an interactive search form
    WgZimmer,
}

impl Source {
    /// Name used in notifications and in the `source` column of the store
    pub fn display_name(self) -> &'static str {
        match self {
            Source::Woko => "WOKO",
            Source::WgZimmer => "WGZimmer",
        }
    }

    /// ntfy tag attached to new-listing notifications
    pub fn tag(self) -> &'static str {
        match self {
            Source::Woko => "house",
            Source::WgZimmer => "bed",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Normalized room listing, shared by every source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    /// Absolute detail-page URL, stable across scrapes
    pub id: String,
    pub title: String,
    pub details: String,
    pub source: Source,
}

/// Row of the dedup store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupRecord {
    pub id: String,
    pub source: String,
    pub added_at: DateTime<Utc>,
}
