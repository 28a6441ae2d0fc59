//! Dedup, filter, notify and commit for each scraped batch.

use crate::models::Listing;
use crate::normalizer::SubletPolicy;
use crate::notify::Notifier;
use crate::store::ListingStore;
use std::sync::Arc;
use tracing::info;

/// What happened to one batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSummary {
    pub notified: usize,
    pub suppressed: usize,
    pub already_seen: usize,
}

pub struct Pipeline {
    store: Arc<dyn ListingStore>,
    notifier: Arc<dyn Notifier>,
    policy: SubletPolicy,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn ListingStore>,
        notifier: Arc<dyn Notifier>,
        policy: SubletPolicy,
    ) -> Self {
        Self {
            store,
            notifier,
            policy,
        }
    }

    /// Handle listings in input order.
    ///
    /// Every listing that passes `is_new` is committed once its notify attempt
    /// has been made, including listings the sublet policy suppressed, so no
    /// decision is revisited on a later cycle.
    pub async fn process(&self, listings: &[Listing]) -> ProcessSummary {
        let mut summary = ProcessSummary::default();

        for listing in listings {
            if !self.store.is_new(&listing.id).await {
                summary.already_seen += 1;
                continue;
            }

            if self.policy.suppresses(listing.source, &listing.title) {
                info!("Ignoring {} sublet: {}", listing.source, listing.title);
                summary.suppressed += 1;
            } else {
                info!("Notifying for: {}", listing.title);
                self.notifier
                    .send(
                        &format!("New room from {}: {}", listing.source, listing.title),
                        &listing.details,
                        listing.source.tag(),
                    )
                    .await;
                summary.notified += 1;
            }

            self.store.commit(&listing.id, listing.source).await;
        }

        if summary.notified + summary.suppressed > 0 {
            info!(
                notified = summary.notified,
                suppressed = summary.suppressed,
                "Found {} new listings!",
                summary.notified + summary.suppressed
            );
        } else {
            info!("No new listings found in this batch.");
        }

        summary
    }
}
