// src/services/writer.rs
use log::{debug, warn};
use std::sync::Arc;

use crate::error::Result;
use crate::models::RunCounts;
use crate::services::normalize::NormalizedAuction;
use crate::services::store::{ApplyOutcome, AuctionStore};

/// Applies normalized auctions to the store, row by row.
pub struct UpsertWriter<S: AuctionStore + ?Sized> {
    store: Arc<S>,
}

impl<S: AuctionStore + ?Sized> UpsertWriter<S> {
    pub fn new(store: Arc<S>) -> Self {
        UpsertWriter { store }
    }

    /// Writes the batch in order. Counters in `counts` are updated as each row
    /// lands, so after an error they describe exactly what was applied.
    pub async fn apply_batch(&self, batch: &[NormalizedAuction], counts: &mut RunCounts) -> Result<()> {
        for item in batch {
            // Security first: an auction must never reference a missing CUSIP.
            if self.store.insert_security_if_absent(&item.security).await? {
                debug!("New security {}", item.security.cusip);
            }

            let outcome = self.store.upsert_auction(&item.auction).await?;
            match outcome {
                ApplyOutcome::Inserted(_) => counts.records_inserted += 1,
                ApplyOutcome::Updated(id) => {
                    debug!("Auction {} (id {}) updated", item.auction.key(), id);
                    counts.records_updated += 1
                }
                ApplyOutcome::Unchanged(_) => counts.records_unchanged += 1,
            }

            if let Some(detail) = &item.bidder_detail {
                self.store
                    .upsert_bidder_detail(outcome.auction_id(), detail)
                    .await?;
            }

            if item.has_bound_violation() {
                warn!(
                    "Auction {} written with out-of-bound values: {:?}",
                    item.auction.key(),
                    item.warnings
                );
                counts.bound_violations += 1;
            }
        }
        Ok(())
    }
}
