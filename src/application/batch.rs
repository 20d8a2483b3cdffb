//! Batch Fetch Orchestrator
//!
//! One record per identifier, in input order, strictly sequential: the remote
//! API is not safe to hit concurrently from one session. A failed identifier
//! becomes a degraded record and never aborts the rest of the batch.

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::{ListingRecord, OperationHashes};
use crate::infrastructure::graphql_api::ListingFetcher;

/// Fetches every identifier, converting per-item failures into degraded
/// records. The output always has exactly one record per input id.
pub async fn fetch_all<F: ListingFetcher + ?Sized>(
    fetcher: &F,
    listing_ids: &[String],
    hashes: &OperationHashes,
) -> Vec<ListingRecord> {
    let total = listing_ids.len();
    info!(total, "starting listing fetch batch");

    let mut records = Vec::with_capacity(total);
    for (index, listing_id) in listing_ids.iter().enumerate() {
        info!(listing_id, progress = %format!("{}/{total}", index + 1), "fetching listing");

        let record = match fetcher.fetch(listing_id, hashes).await {
            Ok(data) => ListingRecord::fetched(listing_id, data, Utc::now()),
            Err(error) => {
                let rendered = format!("{error:#}");
                warn!(listing_id, error = %rendered, "listing fetch failed, recording degraded entry");
                ListingRecord::degraded(listing_id, rendered)
            }
        };
        records.push(record);
    }

    let degraded = records.iter().filter(|r| r.is_degraded()).count();
    info!(total, degraded, "listing fetch batch finished");
    records
}
