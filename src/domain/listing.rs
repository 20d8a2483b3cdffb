//! Listing records produced by the fetch stage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One crawled listing, successful or degraded.
///
/// A degraded record carries the error string in place of data so that a
/// failed identifier still occupies its slot in the output file and gets
/// retried naturally on the next run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRecord {
    pub listing_id: String,
    /// Merged sections/price payload; an empty object on failure.
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// `None` (serialized as null) for degraded records.
    pub fetch_date: Option<DateTime<Utc>>,
}

impl ListingRecord {
    /// A successfully fetched record, stamped with the fetch time.
    pub fn fetched(listing_id: impl Into<String>, data: Value, fetched_at: DateTime<Utc>) -> Self {
        Self {
            listing_id: listing_id.into(),
            data,
            error: None,
            fetch_date: Some(fetched_at),
        }
    }

    /// A degraded record for an identifier whose fetch failed: empty data,
    /// the rendered error, and no timestamp.
    pub fn degraded(listing_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            listing_id: listing_id.into(),
            data: Value::Object(Default::default()),
            error: Some(error.into()),
            fetch_date: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}
