//! Item Fetch Client for the persisted-query API
//!
//! Every read is a GET against `/api/v3/{operation}/{hash}/` carrying the
//! operation name, an encoded listing id in `variables`, and the hash again
//! inside the persisted-query `extensions` envelope. The response shape is
//! opaque to the pipeline beyond unwrapping the `data.presentation` envelope.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

use crate::domain::{GraphQlOperation, OperationHashes, QueryHash};
use crate::infrastructure::http_client::HttpClient;

/// Fetches one listing's payload given a sufficient hash set.
///
/// Implementations perform no retry; every failure propagates to the batch
/// orchestrator, which turns it into a degraded record.
#[async_trait]
pub trait ListingFetcher: Send + Sync {
    async fn fetch(&self, listing_id: &str, hashes: &OperationHashes) -> Result<Value>;
}

/// Production fetch client backed by the rate-limited [`HttpClient`].
pub struct ListingApiClient {
    http: HttpClient,
    api_domain: String,
    locale: String,
    currency: String,
}

impl ListingApiClient {
    pub fn new(http: HttpClient, api_domain: &str, locale: &str, currency: &str) -> Self {
        Self {
            http,
            api_domain: api_domain.trim_end_matches('/').to_string(),
            locale: locale.to_string(),
            currency: currency.to_string(),
        }
    }

    fn endpoint(&self, operation: GraphQlOperation, hash: &QueryHash) -> String {
        format!(
            "{}/api/v3/{}/{}/",
            self.api_domain,
            operation.wire_name(),
            hash.as_str()
        )
    }

    async fn call(
        &self,
        operation: GraphQlOperation,
        hash: &QueryHash,
        variables: Value,
    ) -> Result<Value> {
        let variables = serde_json::to_string(&variables)
            .with_context(|| format!("Failed to encode variables for {operation}"))?;
        let extensions = json!({
            "persistedQuery": { "version": 1, "sha256Hash": hash.as_str() }
        })
        .to_string();

        self.http
            .get_json(
                &self.endpoint(operation, hash),
                &[
                    ("operationName", operation.wire_name()),
                    ("locale", &self.locale),
                    ("currency", &self.currency),
                    ("variables", &variables),
                    ("extensions", &extensions),
                ],
            )
            .await
            .with_context(|| format!("{operation} request failed"))
    }

    async fn fetch_sections(&self, encoded_id: &str, hash: &QueryHash) -> Result<Value> {
        self.call(
            GraphQlOperation::StaysPdpSections,
            hash,
            json!({
                "id": encoded_id,
                "pdpSectionsRequest": { "layouts": ["SIDEBAR", "SINGLE_COLUMN"] }
            }),
        )
        .await
    }

    async fn fetch_price(&self, encoded_id: &str, hash: &QueryHash) -> Result<Value> {
        // The checkout query refuses to price without a concrete stay window;
        // a one-night stay a week out is always bookable-shaped.
        let check_in = (Utc::now() + Duration::days(7)).format("%Y-%m-%d").to_string();
        let check_out = (Utc::now() + Duration::days(8)).format("%Y-%m-%d").to_string();

        self.call(
            GraphQlOperation::StayCheckout,
            hash,
            json!({
                "input": {
                    "businessTravel": { "workTrip": false },
                    "checkinDate": check_in,
                    "checkoutDate": check_out,
                    "guestCounts": { "numberOfAdults": 2, "numberOfChildren": 0, "numberOfInfants": 0 },
                    "listingDetail": { "id": encoded_id }
                }
            }),
        )
        .await
    }
}

#[async_trait]
impl ListingFetcher for ListingApiClient {
    /// Fetches sections (mandatory) and pricing (best-effort enrichment,
    /// skipped when its hash is unresolved) and merges them into one payload.
    async fn fetch(&self, listing_id: &str, hashes: &OperationHashes) -> Result<Value> {
        let sections_hash = hashes
            .get(GraphQlOperation::StaysPdpSections)
            .context("No hash resolved for StaysPdpSections")?;
        let encoded_id = encode_listing_id(listing_id);

        let sections = self.fetch_sections(&encoded_id, sections_hash).await?;

        let price = match hashes.get(GraphQlOperation::StayCheckout) {
            Some(hash) => Some(self.fetch_price(&encoded_id, hash).await?),
            None => {
                tracing::warn!(listing_id, "no stayCheckout hash, skipping price data");
                None
            }
        };

        Ok(normalize_payload(sections, price))
    }
}

/// Encodes a raw listing id into the opaque global id the API expects.
pub fn encode_listing_id(listing_id: &str) -> String {
    BASE64.encode(format!("StayListing:{listing_id}"))
}

/// Merges the two raw responses into the record payload, unwrapping the
/// GraphQL `data.presentation` envelope where present.
pub fn normalize_payload(sections: Value, price: Option<Value>) -> Value {
    let mut data = Map::new();
    data.insert("sections".to_string(), unwrap_presentation(sections));
    if let Some(price) = price {
        data.insert("price".to_string(), unwrap_presentation(price));
    }
    Value::Object(data)
}

fn unwrap_presentation(mut body: Value) -> Value {
    if let Some(presentation) = body
        .get_mut("data")
        .and_then(|data| data.get_mut("presentation"))
    {
        return presentation.take();
    }
    body
}
