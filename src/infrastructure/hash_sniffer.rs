//! Request Hash Extractor
//!
//! Drives one headless Chromium session over the DevTools protocol, navigates
//! to a listing page, and passively observes every outgoing request. GET
//! requests under the `/api/v3/` namespace carry the persisted-query hash as
//! the path segment after the operation name; those are harvested into an
//! [`OperationHashes`] set.
//!
//! Request events fold through the pure [`observe_request`] function, so the
//! extraction logic is testable without a browser. The session is torn down
//! on every exit path.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::EventRequestWillBeSent;
use chromiumoxide::Page;
use futures::StreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::domain::{GraphQlOperation, OperationHashes, QueryHash};

static HASH_PATTERNS: Lazy<Vec<(GraphQlOperation, Regex)>> = Lazy::new(|| {
    GraphQlOperation::ALL
        .iter()
        .map(|op| {
            let pattern = format!("/api/v3/{}/([a-f0-9]{{64}})", op.wire_name());
            (*op, Regex::new(&pattern).expect("operation patterns are valid regexes"))
        })
        .collect()
});

/// Observes one live page and returns whatever hashes it surfaced.
///
/// A partially filled result is acceptable; the coordinator decides whether
/// it is sufficient.
#[async_trait]
pub trait HashExtractor: Send + Sync {
    async fn extract(&self, listing_id: &str) -> Result<OperationHashes>;
}

/// Production extractor backed by a headless Chromium session.
pub struct HashSniffer {
    site: String,
    dialog_close_label: String,
    page_settle: Duration,
    request_idle: Duration,
}

impl HashSniffer {
    pub fn new(
        site: &str,
        dialog_close_label: &str,
        page_settle_ms: u64,
        request_idle_ms: u64,
    ) -> Self {
        Self {
            site: site.trim_end_matches('/').to_string(),
            dialog_close_label: dialog_close_label.to_string(),
            page_settle: Duration::from_millis(page_settle_ms),
            request_idle: Duration::from_millis(request_idle_ms),
        }
    }

    async fn sniff(&self, browser: &Browser, listing_id: &str) -> Result<OperationHashes> {
        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open a browser page")?;

        // Subscribe before navigation so early requests are not missed.
        let mut requests = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .context("Failed to subscribe to network events")?;

        let url = format!("{}/rooms/{}", self.site, listing_id);
        info!(listing_id, %url, "sniffing listing page for operation hashes");

        // A failed navigation still leaves any already-captured requests
        // worth inspecting.
        if let Err(error) = page.goto(url.as_str()).await {
            warn!(listing_id, %error, "navigation failed, draining captured requests anyway");
        }

        self.dismiss_dialog(&page).await;
        tokio::time::sleep(self.page_settle).await;

        let mut hashes = OperationHashes::default();
        loop {
            match tokio::time::timeout(self.request_idle, requests.next()).await {
                Ok(Some(event)) => {
                    hashes = observe_request(hashes, &event.request.method, &event.request.url);
                }
                // Stream closed or idle gap reached: the page is done talking.
                Ok(None) | Err(_) => break,
            }
        }

        info!(
            listing_id,
            resolved = hashes.resolved_count(),
            sufficient = hashes.is_sufficient(),
            "hash sniffing finished"
        );
        Ok(hashes)
    }

    /// Best-effort dismissal of the interstitial dialog that blocks the page
    /// from issuing its remaining requests. Absence is not an error.
    async fn dismiss_dialog(&self, page: &Page) {
        let selector = format!("button[aria-label='{}']", self.dialog_close_label);
        match page.find_element(selector.as_str()).await {
            Ok(button) => {
                if let Err(error) = button.click().await {
                    debug!(%error, "dialog close button found but click failed");
                }
            }
            Err(_) => debug!(label = %self.dialog_close_label, "no blocking dialog to dismiss"),
        }
    }
}

#[async_trait]
impl HashExtractor for HashSniffer {
    async fn extract(&self, listing_id: &str) -> Result<OperationHashes> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(|e| anyhow!("Failed to build browser config: {e}"))?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch headless browser")?;

        // The handler pumps CDP messages; it lives exactly as long as the
        // session below.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = self.sniff(&browser, listing_id).await;

        // Unconditional teardown, whether sniffing succeeded or not.
        if let Err(error) = browser.close().await {
            debug!(%error, "browser close reported an error");
        }
        let _ = browser.wait().await;
        handler_task.abort();

        result
    }
}

/// Folds one observed request into the accumulator.
///
/// Only read-only calls under the API namespace are inspected; a matching
/// operation segment followed by a 64-hex hash records that hash, overwriting
/// any earlier value from the same session.
pub fn observe_request(mut hashes: OperationHashes, method: &str, url: &str) -> OperationHashes {
    if method != "GET" || !url.contains("/api/v3/") {
        return hashes;
    }

    for (operation, pattern) in HASH_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(url) {
            if let Some(hash) = QueryHash::new(&captures[1]) {
                debug!(%operation, %hash, "captured operation hash");
                hashes.record(*operation, hash);
            }
        }
    }
    hashes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::STAY_CHECKOUT_HASH;

    fn sections_url(hash: &str) -> String {
        format!(
            "https://example.test/api/v3/StaysPdpSections/{hash}?operationName=StaysPdpSections&variables=%7B%7D"
        )
    }

    #[test]
    fn captures_hash_from_matching_get_request() {
        let hash = "1234567890abcdef".repeat(4);
        let hashes = observe_request(OperationHashes::default(), "GET", &sections_url(&hash));
        assert_eq!(
            hashes.get(GraphQlOperation::StaysPdpSections).map(QueryHash::as_str),
            Some(hash.as_str())
        );
        assert!(hashes.is_sufficient());
    }

    #[test]
    fn ignores_non_get_requests() {
        let hash = "a".repeat(64);
        let hashes = observe_request(OperationHashes::default(), "POST", &sections_url(&hash));
        assert!(hashes.pdp_sections.is_none());
    }

    #[test]
    fn ignores_requests_outside_the_api_namespace() {
        let hash = "a".repeat(64);
        let url = format!("https://example.test/static/StaysPdpSections/{hash}.js");
        let hashes = observe_request(OperationHashes::default(), "GET", &url);
        assert!(hashes.pdp_sections.is_none());
    }

    #[test]
    fn ignores_truncated_hashes() {
        let hashes = observe_request(
            OperationHashes::default(),
            "GET",
            &sections_url(&"a".repeat(63)),
        );
        assert!(hashes.pdp_sections.is_none());
    }

    #[test]
    fn later_observation_overwrites_earlier_one() {
        let first = observe_request(
            OperationHashes::default(),
            "GET",
            &sections_url(&"a".repeat(64)),
        );
        let second = observe_request(first, "GET", &sections_url(&"b".repeat(64)));
        assert_eq!(
            second.get(GraphQlOperation::StaysPdpSections).map(QueryHash::as_str),
            Some("b".repeat(64).as_str())
        );
    }

    #[test]
    fn reviews_operation_matches_its_wire_name() {
        let hash = "c".repeat(64);
        let url =
            format!("https://example.test/api/v3/StaysPdpReviewsQuery/{hash}?operationName=StaysPdpReviewsQuery");
        let hashes = observe_request(OperationHashes::default(), "GET", &url);
        assert_eq!(
            hashes.get(GraphQlOperation::StaysPdpReviews).map(QueryHash::as_str),
            Some(hash.as_str())
        );
    }

    #[test]
    fn unrelated_traffic_leaves_the_seeded_checkout_constant() {
        let hashes = observe_request(
            OperationHashes::default(),
            "GET",
            "https://example.test/api/v3/SomethingElse/deadbeef",
        );
        assert_eq!(
            hashes.get(GraphQlOperation::StayCheckout).map(QueryHash::as_str),
            Some(STAY_CHECKOUT_HASH)
        );
    }
}
