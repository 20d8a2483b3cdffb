//! GraphQL persisted-query operations and their discovered hashes
//!
//! The target API routes every read through `/api/v3/{operation}/{sha256}`.
//! The hash is a versioned signature for the operation's query shape, so it
//! has to be observed from live traffic before any fetch can be issued. The
//! checkout hash is the one exception: it is a long-lived constant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Known hash for the `stayCheckout` pricing operation. Unlike the others it
/// is stable across deployments and is never sniffed from traffic.
pub const STAY_CHECKOUT_HASH: &str =
    "d6dd83d6f35f9ffd05a1d1ad28defc4afd4c9e1c16d4531a9a0a727b93395bc9";

/// The fixed set of remote operations this crawler knows how to observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphQlOperation {
    /// Listing detail sections (mandatory for any fetch).
    StaysPdpSections,
    /// Listing reviews (optional, currently unused downstream).
    StaysPdpReviews,
    /// Availability calendar (optional).
    PdpAvailabilityCalendar,
    /// Checkout pricing (mandatory; hash is the known constant).
    StayCheckout,
}

impl GraphQlOperation {
    /// All operations, in the order they are matched against request paths.
    pub const ALL: [GraphQlOperation; 4] = [
        GraphQlOperation::StaysPdpSections,
        GraphQlOperation::StaysPdpReviews,
        GraphQlOperation::PdpAvailabilityCalendar,
        GraphQlOperation::StayCheckout,
    ];

    /// The exact path segment the API uses for this operation.
    pub fn wire_name(&self) -> &'static str {
        match self {
            GraphQlOperation::StaysPdpSections => "StaysPdpSections",
            GraphQlOperation::StaysPdpReviews => "StaysPdpReviewsQuery",
            GraphQlOperation::PdpAvailabilityCalendar => "PdpAvailabilityCalendar",
            GraphQlOperation::StayCheckout => "stayCheckout",
        }
    }
}

impl fmt::Display for GraphQlOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A 64-character lowercase hex digest identifying one persisted query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHash(String);

impl QueryHash {
    /// Validates and wraps a candidate hash string.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.len() == 64 && raw.bytes().all(|b| matches!(b, b'a'..=b'f' | b'0'..=b'9')) {
            Some(Self(raw))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One optional hash slot per known operation.
///
/// Discovered once per run and discarded afterwards; never persisted. Two
/// slots are mandatory before the fetch stage may start: listing sections and
/// checkout pricing. The rest may stay unresolved across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHashes {
    pub pdp_sections: Option<QueryHash>,
    pub reviews: Option<QueryHash>,
    pub availability_calendar: Option<QueryHash>,
    pub checkout: Option<QueryHash>,
}

impl Default for OperationHashes {
    fn default() -> Self {
        Self {
            pdp_sections: None,
            reviews: None,
            availability_calendar: None,
            // Seeded constant, see STAY_CHECKOUT_HASH.
            checkout: QueryHash::new(STAY_CHECKOUT_HASH),
        }
    }
}

impl OperationHashes {
    /// Records a discovered hash, overwriting any earlier value for the
    /// same operation within the session.
    pub fn record(&mut self, operation: GraphQlOperation, hash: QueryHash) {
        *self.slot_mut(operation) = Some(hash);
    }

    pub fn get(&self, operation: GraphQlOperation) -> Option<&QueryHash> {
        match operation {
            GraphQlOperation::StaysPdpSections => self.pdp_sections.as_ref(),
            GraphQlOperation::StaysPdpReviews => self.reviews.as_ref(),
            GraphQlOperation::PdpAvailabilityCalendar => self.availability_calendar.as_ref(),
            GraphQlOperation::StayCheckout => self.checkout.as_ref(),
        }
    }

    /// Whether the mandatory pair (sections + checkout) is resolved.
    pub fn is_sufficient(&self) -> bool {
        self.pdp_sections.is_some() && self.checkout.is_some()
    }

    /// Count of resolved slots, for progress logging.
    pub fn resolved_count(&self) -> usize {
        GraphQlOperation::ALL
            .iter()
            .filter(|op| self.get(**op).is_some())
            .count()
    }

    fn slot_mut(&mut self, operation: GraphQlOperation) -> &mut Option<QueryHash> {
        match operation {
            GraphQlOperation::StaysPdpSections => &mut self.pdp_sections,
            GraphQlOperation::StaysPdpReviews => &mut self.reviews,
            GraphQlOperation::PdpAvailabilityCalendar => &mut self.availability_calendar,
            GraphQlOperation::StayCheckout => &mut self.checkout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_hash_accepts_64_lowercase_hex() {
        assert!(QueryHash::new("a".repeat(64)).is_some());
        assert!(QueryHash::new(STAY_CHECKOUT_HASH).is_some());
    }

    #[test]
    fn query_hash_rejects_bad_input() {
        assert!(QueryHash::new("a".repeat(63)).is_none());
        assert!(QueryHash::new("a".repeat(65)).is_none());
        assert!(QueryHash::new("A".repeat(64)).is_none());
        assert!(QueryHash::new(format!("{}g", "a".repeat(63))).is_none());
    }

    #[test]
    fn default_seeds_only_the_checkout_constant() {
        let hashes = OperationHashes::default();
        assert_eq!(
            hashes.get(GraphQlOperation::StayCheckout).map(QueryHash::as_str),
            Some(STAY_CHECKOUT_HASH)
        );
        assert!(hashes.pdp_sections.is_none());
        assert!(!hashes.is_sufficient());
        assert_eq!(hashes.resolved_count(), 1);
    }

    #[test]
    fn sufficiency_requires_sections_and_checkout() {
        let mut hashes = OperationHashes::default();
        hashes.record(
            GraphQlOperation::StaysPdpSections,
            QueryHash::new("b".repeat(64)).unwrap(),
        );
        assert!(hashes.is_sufficient());

        let mut without_checkout = OperationHashes {
            checkout: None,
            ..OperationHashes::default()
        };
        without_checkout.record(
            GraphQlOperation::StaysPdpSections,
            QueryHash::new("b".repeat(64)).unwrap(),
        );
        assert!(!without_checkout.is_sufficient());
    }

    #[test]
    fn record_overwrites_prior_value() {
        let mut hashes = OperationHashes::default();
        hashes.record(
            GraphQlOperation::StaysPdpReviews,
            QueryHash::new("c".repeat(64)).unwrap(),
        );
        hashes.record(
            GraphQlOperation::StaysPdpReviews,
            QueryHash::new("d".repeat(64)).unwrap(),
        );
        assert_eq!(
            hashes.get(GraphQlOperation::StaysPdpReviews).map(QueryHash::as_str),
            Some("d".repeat(64).as_str())
        );
    }
}
