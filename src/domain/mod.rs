//! Domain module - core types of the crawl pipeline
//!
//! Operation signatures, listing records, and the merge semantics of the
//! cumulative dataset live here; nothing in this module touches the network
//! or the filesystem.

pub mod dataset;
pub mod listing;
pub mod operations;

pub use dataset::{Dataset, MergeStats};
pub use listing::ListingRecord;
pub use operations::{GraphQlOperation, OperationHashes, QueryHash, STAY_CHECKOUT_HASH};
