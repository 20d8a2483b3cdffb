//! stay-crawler - signature-discovering crawler for stay listing data
//!
//! The target site's GraphQL API only answers persisted queries, each keyed
//! by a sha256 hash of its query shape. This crate discovers those hashes by
//! watching a real page's network traffic in a headless browser, then replays
//! them to fetch listing and price data for every identifier in an input
//! list, merging the results idempotently into a cumulative JSON dataset.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{run_pipeline, PipelineError, PipelineOutcome};
pub use domain::{Dataset, ListingRecord, OperationHashes};
