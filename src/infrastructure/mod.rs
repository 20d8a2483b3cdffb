//! Infrastructure module - everything that touches a process boundary
//!
//! Browser sessions, HTTP, the filesystem-backed merge store, and the
//! external upsert collaborator live here, behind seams the application
//! layer can substitute in tests.

pub mod config;
pub mod discovery;
pub mod graphql_api;
pub mod handoff;
pub mod hash_sniffer;
pub mod http_client;
pub mod input;
pub mod logging;
pub mod merge_store;

pub use config::CrawlerConfig;
pub use discovery::discover_hashes;
pub use graphql_api::{ListingApiClient, ListingFetcher};
pub use handoff::{CommandSink, DatasetSink};
pub use hash_sniffer::{HashExtractor, HashSniffer};
pub use http_client::HttpClient;
