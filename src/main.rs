//! `fetch_listing_info` binary
//!
//! Usage: `fetch_listing_info <region>`
//!
//! The region names the identifier list (`listing_ids_{region}.txt`) and the
//! output file family. This is also the outermost error boundary: everything
//! below it logs and returns instead of crashing the caller's caller.

use std::path::Path;
use std::process::ExitCode;

use tracing::{error, info};

use stay_crawler::application::{run_pipeline, PipelineError, PipelineOutcome};
use stay_crawler::infrastructure::{
    logging, CommandSink, CrawlerConfig, HashSniffer, HttpClient, ListingApiClient,
};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(error) = logging::init_logging(Path::new("logs")) {
        eprintln!("failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }

    let Some(region) = std::env::args().nth(1) else {
        error!("a region name is required");
        error!("usage: fetch_listing_info <region>   (e.g. fetch_listing_info 'Ba Ria - Vung Tau')");
        return ExitCode::FAILURE;
    };

    match run(&region).await {
        Ok(PipelineOutcome::Completed { file, records, stats }) => {
            info!(
                file = %file.display(),
                records,
                added = stats.added,
                updated = stats.updated,
                "pipeline completed"
            );
            ExitCode::SUCCESS
        }
        Ok(PipelineOutcome::NoInput) => {
            error!(region, "no listing identifiers to process");
            ExitCode::FAILURE
        }
        Ok(PipelineOutcome::DiscoveryFailed) => {
            error!(region, "could not discover the mandatory operation hashes");
            ExitCode::FAILURE
        }
        Err(PipelineError::MissingRegion) => {
            error!("a region name is required");
            ExitCode::FAILURE
        }
        Err(error) => {
            error!(error = %format!("{error:#}"), "pipeline failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(region: &str) -> Result<PipelineOutcome, PipelineError> {
    let config = CrawlerConfig::load_or_default(Path::new("stay-crawler.json"))
        .await
        .map_err(PipelineError::Other)?;

    let extractor = HashSniffer::new(
        &config.api_domain,
        &config.dialog_close_label,
        config.page_settle_ms,
        config.request_idle_ms,
    );

    let http = HttpClient::new(
        &config.user_agent,
        config.timeout_seconds,
        config.max_requests_per_second,
    )
    .map_err(PipelineError::Other)?;
    let fetcher = ListingApiClient::new(http, &config.api_domain, &config.locale, &config.currency);

    let sink = CommandSink::new(config.upsert_command.clone());

    run_pipeline(&config, &extractor, &fetcher, &sink, region).await
}
