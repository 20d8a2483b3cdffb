//! End-to-end pipeline
//!
//! Discovery, batch fetch, merge-write, and handoff, run strictly in that
//! order. Conditions that make the whole run pointless (no input, no hashes)
//! halt cleanly before any wasted work; per-item trouble never reaches this
//! level, it is already folded into degraded records by the batch stage.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::batch::fetch_all;
use crate::domain::MergeStats;
use crate::infrastructure::{
    config::CrawlerConfig, discovery::discover_hashes, graphql_api::ListingFetcher,
    handoff::DatasetSink, hash_sniffer::HashExtractor, input::read_listing_ids, merge_store,
};

/// Hard failures of a run. Clean halts are [`PipelineOutcome`] variants, not
/// errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("a region name is required")]
    MissingRegion,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// How a run ended.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// No identifier list for the region, or it was empty.
    NoInput,
    /// No candidate page yielded the mandatory hash pair.
    DiscoveryFailed,
    Completed {
        file: PathBuf,
        records: usize,
        stats: MergeStats,
    },
}

/// Runs the whole pipeline for one region.
pub async fn run_pipeline(
    config: &CrawlerConfig,
    extractor: &dyn HashExtractor,
    fetcher: &dyn ListingFetcher,
    sink: &dyn DatasetSink,
    region: &str,
) -> Result<PipelineOutcome, PipelineError> {
    let region = region.trim();
    if region.is_empty() {
        return Err(PipelineError::MissingRegion);
    }
    info!(region, "pipeline starting");

    let listing_ids = match read_listing_ids(&config.input_dir(), region).await? {
        Some(ids) if !ids.is_empty() => ids,
        Some(_) => {
            warn!(region, "identifier list is empty, nothing to do");
            return Ok(PipelineOutcome::NoInput);
        }
        None => {
            warn!(region, "no identifier list, nothing to do");
            return Ok(PipelineOutcome::NoInput);
        }
    };

    let Some(hashes) = discover_hashes(extractor, &listing_ids).await else {
        error!(region, "hash discovery exhausted all candidates, halting before fetch");
        return Ok(PipelineOutcome::DiscoveryFailed);
    };

    let records = fetch_all(fetcher, &listing_ids, &hashes).await;

    let output_dir = config.output_dir();
    let (prior, target) = resolve_output_paths(&output_dir, region, Utc::now()).await?;

    let mut dataset = match &prior {
        Some(prior) => merge_store::load_or_empty(prior).await,
        None => Default::default(),
    };
    let stats = dataset.merge(records);
    merge_store::write(&target, &dataset).await?;

    info!(
        region,
        file = %target.display(),
        added = stats.added,
        updated = stats.updated,
        total = dataset.len(),
        "merge complete"
    );

    sink.upsert(&target).await?;

    Ok(PipelineOutcome::Completed {
        file: target,
        records: dataset.len(),
        stats,
    })
}

/// Finds the most recent prior output for the region and the versioned path
/// this run should write. File names sort chronologically by construction
/// (`listing_info_{region}_{YYYYMMDD}_{seq:03}.json`).
pub async fn resolve_output_paths(
    output_dir: &Path,
    region: &str,
    now: DateTime<Utc>,
) -> Result<(Option<PathBuf>, PathBuf)> {
    let prefix = format!("listing_info_{region}_");
    let mut existing: Vec<String> = Vec::new();

    match tokio::fs::read_dir(output_dir).await {
        Ok(mut entries) => {
            while let Some(entry) = entries
                .next_entry()
                .await
                .context("Failed to scan output directory")?
            {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with(&prefix) && name.ends_with(".json") {
                    existing.push(name);
                }
            }
        }
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => {
            return Err(error).with_context(|| {
                format!("Failed to read output directory: {}", output_dir.display())
            });
        }
    }

    existing.sort();
    let prior = existing.last().map(|name| output_dir.join(name));

    let today = now.format("%Y%m%d").to_string();
    let today_prefix = format!("{prefix}{today}_");
    let next_seq = existing
        .iter()
        .filter_map(|name| {
            name.strip_prefix(&today_prefix)
                .and_then(|rest| rest.strip_suffix(".json"))
                .and_then(|seq| seq.parse::<u32>().ok())
        })
        .max()
        .unwrap_or(0)
        + 1;

    let target = output_dir.join(format!("{today_prefix}{next_seq:03}.json"));
    Ok((prior, target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_run_has_no_prior_and_seq_one() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let (prior, target) = resolve_output_paths(dir.path(), "hue", now).await.unwrap();

        assert!(prior.is_none());
        let expected = format!("listing_info_hue_{}_001.json", now.format("%Y%m%d"));
        assert_eq!(target.file_name().unwrap().to_str().unwrap(), expected);
    }

    #[tokio::test]
    async fn prior_is_the_lexicographic_latest_and_seq_increments() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let today = now.format("%Y%m%d").to_string();

        for name in [
            "listing_info_hue_20240101_001.json".to_string(),
            format!("listing_info_hue_{today}_001.json"),
            format!("listing_info_hue_{today}_002.json"),
            // Other regions never interfere.
            format!("listing_info_hanoi_{today}_009.json"),
        ] {
            tokio::fs::write(dir.path().join(name), "[]").await.unwrap();
        }

        let (prior, target) = resolve_output_paths(dir.path(), "hue", now).await.unwrap();
        assert_eq!(
            prior.unwrap().file_name().unwrap().to_str().unwrap(),
            format!("listing_info_hue_{today}_002.json")
        );
        assert_eq!(
            target.file_name().unwrap().to_str().unwrap(),
            format!("listing_info_hue_{today}_003.json")
        );
    }

    #[tokio::test]
    async fn missing_output_dir_behaves_like_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("crawled_data");
        let (prior, _) = resolve_output_paths(&missing, "hue", Utc::now()).await.unwrap();
        assert!(prior.is_none());
    }
}
