//! Idempotent JSON merge store
//!
//! The output file is a JSON array of listing records. Loading distinguishes
//! "no file yet" from "file present but unusable": both degrade to an empty
//! dataset, but the latter is an operator-visible warning. Writes go through
//! a temp file in the same directory and rename over the target, so a crash
//! mid-write never leaves a half-written dataset behind.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::{info, warn};

use crate::domain::{Dataset, ListingRecord};

/// Loads the dataset at `path`, or an empty one when the file is missing or
/// unusable. Entries that are not objects with a string `listing_id` are
/// dropped with a warning.
pub async fn load_or_empty(path: &Path) -> Dataset {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no prior dataset, starting fresh");
            return Dataset::new();
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "prior dataset unreadable, starting fresh");
            return Dataset::new();
        }
    };

    let parsed: Value = match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(error) => {
            warn!(path = %path.display(), %error, "prior dataset is not valid JSON, starting fresh");
            return Dataset::new();
        }
    };

    let Value::Array(items) = parsed else {
        warn!(path = %path.display(), "prior dataset is not a JSON array, starting fresh");
        return Dataset::new();
    };

    let total = items.len();
    let mut dataset = Dataset::new();
    for item in items {
        match serde_json::from_value::<ListingRecord>(item) {
            Ok(record) => {
                dataset.upsert(record);
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "dropping malformed record from prior dataset");
            }
        }
    }

    info!(
        path = %path.display(),
        records = dataset.len(),
        read = total,
        "loaded prior dataset"
    );
    dataset
}

/// Writes the dataset as a pretty-printed JSON array, atomically replacing
/// whatever was at `path`. Non-ASCII text is preserved as-is.
pub async fn write(path: &Path, dataset: &Dataset) -> Result<()> {
    let body = serde_json::to_string_pretty(dataset.records())
        .context("Failed to serialize dataset")?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body.as_bytes())
        .await
        .with_context(|| format!("Failed to write dataset to: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move dataset into place: {}", path.display()))?;

    info!(path = %path.display(), records = dataset.len(), "dataset written");
    Ok(())
}
