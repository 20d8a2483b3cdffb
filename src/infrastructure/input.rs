//! Listing-id input files
//!
//! Identifier enumeration happens upstream; this module only consumes the
//! resulting `listing_ids_{region}.txt` files, one id per line.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::info;

/// Reads the identifier list for a region. A missing file is the recoverable
/// "no input" condition and returns `None`; read errors on an existing file
/// are real errors.
pub async fn read_listing_ids(input_dir: &Path, region: &str) -> Result<Option<Vec<String>>> {
    let path = input_dir.join(format!("listing_ids_{region}.txt"));

    let raw = match fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no identifier list for region");
            return Ok(None);
        }
        Err(error) => {
            return Err(error)
                .with_context(|| format!("Failed to read identifier list: {}", path.display()));
        }
    };

    let ids: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    info!(region, count = ids.len(), "read identifier list");
    Ok(Some(ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let ids = read_listing_ids(dir.path(), "da-lat").await.unwrap();
        assert!(ids.is_none());
    }

    #[tokio::test]
    async fn blank_lines_and_whitespace_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("listing_ids_da-lat.txt"), "111\n\n  222  \n\n333\n")
            .await
            .unwrap();

        let ids = read_listing_ids(dir.path(), "da-lat").await.unwrap().unwrap();
        assert_eq!(ids, ["111", "222", "333"]);
    }

    #[tokio::test]
    async fn empty_file_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("listing_ids_hue.txt"), "\n\n").await.unwrap();
        let ids = read_listing_ids(dir.path(), "hue").await.unwrap().unwrap();
        assert!(ids.is_empty());
    }
}
