//! Persistence handoff
//!
//! The durable upsert into the relational/document store is someone else's
//! job. This boundary hands over the finished file path and checks nothing
//! beyond the collaborator's exit status.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

/// Receives the finished dataset file for durable upserting.
#[async_trait]
pub trait DatasetSink: Send + Sync {
    async fn upsert(&self, file: &Path) -> Result<()>;
}

/// Runs a configured external command with the file path as the final
/// argument. With no command configured, the handoff logs and skips.
pub struct CommandSink {
    command: Option<Vec<String>>,
}

impl CommandSink {
    pub fn new(command: Option<Vec<String>>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl DatasetSink for CommandSink {
    async fn upsert(&self, file: &Path) -> Result<()> {
        let Some(command) = self.command.as_deref().filter(|c| !c.is_empty()) else {
            warn!(file = %file.display(), "no upsert command configured, skipping handoff");
            return Ok(());
        };

        info!(command = %command.join(" "), file = %file.display(), "handing dataset to upsert collaborator");
        let status = Command::new(&command[0])
            .args(&command[1..])
            .arg(file)
            .status()
            .await
            .with_context(|| format!("Failed to spawn upsert command: {}", command[0]))?;

        if !status.success() {
            anyhow::bail!("Upsert command exited with {status}");
        }
        info!("upsert collaborator finished");
        Ok(())
    }
}
