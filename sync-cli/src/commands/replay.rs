//! Replay recorded event batches through the model.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use syncwatch_core::{ModelConfig, ModelReconstructor, Snapshot};
use syncwatch_types::parse_batch;
use tracing::{info, warn};

/// Run the replay command.
pub async fn run(files: &[PathBuf], config: ModelConfig, json: bool) -> Result<()> {
    let snapshot = replay_files(files, config).await?;

    if json {
        let out = serde_json::to_string_pretty(&snapshot).context("Failed to encode snapshot")?;
        println!("{}", out);
    } else {
        print!("{}", snapshot);
    }

    Ok(())
}

/// Apply each file's batch in order and return the final snapshot.
///
/// An invalidated model is not an error: the snapshot reports it and the
/// remaining batches are counted as ignored.
pub async fn replay_files(files: &[PathBuf], config: ModelConfig) -> Result<Snapshot> {
    let model = ModelReconstructor::new(config);
    info!(
        ordering = ?model.config().ordering,
        files = files.len(),
        "Replaying event batches"
    );

    for path in files {
        let events = read_batch(path).await?;
        let outcome = model.apply_batch(events);
        info!(
            file = %path.display(),
            applied = outcome.applied,
            changed = outcome.changed,
            ignored = outcome.ignored,
            "Replayed batch"
        );
        if let Some(violation) = outcome.violation {
            warn!(file = %path.display(), %violation, "Model invalidated during replay");
        }
    }

    let snapshot = model.snapshot();
    if !snapshot.is_valid() {
        warn!("Model ended invalid; a live consumer would reset and resync here");
    }
    Ok(snapshot)
}

async fn read_batch(path: &Path) -> Result<Vec<syncwatch_types::EventRecord>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_batch(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
}
