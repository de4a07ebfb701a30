// src/pipeline/watch.rs

//! Saved-queries hot reload.
//!
//! The queries file is polled for size or modification time changes. Each
//! change reloads the registry; a reload that fails to parse is logged and
//! the previous snapshot stays live.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;

use crate::error::{AppError, Result};

use super::FeedOrchestrator;

/// Notification emitted by `watch_file`.
#[derive(Debug)]
pub enum FileEvent {
    Changed,
    Error(AppError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
}

impl FileStamp {
    async fn read(path: &Path) -> Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(Self {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

/// Spawn a task polling `path` every `poll` and reporting changes.
///
/// Fails if the file cannot be read initially. The task ends when the
/// receiver is dropped.
pub async fn watch_file(path: impl Into<PathBuf>, poll: Duration) -> Result<mpsc::Receiver<FileEvent>> {
    let path = path.into();
    let mut last = FileStamp::read(&path).await?;
    let (tx, rx) = mpsc::channel(8);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let event = match FileStamp::read(&path).await {
                Ok(stamp) if stamp != last => {
                    last = stamp;
                    FileEvent::Changed
                }
                Ok(_) => continue,
                Err(e) => FileEvent::Error(e),
            };
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });

    Ok(rx)
}

/// Reload the registry on every change and trigger an update cycle.
///
/// Returns once the event stream closes.
pub async fn run_reloader(orchestrator: FeedOrchestrator, mut events: mpsc::Receiver<FileEvent>) {
    let registry = orchestrator.registry();
    let path = registry.path().display().to_string();

    while let Some(event) = events.recv().await {
        match event {
            FileEvent::Error(e) => {
                log::error!("Failed watching queries file {}: {}", path, e);
            }
            FileEvent::Changed => match registry.load().await {
                Ok(count) => {
                    log::info!("Reloaded {} queries from {}", count, path);
                    let orchestrator = orchestrator.clone();
                    tokio::spawn(async move {
                        orchestrator.update_all().await;
                    });
                }
                Err(e) => {
                    log::error!("Failed parsing queries file {}: {}", path, e);
                }
            },
        }
    }
}
