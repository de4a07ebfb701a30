//! Saved query registry backed by a TOML file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{QuerySnapshot, parse_queries};

/// Current set of saved queries.
#[derive(Debug)]
pub struct QueryRegistry {
    path: PathBuf,
    queries: RwLock<Arc<QuerySnapshot>>,
}

impl QueryRegistry {
    /// Create a registry for `path` and load it for the first time.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let registry = Self::with_snapshot(path, QuerySnapshot::new());
        registry.load().await?;
        Ok(registry)
    }

    /// Create a registry seeded with `snapshot`, without touching the file.
    pub fn with_snapshot(path: impl Into<PathBuf>, snapshot: QuerySnapshot) -> Self {
        Self {
            path: path.into(),
            queries: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read and parse the queries file.
    ///
    /// The current snapshot is replaced only if the whole file parses;
    /// otherwise it is kept as-is and the error is returned.
    pub async fn load(&self) -> Result<usize> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let snapshot = parse_queries(&content)?;
        let count = snapshot.len();
        self.set(snapshot).await;
        log::debug!("Loaded {} queries from {}", count, self.path.display());
        Ok(count)
    }

    /// Replace the snapshot wholesale.
    pub async fn set(&self, snapshot: QuerySnapshot) {
        *self.queries.write().await = Arc::new(snapshot);
    }

    /// The live snapshot. Cheap to clone and never partially updated.
    pub async fn current(&self) -> Arc<QuerySnapshot> {
        Arc::clone(&*self.queries.read().await)
    }
}
