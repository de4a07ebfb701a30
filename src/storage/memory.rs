//! In-memory feed store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::PublishedFeed;

/// Latest published feed per query name.
///
/// The lock is held only for the map access itself, never across an
/// upstream fetch.
#[derive(Debug, Default)]
pub struct FeedStore {
    feeds: RwLock<HashMap<String, Arc<PublishedFeed>>>,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the feed published under `name`.
    pub async fn get(&self, name: &str) -> Result<Arc<PublishedFeed>> {
        self.feeds
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::not_found(name))
    }

    /// Replace the feed published under `name`, leaving every other name alone.
    pub async fn publish(&self, name: impl Into<String>, feed: PublishedFeed) {
        self.feeds.write().await.insert(name.into(), Arc::new(feed));
    }

    /// Publish a batch of rebuilt feeds and drop names for which `keep`
    /// returns false, all under one write.
    pub async fn publish_all<F>(&self, feeds: Vec<(String, PublishedFeed)>, keep: F)
    where
        F: Fn(&str) -> bool,
    {
        let mut map = self.feeds.write().await;
        map.retain(|name, _| keep(name));
        for (name, feed) in feeds {
            map.insert(name, Arc::new(feed));
        }
    }

    /// Names with a published feed, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.feeds.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn len(&self) -> usize {
        self.feeds.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
