// src/pipeline/feeds.rs

//! Feed orchestration.
//!
//! One update cycle rebuilds every saved query concurrently: rebuilds are
//! dispatched one by one with a stagger delay, at most `max_concurrent` at a
//! time, and their results are fanned back in over a channel. Successful
//! feeds are published together at the end of the cycle. A failed rebuild is
//! logged and leaves the previously published feed for that name untouched.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::{Semaphore, mpsc};

use crate::error::{AppError, Result};
use crate::models::{
    ApiConfig, Author, FeedItem, FeedsConfig, ListingDetail, PublishedFeed, SavedQuery,
    SearchRequest,
};
use crate::services::{MarketplaceApi, TtlCache, search};
use crate::storage::{FeedStore, QueryRegistry};

/// Outcome of one `update_all` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Another cycle was already running; it reruns once it finishes
    pub skipped: bool,
}

/// Rebuilds feeds from saved queries and publishes them.
#[derive(Clone)]
pub struct FeedOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn MarketplaceApi>,
    registry: Arc<QueryRegistry>,
    store: Arc<FeedStore>,
    items: TtlCache<ListingDetail>,
    feeds: FeedsConfig,
    web_url: String,
    language: String,
    updating: AtomicBool,
    rerun: AtomicBool,
}

/// Clears the in-flight flag when a cycle ends, however it ends.
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl FeedOrchestrator {
    pub fn new(
        api: Arc<dyn MarketplaceApi>,
        registry: Arc<QueryRegistry>,
        store: Arc<FeedStore>,
        api_config: &ApiConfig,
        feeds: FeedsConfig,
    ) -> Self {
        let fetch_api = Arc::clone(&api);
        let items = TtlCache::new(feeds.cache_ttl(), move |id: String| {
            let api = Arc::clone(&fetch_api);
            async move { api.item(&id).await }
        });

        Self {
            inner: Arc::new(Inner {
                api,
                registry,
                store,
                items,
                feeds,
                web_url: api_config.web_url.clone(),
                language: api_config.language.clone(),
                updating: AtomicBool::new(false),
                rerun: AtomicBool::new(false),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<QueryRegistry> {
        &self.inner.registry
    }

    pub fn store(&self) -> &Arc<FeedStore> {
        &self.inner.store
    }

    /// Rebuild every feed in the current query snapshot.
    ///
    /// If a cycle is already running this returns at once with `skipped`
    /// set, and the running cycle goes around once more when it finishes so
    /// the request is not lost.
    pub async fn update_all(&self) -> UpdateSummary {
        let inner = &self.inner;
        inner.rerun.store(true, Ordering::Release);

        let mut summary = UpdateSummary {
            skipped: true,
            ..UpdateSummary::default()
        };
        loop {
            if inner.updating.swap(true, Ordering::AcqRel) {
                break;
            }
            {
                let _guard = CycleGuard(&inner.updating);
                while inner.rerun.swap(false, Ordering::AcqRel) {
                    summary = self.run_cycle().await;
                }
            }
            // A request may have landed between the last check and the release.
            if !inner.rerun.load(Ordering::Acquire) {
                break;
            }
        }

        if summary.skipped {
            log::info!("Update cycle already in flight, queued a rerun");
        }
        summary
    }

    async fn run_cycle(&self) -> UpdateSummary {
        let snapshot = self.inner.registry.current().await;
        log::info!("Updating {} feeds", snapshot.len());

        let delay = self.inner.feeds.update_delay();
        let permits = Arc::new(Semaphore::new(self.inner.feeds.max_concurrent.max(1)));
        let (tx, mut rx) = mpsc::channel(snapshot.len().max(1));

        for (i, (name, query)) in snapshot.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };

            let this = self.clone();
            let tx = tx.clone();
            let name = name.clone();
            let query = query.clone();
            tokio::spawn(async move {
                let result = this.gen_feed(&query).await;
                drop(permit);
                let _ = tx.send((name, result)).await;
            });
        }
        drop(tx);

        let mut summary = UpdateSummary::default();
        let mut rebuilt = Vec::new();
        while let Some((name, result)) = rx.recv().await {
            match result {
                Ok(feed) => {
                    log::info!("Rebuilt feed {} ({} items)", name, feed.items.len());
                    rebuilt.push((name, feed));
                }
                Err(e) => {
                    summary.failed += 1;
                    log::error!("Unable to generate feed {}: {}", name, e);
                }
            }
        }
        summary.succeeded = rebuilt.len();

        self.inner
            .store
            .publish_all(rebuilt, |name| snapshot.contains_key(name))
            .await;

        log::info!(
            "Update cycle done: {} rebuilt, {} failed",
            summary.succeeded,
            summary.failed
        );
        summary
    }

    /// Rebuild and publish a single feed by name.
    pub async fn update_one(&self, name: &str) -> Result<Arc<PublishedFeed>> {
        let snapshot = self.inner.registry.current().await;
        let query = snapshot
            .get(name)
            .ok_or_else(|| AppError::not_found(name))?;
        let feed = self.gen_feed(query).await?;
        self.inner.store.publish(name, feed).await;
        self.inner.store.get(name).await
    }

    /// Build the feed for one saved query.
    ///
    /// Keywords are searched in order. Listings are deduplicated by id (first
    /// occurrence wins) and dropped when their description contains an
    /// ignore term. Any upstream failure aborts the whole feed.
    pub async fn gen_feed(&self, query: &SavedQuery) -> Result<PublishedFeed> {
        let inner = &self.inner;
        let max_age = inner.feeds.max_age()?;
        let location = inner.api.location(&query.location_name).await?;

        let mut seen = HashSet::new();
        let mut items = Vec::new();

        for keyword in &query.keywords {
            let request = SearchRequest {
                distance: query.radius_meters(),
                keywords: keyword.clone(),
                min_sale_price: query.min_price,
                max_sale_price: query.max_price,
                latitude: location.latitude,
                longitude: location.longitude,
                language: inner.language.clone(),
            };
            let listings = search(inner.api.as_ref(), &request, max_age).await?;

            for listing in listings {
                if !seen.insert(listing.id.clone()) {
                    continue;
                }
                if query.is_ignored(&listing.description) {
                    log::debug!("Ignoring listing {} for '{}'", listing.id, keyword);
                    continue;
                }
                let detail = inner.items.get(&listing.id).await?;
                items.push(FeedItem::from_listing(&listing, &detail, &inner.web_url));
            }
        }

        Ok(PublishedFeed {
            title: format!("[{}] - {}", query.keywords.join(" "), inner.feeds.title_suffix),
            link: inner.web_url.clone(),
            description: inner.feeds.description.clone(),
            author: Author {
                name: inner.feeds.author_name.clone(),
                email: inner.feeds.author_email.clone(),
            },
            created: Utc::now(),
            items,
        })
    }
}
