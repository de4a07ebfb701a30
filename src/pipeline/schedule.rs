// src/pipeline/schedule.rs

//! Periodic update loop.

use std::time::Duration;

use tokio::time::MissedTickBehavior;

use super::FeedOrchestrator;

/// Run `update_all` every `interval`, forever.
///
/// The first cycle is expected to have been run by the caller, so the loop
/// waits one full interval before its first update.
pub async fn run_scheduler(orchestrator: FeedOrchestrator, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        log::debug!("Scheduled update cycle starting");
        let summary = orchestrator.update_all().await;
        if summary.skipped {
            log::info!("Scheduled update folded into the cycle still running");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;

    use crate::models::{ApiConfig, FeedsConfig, QuerySnapshot, SavedQuery};
    use crate::services::MarketplaceApi;
    use crate::storage::{FeedStore, QueryRegistry};
    use crate::testing::{FakeApi, cursor, listing};

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_runs_after_interval() {
        let api = Arc::new(FakeApi::new());
        api.add_location("Madrid", 40.4, -3.7);
        api.add_page(
            "kindle",
            0,
            vec![listing("k1", "")],
            Some(cursor("kindle", 1, Utc::now() - chrono::Duration::days(30))),
        );
        api.add_item("k1", 1_600_000_000, &[]);

        let mut snapshot = QuerySnapshot::new();
        snapshot.insert(
            "kindle".to_string(),
            SavedQuery {
                keywords: vec!["kindle".to_string()],
                ignores: Default::default(),
                location_name: "Madrid".to_string(),
                location_radius: 10,
                min_price: 0,
                max_price: 80,
            },
        );
        let store = Arc::new(FeedStore::new());
        let orchestrator = FeedOrchestrator::new(
            Arc::clone(&api) as Arc<dyn MarketplaceApi>,
            Arc::new(QueryRegistry::with_snapshot("queries.toml", snapshot)),
            Arc::clone(&store),
            &ApiConfig::default(),
            FeedsConfig::default(),
        );

        let handle = tokio::spawn(run_scheduler(orchestrator, Duration::from_secs(60)));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(store.get("kindle").await.is_err());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(store.get("kindle").await.unwrap().items.len(), 1);

        handle.abort();
    }
}
