// src/server.rs

//! HTTP front end: serves each published feed as RSS at `/rss/:name`.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use crate::error::Result;
use crate::storage::FeedStore;

/// Build the router over a shared feed store.
pub fn router(store: Arc<FeedStore>) -> Router {
    Router::new()
        .route("/rss/:name", get(rss_feed))
        .with_state(store)
}

/// Bind `addr` and serve until the process stops.
pub async fn serve(addr: &str, store: Arc<FeedStore>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Serving http on {}", addr);
    axum::serve(listener, router(store)).await?;
    Ok(())
}

async fn rss_feed(State(store): State<Arc<FeedStore>>, Path(name): Path<String>) -> Response {
    match store.get(&name).await {
        Ok(feed) => (
            [(header::CONTENT_TYPE, "application/xml")],
            feed.to_rss(),
        )
            .into_response(),
        Err(e) => {
            log::error!("Unable to get feed {}: {}", name, e);
            (
                StatusCode::NOT_FOUND,
                axum::Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, PublishedFeed};
    use chrono::Utc;

    async fn spawn_server(store: Arc<FeedStore>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(store)).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_serves_published_feed() {
        let store = Arc::new(FeedStore::new());
        store
            .publish(
                "psp",
                PublishedFeed {
                    title: "[psp] - Feed".to_string(),
                    link: "https://example.com".to_string(),
                    description: "test".to_string(),
                    author: Author::default(),
                    created: Utc::now(),
                    items: Vec::new(),
                },
            )
            .await;
        let base = spawn_server(Arc::clone(&store)).await;

        let response = reqwest::get(format!("{base}/rss/psp")).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(
            response.headers()[reqwest::header::CONTENT_TYPE],
            "application/xml"
        );
        let body = response.text().await.unwrap();
        assert!(body.contains("<title>[psp] - Feed</title>"));
    }

    #[tokio::test]
    async fn test_unknown_feed_is_404() {
        let base = spawn_server(Arc::new(FeedStore::new())).await;

        let response = reqwest::get(format!("{base}/rss/missing")).await.unwrap();
        assert_eq!(response.status().as_u16(), 404);
        let body = response.text().await.unwrap();
        assert!(body.contains("Feed not found: missing"));
    }
}
