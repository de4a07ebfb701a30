//! In-memory marketplace used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use url::form_urlencoded;

use crate::error::{AppError, Result};
use crate::models::{ImageUrls, ItemImage, ListingDetail, ListingSummary, Location, SearchPage};
use crate::services::MarketplaceApi;

/// Scripted responses keyed by `(keywords, step)`.
#[derive(Default)]
pub struct FakeApi {
    pages: Mutex<HashMap<(String, i64), SearchPage>>,
    locations: Mutex<HashMap<String, Location>>,
    items: Mutex<HashMap<String, ListingDetail>>,
    failing_searches: Mutex<HashSet<String>>,
    search_calls: AtomicUsize,
    item_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(
        &self,
        keywords: &str,
        step: i64,
        listings: Vec<ListingSummary>,
        next_page: Option<String>,
    ) {
        self.pages.lock().unwrap().insert(
            (keywords.to_string(), step),
            SearchPage {
                listings,
                next_page,
            },
        );
    }

    pub fn add_location(&self, place: &str, latitude: f64, longitude: f64) {
        self.locations.lock().unwrap().insert(
            place.to_string(),
            Location {
                latitude,
                longitude,
            },
        );
    }

    pub fn add_item(&self, id: &str, modified_date: i64, images: &[&str]) {
        self.items
            .lock()
            .unwrap()
            .insert(id.to_string(), detail(id, modified_date, images));
    }

    pub fn fail_search(&self, keywords: &str) {
        self.failing_searches
            .lock()
            .unwrap()
            .insert(keywords.to_string());
    }

    pub fn heal_search(&self, keywords: &str) {
        self.failing_searches.lock().unwrap().remove(keywords);
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn item_calls(&self) -> usize {
        self.item_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketplaceApi for FakeApi {
    async fn location(&self, place: &str) -> Result<Location> {
        self.locations
            .lock()
            .unwrap()
            .get(place)
            .copied()
            .ok_or_else(|| AppError::http_status(404, format!("unknown place {place}")))
    }

    async fn search_page(&self, params: &str) -> Result<SearchPage> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        let mut keywords = String::new();
        let mut step = 0;
        for (key, value) in form_urlencoded::parse(params.as_bytes()) {
            match key.as_ref() {
                "keywords" => keywords = value.into_owned(),
                "step" => step = value.parse().unwrap(),
                _ => {}
            }
        }

        if self.failing_searches.lock().unwrap().contains(&keywords) {
            return Err(AppError::http_status(500, "search unavailable"));
        }
        self.pages
            .lock()
            .unwrap()
            .get(&(keywords.clone(), step))
            .cloned()
            .ok_or_else(|| AppError::http_status(404, format!("no page {keywords}/{step}")))
    }

    async fn item(&self, id: &str) -> Result<ListingDetail> {
        self.item_calls.fetch_add(1, Ordering::SeqCst);
        self.items
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::http_status(404, format!("no item {id}")))
    }
}

/// A raw `X-NextPage` value pointing at `step`.
pub fn cursor(keywords: &str, step: i64, date: DateTime<Utc>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("keywords", keywords)
        .append_pair("step", &step.to_string())
        .append_pair("search_id", "search-1")
        .append_pair(
            "pagination_date",
            &date.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
        .finish()
}

pub fn listing(id: &str, description: &str) -> ListingSummary {
    ListingSummary {
        id: id.to_string(),
        title: format!("Title {id}"),
        description: description.to_string(),
        price: 10.0,
        currency: "EUR".to_string(),
        web_slug: format!("slug-{id}"),
        ..ListingSummary::default()
    }
}

pub fn detail(id: &str, modified_date: i64, images: &[&str]) -> ListingDetail {
    ListingDetail {
        id: id.to_string(),
        modified_date,
        images: images
            .iter()
            .map(|big| ItemImage {
                urls: ImageUrls {
                    big: big.to_string(),
                },
            })
            .collect(),
    }
}
