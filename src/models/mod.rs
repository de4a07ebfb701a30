// src/models/mod.rs

//! Domain models for the feed engine.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod feed;
mod listing;
mod query;

// Re-export all public types
pub use config::{
    ApiConfig, Config, FeedsConfig, MAX_AGE_DAYS_LIMIT, ServerConfig, WatchConfig,
};
pub use feed::{Author, FeedItem, PublishedFeed};
pub use listing::{
    Flags, Image, ImageUrls, ItemImage, ListingDetail, ListingSummary, Location, SearchPage,
    SearchRequest, SearchResponse, User,
};
pub use query::{QuerySnapshot, SavedQuery, parse_queries};
