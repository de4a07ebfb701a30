// src/services/api.rs

//! Marketplace API operations used by the feed engine.

use async_trait::async_trait;
use url::form_urlencoded;

use crate::error::Result;
use crate::models::{ListingDetail, Location, SearchPage, SearchResponse};
use crate::services::SignedClient;
use crate::utils::join_url;

/// Header carrying the next pagination cursor.
pub const NEXT_PAGE_HEADER: &str = "X-NextPage";

/// Upstream operations the feed engine depends on.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// Resolve a free-text place name to coordinates.
    async fn location(&self, place: &str) -> Result<Location>;

    /// Fetch one page of search results for an encoded parameter string.
    async fn search_page(&self, params: &str) -> Result<SearchPage>;

    /// Fetch the detail record of a single listing.
    async fn item(&self, id: &str) -> Result<ListingDetail>;
}

#[async_trait]
impl MarketplaceApi for SignedClient {
    async fn location(&self, place: &str) -> Result<Location> {
        let url = join_url(&self.config().web_url, "maps/here/place");
        let params = form_urlencoded::Serializer::new(String::new())
            .append_pair("placeId", place)
            .finish();
        Ok(self.call::<Location>(&url, &params).await?.body)
    }

    async fn search_page(&self, params: &str) -> Result<SearchPage> {
        let url = join_url(&self.config().api_url, "general/search");
        let response = self.call::<SearchResponse>(&url, params).await?;
        let next_page = response
            .headers
            .get(NEXT_PAGE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Ok(SearchPage {
            listings: response.body.search_objects,
            next_page,
        })
    }

    async fn item(&self, id: &str) -> Result<ListingDetail> {
        let url = join_url(&self.config().api_url, &format!("items/{id}"));
        Ok(self.call::<ListingDetail>(&url, "").await?.body)
    }
}
