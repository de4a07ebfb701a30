//! Marketplace API payloads.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Coordinates returned by the geocoding endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Parameters of the first search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub distance: u64,
    pub keywords: String,
    pub min_sale_price: u32,
    pub max_sale_price: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub language: String,
}

impl SearchRequest {
    /// Encode as a query string, keys in sorted order.
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("distance", &self.distance.to_string())
            .append_pair("filters_source", "quick_filters")
            .append_pair("keywords", &self.keywords)
            .append_pair("language", &self.language)
            .append_pair("latitude", &self.latitude.to_string())
            .append_pair("longitude", &self.longitude.to_string())
            .append_pair("max_sale_price", &self.max_sale_price.to_string())
            .append_pair("min_sale_price", &self.min_sale_price.to_string())
            .append_pair("order_by", "newest")
            .finish()
    }
}

/// Body of a search response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub search_objects: Vec<ListingSummary>,
}

/// One page of search results plus the raw `X-NextPage` header, if any.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub listings: Vec<ListingSummary>,
    pub next_page: Option<String>,
}

/// A listing as returned by the search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListingSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub flags: Flags,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub web_slug: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub micro_name: String,
    #[serde(default, rename = "images")]
    pub image: Option<Image>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Image {
    #[serde(default)]
    pub original: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flags {
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub sold: bool,
    #[serde(default)]
    pub reserved: bool,
    #[serde(default)]
    pub banned: bool,
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub onhold: bool,
}

/// A listing as returned by the item-detail endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListingDetail {
    pub id: String,
    /// Unix seconds
    #[serde(default)]
    pub modified_date: i64,
    #[serde(default)]
    pub images: Vec<ItemImage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ItemImage {
    #[serde(default)]
    pub urls: ImageUrls,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageUrls {
    #[serde(default)]
    pub big: String,
}

impl ListingDetail {
    pub fn modified_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.modified_date, 0)
            .single()
            .unwrap_or_default()
    }

    /// Image URLs, upgraded from the 800px to the 1024px variant.
    pub fn image_urls(&self) -> Vec<String> {
        self.images
            .iter()
            .filter(|image| !image.urls.big.is_empty())
            .map(|image| {
                let big = &image.urls.big;
                match big.strip_suffix("800") {
                    Some(prefix) => format!("{prefix}1024"),
                    None => big.clone(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_query() {
        let req = SearchRequest {
            distance: 5000,
            keywords: "psp 3000".to_string(),
            min_sale_price: 0,
            max_sale_price: 200,
            latitude: 41.5,
            longitude: 2.25,
            language: "es_ES".to_string(),
        };
        assert_eq!(
            req.to_query(),
            "distance=5000&filters_source=quick_filters&keywords=psp+3000&language=es_ES\
             &latitude=41.5&longitude=2.25&max_sale_price=200&min_sale_price=0&order_by=newest"
        );
    }

    #[test]
    fn test_decode_search_response() {
        let body = r#"{
            "search_objects": [{
                "id": "abc",
                "title": "PSP",
                "description": "Como nueva",
                "price": 80.0,
                "currency": "EUR",
                "web_slug": "psp-123",
                "user": {"id": "u1", "micro_name": "Ana"},
                "flags": {"reserved": true}
            }]
        }"#;
        let res: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(res.search_objects.len(), 1);
        let item = &res.search_objects[0];
        assert_eq!(item.user.micro_name, "Ana");
        assert!(item.flags.reserved);
        assert!(!item.flags.sold);
    }

    #[test]
    fn test_detail_image_urls_and_date() {
        let body = r#"{
            "id": "abc",
            "modified_date": 1565827270,
            "images": [
                {"urls": {"big": "https://cdn.example/p/1?pictureSize=W800"}},
                {"urls": {"big": "https://cdn.example/p/2.jpg"}},
                {"urls": {}}
            ]
        }"#;
        let detail: ListingDetail = serde_json::from_str(body).unwrap();
        assert_eq!(
            detail.image_urls(),
            vec![
                "https://cdn.example/p/1?pictureSize=W1024".to_string(),
                "https://cdn.example/p/2.jpg".to_string(),
            ]
        );
        assert_eq!(detail.modified_at().timestamp(), 1565827270);
    }
}
