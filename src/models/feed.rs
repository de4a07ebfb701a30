//! Published feed structures and RSS rendering.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use rss::{ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use serde::Serialize;

use crate::models::{ListingDetail, ListingSummary};

/// A feed author.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// One listing rendered as a feed entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedItem {
    /// Listing id, also used as the RSS guid
    pub id: String,
    pub title: String,
    pub link: String,
    /// HTML: listing description followed by one `<img>` per detail image
    pub description: String,
    pub author: Author,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl FeedItem {
    /// Build an entry from a search result and its cached detail.
    pub fn from_listing(listing: &ListingSummary, detail: &ListingDetail, web_url: &str) -> Self {
        let mut description = format!("{}<br/>", listing.description);
        for src in detail.image_urls() {
            let _ = write!(description, r#"<img src="{src}"><br/>"#);
        }
        let date = detail.modified_at();

        Self {
            id: listing.id.clone(),
            title: format!("{} - {} {}", listing.title, listing.price, listing.currency),
            link: format!("{}/item/{}", web_url.trim_end_matches('/'), listing.web_slug),
            description,
            author: Author {
                name: listing.user.micro_name.clone(),
                email: None,
            },
            created: date,
            updated: date,
        }
    }
}

/// The feed published for one saved query.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PublishedFeed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub author: Author,
    pub created: DateTime<Utc>,
    pub items: Vec<FeedItem>,
}

impl PublishedFeed {
    /// Render as an RSS 2.0 document.
    pub fn to_rss(&self) -> String {
        let items: Vec<Item> = self
            .items
            .iter()
            .map(|item| {
                ItemBuilder::default()
                    .title(item.title.clone())
                    .link(item.link.clone())
                    .description(item.description.clone())
                    .author(item.author.contact())
                    .guid(
                        GuidBuilder::default()
                            .value(item.id.clone())
                            .permalink(false)
                            .build(),
                    )
                    .pub_date(item.created.to_rfc2822())
                    .build()
            })
            .collect();

        ChannelBuilder::default()
            .title(self.title.clone())
            .link(self.link.clone())
            .description(self.description.clone())
            .managing_editor(self.author.contact())
            .pub_date(self.created.to_rfc2822())
            .items(items)
            .build()
            .to_string()
    }
}

impl Author {
    /// RSS contact form: `email (name)`, or whichever half is set.
    fn contact(&self) -> Option<String> {
        match (&self.email, self.name.is_empty()) {
            (Some(email), false) => Some(format!("{} ({})", email, self.name)),
            (Some(email), true) => Some(email.clone()),
            (None, false) => Some(self.name.clone()),
            (None, true) => None,
        }
    }
}
