// src/services/search.rs

//! Cursor-based paginated search.
//!
//! The server hands back an `X-NextPage` header after every page. It is a
//! URL-encoded query string that also works verbatim as the parameter
//! string of the next request. Results are ordered newest first, so the
//! walk stops as soon as a cursor points past the age cutoff.

use chrono::{DateTime, Utc};
use url::form_urlencoded;

use crate::error::{AppError, Result};
use crate::models::{ListingSummary, SearchRequest};
use crate::services::MarketplaceApi;

/// Parsed `X-NextPage` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    /// Raw header value, sent unchanged as the next parameter string
    pub raw: String,
    pub step: i64,
    pub search_id: String,
    pub pagination_date: DateTime<Utc>,
}

impl PaginationCursor {
    /// Parse a raw cursor, requiring `step`, `search_id` and an RFC3339
    /// `pagination_date`.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut step = None;
        let mut search_id = None;
        let mut pagination_date = None;

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "step" => step = Some(value.into_owned()),
                "search_id" => search_id = Some(value.into_owned()),
                "pagination_date" => pagination_date = Some(value.into_owned()),
                _ => {}
            }
        }

        let step = step
            .ok_or_else(|| AppError::pagination("cursor has no step"))?
            .parse::<i64>()
            .map_err(|e| AppError::pagination(format!("can't parse step: {e}")))?;
        let search_id = search_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::pagination("cursor has no search_id"))?;
        let pagination_date = pagination_date
            .ok_or_else(|| AppError::pagination("cursor has no pagination_date"))?;
        let pagination_date = DateTime::parse_from_rfc3339(&pagination_date)
            .map_err(|e| {
                AppError::pagination(format!(
                    "can't parse pagination_date '{pagination_date}': {e}"
                ))
            })?
            .with_timezone(&Utc);

        Ok(Self {
            raw: raw.to_string(),
            step,
            search_id,
            pagination_date,
        })
    }
}

/// Run a search, following cursors until results are older than `max_age`.
pub async fn search(
    api: &dyn MarketplaceApi,
    request: &SearchRequest,
    max_age: chrono::Duration,
) -> Result<Vec<ListingSummary>> {
    search_until(api, request, cutoff(max_age)?).await
}

/// The instant `max_age` before now, if it is representable.
pub fn cutoff(max_age: chrono::Duration) -> Result<DateTime<Utc>> {
    Utc::now()
        .checked_sub_signed(max_age)
        .ok_or_else(|| AppError::validation(format!("search max age out of range: {max_age}")))
}

/// Run a search, following cursors until one is dated before `cutoff`.
///
/// The page whose cursor crosses the cutoff is still included.
pub async fn search_until(
    api: &dyn MarketplaceApi,
    request: &SearchRequest,
    cutoff: DateTime<Utc>,
) -> Result<Vec<ListingSummary>> {
    let mut params = request.to_query();
    let mut listings = Vec::new();
    let mut pages = 0usize;

    loop {
        let page = api.search_page(&params).await?;
        pages += 1;
        listings.extend(page.listings);

        let raw = page
            .next_page
            .ok_or_else(|| AppError::pagination("response has no X-NextPage header"))?;
        let cursor = PaginationCursor::parse(&raw)?;

        if cutoff > cursor.pagination_date {
            break;
        }
        log::debug!(
            "Following cursor for '{}': step {} ({})",
            request.keywords,
            cursor.step,
            cursor.pagination_date
        );
        params = cursor.raw;
    }

    log::debug!(
        "Search '{}' done: {} listings over {} pages",
        request.keywords,
        listings.len(),
        pages
    );
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, cursor, listing};
    use chrono::Duration;

    fn request(keywords: &str) -> SearchRequest {
        SearchRequest {
            distance: 5000,
            keywords: keywords.to_string(),
            min_sale_price: 0,
            max_sale_price: 100,
            latitude: 41.0,
            longitude: 2.0,
            language: "es_ES".to_string(),
        }
    }

    #[test]
    fn test_parse_cursor() {
        let c = PaginationCursor::parse(
            "step=2&search_id=abc&pagination_date=2024-05-01T10%3A00%3A00Z&keywords=psp",
        )
        .unwrap();
        assert_eq!(c.step, 2);
        assert_eq!(c.search_id, "abc");
        assert_eq!(c.pagination_date.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_parse_cursor_missing_fields() {
        for raw in [
            "",
            "search_id=abc&pagination_date=2024-05-01T10:00:00Z",
            "step=1&pagination_date=2024-05-01T10:00:00Z",
            "step=1&search_id=abc",
            "step=x&search_id=abc&pagination_date=2024-05-01T10:00:00Z",
            "step=1&search_id=abc&pagination_date=yesterday",
        ] {
            let err = PaginationCursor::parse(raw).unwrap_err();
            assert!(matches!(err, AppError::Pagination(_)), "accepted {raw:?}");
        }
    }

    #[tokio::test]
    async fn test_stops_at_first_cursor_past_cutoff() {
        let now = Utc::now();
        let api = FakeApi::new();
        api.add_page("psp", 0, vec![listing("a", "")], Some(cursor("psp", 1, now - Duration::days(1))));
        api.add_page("psp", 1, vec![listing("b", "")], Some(cursor("psp", 2, now - Duration::days(3))));
        api.add_page("psp", 2, vec![listing("c", "")], Some(cursor("psp", 3, now - Duration::days(9))));
        api.add_page("psp", 3, vec![listing("d", "")], Some(cursor("psp", 4, now - Duration::days(20))));

        let cutoff = now - Duration::days(5);
        let results = search_until(&api, &request("psp"), cutoff).await.unwrap();

        let ids: Vec<_> = results.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(api.search_calls(), 3);
    }

    #[tokio::test]
    async fn test_single_page_when_first_cursor_is_old() {
        let now = Utc::now();
        let api = FakeApi::new();
        api.add_page(
            "psp",
            0,
            vec![listing("a", ""), listing("b", "")],
            Some(cursor("psp", 1, now - Duration::days(30))),
        );

        let results = search(&api, &request("psp"), Duration::days(15)).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(api.search_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_header_is_pagination_error() {
        let api = FakeApi::new();
        api.add_page("psp", 0, vec![listing("a", "")], None);

        let err = search(&api, &request("psp"), Duration::days(15)).await.unwrap_err();
        assert!(matches!(err, AppError::Pagination(_)));
    }

    #[tokio::test]
    async fn test_out_of_range_max_age_is_rejected() {
        let api = FakeApi::new();
        api.add_page("psp", 0, vec![listing("a", "")], None);

        let err = search(&api, &request("psp"), Duration::days(100_000_000))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(api.search_calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_error_propagates() {
        let api = FakeApi::new();
        api.fail_search("psp");

        let err = search(&api, &request("psp"), Duration::days(15)).await.unwrap_err();
        assert!(matches!(err, AppError::HttpStatus { status: 500, .. }));
    }
}
