//! Service layer for the feed engine.
//!
//! This module contains the upstream-facing building blocks:
//! - Signed HTTP access (`SignedClient`)
//! - The API seam the engine depends on (`MarketplaceApi`)
//! - Cursor-following search (`search`)
//! - Item detail memoization (`TtlCache`)

mod api;
mod cache;
mod client;
mod search;

pub use api::{MarketplaceApi, NEXT_PAGE_HEADER};
pub use cache::{FetchFn, TtlCache};
pub use client::{ApiResponse, SignedClient, decode_body, sign};
pub use search::{PaginationCursor, cutoff, search, search_until};
