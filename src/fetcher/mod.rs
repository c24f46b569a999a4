//! Content fetching
//!
//! Pages a user's public submissions and comments, normalizes them, and
//! merges both kinds into one newest-first list. The HTTP side sits
//! behind [`ListingSource`] so paging logic can be exercised offline.

mod client;
mod listing;
mod profile_url;
mod rate_limit;

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::Result;
use crate::normalizer::normalize_listing;
use crate::types::{sort_newest_first, SourceItem, SourceKind};

pub use client::RedditClient;
pub use listing::Listing;
pub use profile_url::parse_profile_url;

/// Hard stop on cursor following, independent of what the API returns
const MAX_PAGES_PER_KIND: usize = 50;

/// One page of a user listing
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch a page of `kind` for `username`, starting after `after`.
    ///
    /// Unavailable profiles (403/404) yield an empty listing, not an error.
    async fn fetch_page(
        &self,
        username: &str,
        kind: SourceKind,
        after: Option<&str>,
        limit: u32,
    ) -> Result<Listing>;
}

/// Collects normalized posts and comments for one user
pub struct ContentFetcher<S> {
    source: S,
    page_size: u32,
}

impl<S: ListingSource> ContentFetcher<S> {
    pub fn new(source: S, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.clamp(1, 100),
        }
    }

    /// Fetch up to `max_items` items, most recent first.
    ///
    /// `max_items == 0` issues no requests.
    pub async fn fetch(&self, username: &str, max_items: usize) -> Result<Vec<SourceItem>> {
        if max_items == 0 {
            info!(username, "Item limit is zero, skipping fetch");
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        for kind in SourceKind::all() {
            let fetched = self.fetch_kind(username, *kind, max_items).await?;
            info!(username, kind = %kind, count = fetched.len(), "Fetched items");
            items.extend(fetched);
        }

        sort_newest_first(&mut items);

        let mut seen = HashSet::new();
        items.retain(|item| seen.insert(item.permalink.clone()));
        items.truncate(max_items);

        Ok(items)
    }

    async fn fetch_kind(
        &self,
        username: &str,
        kind: SourceKind,
        max_items: usize,
    ) -> Result<Vec<SourceItem>> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        for page in 1..=MAX_PAGES_PER_KIND {
            let remaining = max_items - items.len();
            let limit = remaining.min(self.page_size as usize) as u32;

            let listing = self
                .source
                .fetch_page(username, kind, after.as_deref(), limit)
                .await?;

            let normalized = normalize_listing(&listing.data.children);
            debug!(
                kind = %kind,
                page,
                raw = listing.data.children.len(),
                kept = normalized.len(),
                "Listing page normalized"
            );
            items.extend(normalized);

            if items.len() >= max_items {
                items.truncate(max_items);
                break;
            }

            match listing.next_cursor() {
                Some(next) if after.as_deref() != Some(next) => after = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(items)
    }
}
