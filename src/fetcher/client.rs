//! HTTP client for Reddit's public JSON listings

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use super::listing::Listing;
use super::rate_limit::RateLimiter;
use super::ListingSource;
use crate::config::RedditSettings;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::types::SourceKind;

/// Unauthenticated client for `/user/<name>/{submitted,comments}.json`
pub struct RedditClient {
    http: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl RedditClient {
    pub fn new(settings: &RedditSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let limiter = RateLimiter::new(settings.request_delay());
        let retry = settings.retry_policy();
        debug!(
            base_url = %settings.base_url,
            min_interval_ms = limiter.min_interval().as_millis() as u64,
            max_attempts = retry.max_attempts(),
            "Reddit client created"
        );

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout_secs: settings.timeout_secs,
            limiter,
            retry,
        })
    }

    /// Listing URL for one page
    pub fn listing_url(
        &self,
        username: &str,
        kind: SourceKind,
        after: Option<&str>,
        limit: u32,
    ) -> Result<String> {
        let raw = format!("{}/user/{}/{}.json", self.base_url, username, kind.listing_path());
        let mut url = Url::parse(&raw)
            .map_err(|e| Error::Internal(format!("Invalid listing URL {}: {}", raw, e)))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("limit", &limit.to_string())
                .append_pair("sort", "new")
                .append_pair("raw_json", "1");
            if let Some(after) = after {
                query.append_pair("after", after);
            }
        }

        Ok(url.into())
    }

    async fn get_listing(&self, url: &str) -> Result<Listing> {
        self.limiter.acquire().await;
        debug!(url, "GET listing");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::from_fetch(url, self.timeout_secs, e))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::NOT_FOUND {
            warn!(
                url,
                status = status.as_u16(),
                "Profile unavailable (private, suspended or deleted), treating as empty"
            );
            return Ok(Listing::empty());
        }

        if !status.is_success() {
            return Err(Error::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<Listing>()
            .await
            .map_err(|e| Error::from_fetch(url, self.timeout_secs, e))
    }
}

#[async_trait]
impl ListingSource for RedditClient {
    async fn fetch_page(
        &self,
        username: &str,
        kind: SourceKind,
        after: Option<&str>,
        limit: u32,
    ) -> Result<Listing> {
        let url = self.listing_url(username, kind, after, limit)?;
        self.retry
            .run("reddit_listing", || self.get_listing(&url))
            .await
    }
}
