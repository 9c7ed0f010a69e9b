// src/services/fetcher.rs

//! Page fetching.
//!
//! The crawler only needs "give me the HTML for this URL and tell me where I
//! actually ended up". Anything that can do that (a plain HTTP client, a
//! browser session) implements [`PageFetcher`].

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::CrawlerConfig;
use crate::utils::http::create_async_client;

/// One fetched result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Page HTML; empty when the fetch produced nothing
    pub html: String,
    /// URL after redirects or normalization by the site
    pub resolved_url: String,
}

impl FetchedPage {
    pub fn new(html: impl Into<String>, resolved_url: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            resolved_url: resolved_url.into(),
        }
    }
}

/// Fetches pages for a single target, one at a time.
#[async_trait]
pub trait PageFetcher: Send {
    async fn fetch(&mut self, url: &str) -> Result<FetchedPage>;
}

/// Creates an independent fetcher per target.
///
/// Targets crawled concurrently must never share a fetcher.
pub trait FetcherFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn PageFetcher>>;
}

/// Fetcher backed by an HTTP client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&mut self, url: &str) -> Result<FetchedPage> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let resolved_url = response.url().to_string();
        let html = response.text().await?;

        log::debug!("Fetched {} ({} bytes) -> {}", url, html.len(), resolved_url);
        Ok(FetchedPage { html, resolved_url })
    }
}

/// Builds a fresh HTTP client for every target.
pub struct HttpFetcherFactory {
    config: CrawlerConfig,
}

impl HttpFetcherFactory {
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl FetcherFactory for HttpFetcherFactory {
    fn create(&self) -> Result<Box<dyn PageFetcher>> {
        let client = create_async_client(&self.config)?;
        Ok(Box::new(HttpFetcher::new(client)))
    }
}
