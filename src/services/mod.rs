//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Filter expansion into crawl targets (`expand`)
//! - Paginated crawling of one target (`PageCrawlState`, `PageCrawler`)
//! - Page fetching (`PageFetcher`, `HttpFetcher`)
//! - Listing link extraction (`LinkExtractor`, `SelectorLinkExtractor`)

mod expander;
mod extractor;
mod fetcher;
mod page_crawl;

pub use expander::expand;
pub use extractor::{LinkExtractor, SelectorLinkExtractor};
pub use fetcher::{FetchedPage, FetcherFactory, HttpFetcher, HttpFetcherFactory, PageFetcher};
pub use page_crawl::{
    CrawlSettings, CrawlState, OutputChunk, PageCrawlState, PageCrawler, TargetOutcome,
    Transition,
};
