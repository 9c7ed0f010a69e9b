// src/services/page_crawl.rs

//! Paginated crawl of a single target.
//!
//! [`PageCrawlState`] is a pure state machine fed one fetched page at a time.
//! [`PageCrawler`] drives it against a [`PageFetcher`] and writes the chunks it
//! emits to run storage.
//!
//! | Signal on fetched page                  | Next state    |
//! |-----------------------------------------|---------------|
//! | empty HTML                              | `Error`       |
//! | contains the "no results" marker        | `EmptyResult` |
//! | resolved URL has no page param, 1st time| `Fetching`    |
//! | resolved URL has no page param, 2nd time| `Exhausted`   |
//! | resolved URL has a page param           | `Fetching`    |

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{CrawlTarget, CrawlerConfig, RunBucket};
use crate::services::fetcher::{FetchedPage, PageFetcher};
use crate::storage::RunStorage;
use crate::utils::url::PageParam;

/// Where a target's crawl stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Fetching,
    /// The site reported no listings for this search.
    EmptyResult,
    /// The site looped back to page 1; every page was seen.
    Exhausted,
    /// A page came back empty; nothing from this target can be trusted.
    Error,
}

impl CrawlState {
    pub fn is_terminal(self) -> bool {
        self != Self::Fetching
    }
}

/// Accumulated HTML ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    /// Part number once the target switched to chunked output
    pub part: Option<u32>,
    pub html: String,
}

impl OutputChunk {
    /// `<slug>.html` or `<slug>-part<N>.html`.
    pub fn file_name(&self, slug: &str) -> String {
        match self.part {
            Some(n) => format!("{slug}-part{n}.html"),
            None => format!("{slug}.html"),
        }
    }
}

/// Result of feeding one page to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: CrawlState,
    pub chunk: Option<OutputChunk>,
}

/// Site conventions and pacing for page crawls.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub page_param: PageParam,
    pub no_results_marker: String,
    pub part_size: u32,
    pub delay: Duration,
}

impl CrawlSettings {
    pub fn from_config(config: &CrawlerConfig) -> Result<Self> {
        if config.part_size == 0 {
            return Err(AppError::validation("crawler.part_size must be > 0"));
        }
        Ok(Self {
            page_param: PageParam::new(&config.page_param)?,
            no_results_marker: config.no_results_marker.clone(),
            part_size: config.part_size,
            delay: Duration::from_millis(config.request_delay_ms),
        })
    }
}

/// Per-target pagination state.
#[derive(Debug)]
pub struct PageCrawlState<'a> {
    settings: &'a CrawlSettings,
    next_url: String,
    /// Page number the next request will ask for; page 1 is implicit.
    page: u32,
    reloops: u32,
    part: u32,
    part_mode: bool,
    buffer: String,
    state: CrawlState,
}

impl<'a> PageCrawlState<'a> {
    pub fn new(target_url: &str, settings: &'a CrawlSettings) -> Self {
        Self {
            settings,
            next_url: target_url.to_string(),
            page: 2,
            reloops: 0,
            part: 1,
            part_mode: false,
            buffer: String::new(),
            state: CrawlState::Fetching,
        }
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// URL to request next, or `None` once terminal.
    pub fn next_url(&self) -> Option<&str> {
        (!self.state.is_terminal()).then_some(self.next_url.as_str())
    }

    /// Mark the crawl failed, e.g. after a transport error.
    pub fn fail(&mut self) {
        self.state = CrawlState::Error;
        self.buffer.clear();
    }

    /// Feed the page fetched from [`Self::next_url`].
    pub fn advance(&mut self, page: &FetchedPage) -> Transition {
        if self.state.is_terminal() {
            return self.stay();
        }

        if page.html.is_empty() {
            self.fail();
            return self.stay();
        }

        if page.html.contains(&self.settings.no_results_marker) {
            self.state = CrawlState::EmptyResult;
            self.buffer.clear();
            return self.stay();
        }

        let param = &self.settings.page_param;
        if param.is_present(&page.resolved_url) {
            self.next_url = param.with_page(&self.next_url, self.page);
        } else {
            self.reloops += 1;
            self.next_url = param.with_page(&self.next_url, self.page);

            if self.reloops > 1 {
                self.state = CrawlState::Exhausted;
                let chunk = self.take_chunk();
                return Transition {
                    state: self.state,
                    chunk,
                };
            }
        }

        self.buffer.push_str(&page.html);

        let part_size = self.settings.part_size;
        if self.page >= part_size {
            self.part_mode = true;
        }

        let mut chunk = None;
        if self.part_mode && self.page % part_size == 0 {
            chunk = self.take_chunk();
        }

        self.page += 1;

        Transition {
            state: self.state,
            chunk,
        }
    }

    fn stay(&self) -> Transition {
        Transition {
            state: self.state,
            chunk: None,
        }
    }

    /// Drain the buffer into a chunk; an empty part is not worth a file.
    fn take_chunk(&mut self) -> Option<OutputChunk> {
        if self.buffer.is_empty() {
            return None;
        }
        let html = std::mem::take(&mut self.buffer);
        if self.part_mode {
            let part = self.part;
            self.part += 1;
            Some(OutputChunk {
                part: Some(part),
                html,
            })
        } else {
            Some(OutputChunk { part: None, html })
        }
    }
}

/// How a target's crawl ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    /// Pages were written to these files.
    Saved(Vec<PathBuf>),
    /// The search legitimately has no listings.
    NoResults,
}

/// Drives [`PageCrawlState`] for targets of one run.
pub struct PageCrawler<'a> {
    settings: &'a CrawlSettings,
    storage: &'a dyn RunStorage,
    bucket: RunBucket,
}

impl<'a> PageCrawler<'a> {
    pub fn new(settings: &'a CrawlSettings, storage: &'a dyn RunStorage, bucket: RunBucket) -> Self {
        Self {
            settings,
            storage,
            bucket,
        }
    }

    /// Crawl every result page of `target`.
    ///
    /// On error, files already written for this target are left in place and
    /// must be discarded by the caller.
    pub async fn crawl(
        &self,
        target: &CrawlTarget,
        slug: &str,
        fetcher: &mut dyn PageFetcher,
    ) -> Result<TargetOutcome> {
        let mut state = PageCrawlState::new(target.url(), self.settings);
        let mut written = Vec::new();
        let mut pages = 0u32;

        while let Some(url) = state.next_url().map(str::to_owned) {
            let page = match fetcher.fetch(&url).await {
                Ok(page) => page,
                Err(e) => {
                    state.fail();
                    return Err(e);
                }
            };

            if !self.settings.delay.is_zero() {
                tokio::time::sleep(self.settings.delay).await;
            }

            let transition = state.advance(&page);

            if let Some(chunk) = transition.chunk {
                let file_name = chunk.file_name(slug);
                let path = self
                    .storage
                    .write_page(&self.bucket, &file_name, &chunk.html)
                    .await?;
                log::debug!("Saved {}", path.display());
                written.push(path);
            }

            match transition.state {
                CrawlState::Fetching => {
                    pages += 1;
                    log::debug!("Page {} retrieved for {}", pages, slug);
                }
                CrawlState::EmptyResult => {
                    log::info!("No results for {}", target);
                    return Ok(TargetOutcome::NoResults);
                }
                CrawlState::Exhausted => {
                    log::info!(
                        "Reloop detected for {} after {} pages, {} file(s) saved",
                        slug,
                        pages,
                        written.len()
                    );
                    return Ok(TargetOutcome::Saved(written));
                }
                CrawlState::Error => {
                    return Err(AppError::EmptyFetchResult { url });
                }
            }
        }

        Ok(TargetOutcome::Saved(written))
    }
}
