// src/pipeline/crawl.rs

//! Run orchestration.
//!
//! One run expands a filter config into targets, crawls each of them into
//! the run's bucket, extracts links from the saved page sources and commits
//! the resulting snapshot.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{
    Config, CrawlTarget, FilterConfig, RunBucket, RunSnapshot, SearchConfig, SlugConfig,
};
use crate::services::{
    CrawlSettings, FetcherFactory, LinkExtractor, PageCrawler, SelectorLinkExtractor, TargetOutcome,
    expand,
};
use crate::storage::{LocalStorage, RunStorage};

use super::cleanup::clean_failed_runs;

/// What happened to a single target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    /// Page sources were saved and scanned.
    Saved { files: usize, links: usize },
    /// The search has no listings.
    NoResults,
    /// The target failed; its files were discarded.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct TargetReport {
    pub url: String,
    pub slug: String,
    pub status: TargetStatus,
}

/// Summary of a committed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub bucket: RunBucket,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub targets: Vec<TargetReport>,
    /// Targets dropped because the same URL was already scheduled.
    pub duplicates: usize,
    pub snapshot: RunSnapshot,
    pub snapshot_path: PathBuf,
}

impl RunReport {
    pub fn failed_count(&self) -> usize {
        self.targets
            .iter()
            .filter(|t| matches!(t.status, TargetStatus::Failed(_)))
            .count()
    }

    pub fn no_results_count(&self) -> usize {
        self.targets
            .iter()
            .filter(|t| t.status == TargetStatus::NoResults)
            .count()
    }
}

/// Per-run options.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub bucket: RunBucket,
    /// Reuse an existing bucket directory instead of refusing the run.
    pub allow_existing: bool,
}

impl RunOptions {
    pub fn new(bucket: RunBucket) -> Self {
        Self {
            bucket,
            allow_existing: false,
        }
    }
}

/// Coordinates expansion, crawling, extraction and commit for a run.
pub struct RunOrchestrator<'a> {
    settings: CrawlSettings,
    slug_rules: &'a SlugConfig,
    concurrency: usize,
    fetchers: &'a dyn FetcherFactory,
    extractor: &'a dyn LinkExtractor,
}

impl<'a> RunOrchestrator<'a> {
    pub fn new(
        config: &'a Config,
        fetchers: &'a dyn FetcherFactory,
        extractor: &'a dyn LinkExtractor,
    ) -> Result<Self> {
        Ok(Self {
            settings: CrawlSettings::from_config(&config.crawler)?,
            slug_rules: &config.slug,
            concurrency: config.crawler.max_concurrent.max(1),
            fetchers,
            extractor,
        })
    }

    /// Execute one run of `filters` into `storage`.
    ///
    /// Target-level failures are isolated and reported; anything else aborts
    /// the run before the snapshot is committed.
    pub async fn run(
        &self,
        filters: &FilterConfig,
        storage: &dyn RunStorage,
        options: RunOptions,
    ) -> Result<RunReport> {
        let started_at = Utc::now();
        let bucket = options.bucket;

        let targets = expand(filters);
        let dir = storage.claim_run(&bucket, options.allow_existing).await?;
        log::info!(
            "Run {}: {} targets into {}",
            bucket,
            targets.len(),
            dir.display()
        );

        let (jobs, duplicates) = self.dedupe(targets);
        if duplicates > 0 {
            log::warn!("Skipped {} repeated target URLs", duplicates);
        }

        let crawler = PageCrawler::new(&self.settings, storage, bucket);
        let total = jobs.len();
        let crawler = &crawler;
        let results: Vec<_> = stream::iter(jobs.into_iter().enumerate())
            .map(|(index, (target, slug))| async move {
                log::info!("Processing target {}/{}: {}", index + 1, total, target);
                let outcome = match self.fetchers.create() {
                    Ok(mut fetcher) => crawler.crawl(&target, &slug, fetcher.as_mut()).await,
                    Err(e) => Err(e),
                };
                (target, slug, outcome)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut snapshot = RunSnapshot::new();
        let mut reports = Vec::with_capacity(results.len());

        for (target, slug, outcome) in results {
            let status = match outcome {
                Ok(TargetOutcome::Saved(files)) => {
                    let mut links = 0;
                    for path in &files {
                        let html = storage.read_page(path).await?;
                        let found = self.extractor.extract(&html, target.url());
                        links += found.len();
                        snapshot.insert(slug.as_str(), found);
                    }
                    if files.is_empty() {
                        snapshot.insert(slug.as_str(), Vec::<String>::new());
                    }
                    TargetStatus::Saved {
                        files: files.len(),
                        links,
                    }
                }
                Ok(TargetOutcome::NoResults) => TargetStatus::NoResults,
                Err(e) if e.is_target_level() => {
                    log::warn!("Target {} failed: {}", target, e);
                    let removed = storage.discard_target(&bucket, &slug).await?;
                    if removed > 0 {
                        log::debug!("Discarded {} file(s) of {}", removed, slug);
                    }
                    TargetStatus::Failed(e.to_string())
                }
                Err(e) => return Err(e),
            };
            reports.push(TargetReport {
                url: target.url().to_string(),
                slug,
                status,
            });
        }

        let snapshot_path = storage.commit_snapshot(&bucket, &snapshot).await?;
        let report = RunReport {
            bucket,
            started_at,
            finished_at: Utc::now(),
            targets: reports,
            duplicates,
            snapshot,
            snapshot_path,
        };

        log::info!(
            "Run {} committed: {} links from {} targets ({} without results, {} failed)",
            bucket,
            report.snapshot.link_count(),
            report.snapshot.len(),
            report.no_results_count(),
            report.failed_count()
        );

        Ok(report)
    }

    /// Drop repeated URLs and give every remaining target a distinct slug.
    fn dedupe(&self, targets: Vec<CrawlTarget>) -> (Vec<(CrawlTarget, String)>, usize) {
        let mut urls = HashSet::new();
        let mut slugs = HashSet::new();
        let mut jobs = Vec::with_capacity(targets.len());
        let mut duplicates = 0;

        for target in targets {
            if !urls.insert(target.url().to_string()) {
                log::debug!("Duplicate target {}", target);
                duplicates += 1;
                continue;
            }

            let base = target.slug(self.slug_rules);
            let mut slug = base.clone();
            let mut n = 2;
            while !slugs.insert(slug.clone()) {
                slug = format!("{base}-{n}");
                n += 1;
            }
            if slug != base {
                log::warn!("Slug {} already taken, saving {} as {}", base, target, slug);
            }
            jobs.push((target, slug));
        }

        (jobs, duplicates)
    }
}

/// Run every search config once, in order, into the current hour's bucket.
///
/// A config whose bucket was already claimed is skipped with a warning.
pub async fn run_crawler(
    config: &Config,
    searches: &[SearchConfig],
    fetchers: &dyn FetcherFactory,
    force: bool,
) -> Result<Vec<RunReport>> {
    let extractor = SelectorLinkExtractor::new(&config.extract)?;
    let orchestrator = RunOrchestrator::new(config, fetchers, &extractor)?;
    let bucket = RunBucket::now();
    let mut reports = Vec::with_capacity(searches.len());

    for search in searches {
        log::info!("Search config {}", search.name);
        let storage = LocalStorage::for_search(&config.paths.output_dir, &search.name);

        if config.run.clean_failed_runs {
            clean_failed_runs(&storage).await?;
        }

        let options = RunOptions {
            bucket,
            allow_existing: force,
        };
        match orchestrator.run(&search.filters, &storage, options).await {
            Ok(report) => reports.push(report),
            Err(AppError::DuplicateRunBucket { bucket }) => {
                log::warn!(
                    "Run {} of {} already exists, skipping (use --force to reuse it)",
                    bucket,
                    search.name
                );
            }
            Err(e) => return Err(e),
        }
    }

    Ok(reports)
}
