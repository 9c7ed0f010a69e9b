// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod filter;
mod snapshot;
mod target;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, ExtractConfig, PathsConfig, Replacement, RunConfig, SlugConfig,
};
pub use filter::{APPLY_TO_ALL, FilterConfig, ModBlock, SearchConfig};
pub use snapshot::{RunBucket, RunSnapshot, SnapshotHistory};
pub use target::CrawlTarget;
