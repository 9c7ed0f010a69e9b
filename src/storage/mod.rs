//! Storage abstractions for run output.
//!
//! Every search configuration owns one directory. Each run claims a bucket
//! subdirectory for its raw result pages and commits by writing the bucket's
//! snapshot file next to it.
//!
//! ## Directory Structure
//!
//! ```text
//! page_source_folder/
//! └── flats/                          # one per search config
//!     ├── 2026-10-19-09/              # committed run: page sources
//!     │   ├── apartamente-2-camere.html
//!     │   ├── apartamente-3-camere-part1.html
//!     │   └── apartamente-3-camere-part2.html
//!     ├── 2026-10-19-09.json          # commit marker: slug -> links
//!     └── 2026-10-19-10/              # no .json: failed or in progress
//! ```

pub mod local;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{RunBucket, RunSnapshot, SnapshotHistory};

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for run output backends.
#[async_trait]
pub trait RunStorage: Send + Sync {
    /// Claim the output directory of a bucket.
    ///
    /// Fails with `DuplicateRunBucket` if it already exists, unless
    /// `allow_existing` is set.
    async fn claim_run(&self, bucket: &RunBucket, allow_existing: bool) -> Result<PathBuf>;

    /// Write one page-source file into a claimed bucket.
    async fn write_page(&self, bucket: &RunBucket, file_name: &str, html: &str)
    -> Result<PathBuf>;

    /// Read back a page-source file written by `write_page`.
    async fn read_page(&self, location: &Path) -> Result<String>;

    /// Delete every page-source file of a target. Returns how many were removed.
    async fn discard_target(&self, bucket: &RunBucket, slug: &str) -> Result<usize>;

    /// Persist the snapshot, marking the run complete.
    async fn commit_snapshot(&self, bucket: &RunBucket, snapshot: &RunSnapshot)
    -> Result<PathBuf>;

    /// Buckets with a committed snapshot, oldest first.
    async fn list_snapshots(&self) -> Result<Vec<RunBucket>>;

    /// Load a committed snapshot.
    async fn load_snapshot(&self, bucket: &RunBucket) -> Result<Option<RunSnapshot>>;

    /// Bucket directories with no committed snapshot, oldest first.
    async fn list_failed_runs(&self) -> Result<Vec<RunBucket>>;

    /// Remove a bucket directory and everything in it.
    async fn remove_run(&self, bucket: &RunBucket) -> Result<()>;
}

/// Load every committed snapshot, oldest first.
pub async fn load_history(storage: &dyn RunStorage) -> Result<SnapshotHistory> {
    let mut history = Vec::new();
    for bucket in storage.list_snapshots().await? {
        match storage.load_snapshot(&bucket).await? {
            Some(snapshot) => history.push((bucket, snapshot)),
            None => log::warn!("Snapshot {} disappeared while loading history", bucket),
        }
    }
    Ok(history)
}
