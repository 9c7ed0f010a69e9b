//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── {bucket}/             # page sources of one run
//! │   ├── {slug}.html
//! │   └── {slug}-part{N}.html
//! └── {bucket}.json         # committed snapshot
//! ```
//!
//! The bucket directory is created with a non-recursive `create_dir`, so two
//! runs can never both claim the same bucket. The snapshot is written to a
//! temp file and renamed into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{RunBucket, RunSnapshot};
use crate::storage::RunStorage;

/// Local filesystem storage backend for one search configuration.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Storage for the named search config under the output directory.
    pub fn for_search(output_dir: impl AsRef<Path>, name: &str) -> Self {
        Self::new(output_dir.as_ref().join(name))
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    fn bucket_dir(&self, bucket: &RunBucket) -> PathBuf {
        self.root_dir.join(bucket.to_string())
    }

    fn snapshot_path(&self, bucket: &RunBucket) -> PathBuf {
        self.root_dir.join(format!("{bucket}.json"))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(path, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        match self.read_bytes(path).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Bucket-named directories and bucket-named snapshot files under the root.
    async fn scan(&self) -> Result<(Vec<RunBucket>, Vec<RunBucket>)> {
        let mut dirs = Vec::new();
        let mut snapshots = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.root_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok((dirs, snapshots)),
            Err(e) => return Err(AppError::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let file_type = entry.file_type().await?;

            if file_type.is_dir() {
                if let Ok(bucket) = name.parse::<RunBucket>() {
                    dirs.push(bucket);
                }
            } else if let Some(stem) = name.strip_suffix(".json") {
                if let Ok(bucket) = stem.parse::<RunBucket>() {
                    snapshots.push(bucket);
                }
            }
        }

        dirs.sort();
        snapshots.sort();
        Ok((dirs, snapshots))
    }
}

/// Whether `file_name` is one of the page-source files of `slug`.
fn is_target_file(file_name: &str, slug: &str) -> bool {
    let Some(rest) = file_name.strip_prefix(slug) else {
        return false;
    };
    if rest == ".html" {
        return true;
    }
    rest.strip_prefix("-part")
        .and_then(|r| r.strip_suffix(".html"))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

#[async_trait]
impl RunStorage for LocalStorage {
    async fn claim_run(&self, bucket: &RunBucket, allow_existing: bool) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.root_dir).await?;

        let dir = self.bucket_dir(bucket);
        match tokio::fs::create_dir(&dir).await {
            Ok(()) => {
                log::info!("Claimed run directory {}", dir.display());
                Ok(dir)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if allow_existing {
                    log::warn!(
                        "Run directory {} already exists; continuing because it was forced",
                        dir.display()
                    );
                    Ok(dir)
                } else {
                    Err(AppError::DuplicateRunBucket {
                        bucket: bucket.to_string(),
                    })
                }
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn write_page(
        &self,
        bucket: &RunBucket,
        file_name: &str,
        html: &str,
    ) -> Result<PathBuf> {
        let path = self.bucket_dir(bucket).join(file_name);
        tokio::fs::write(&path, html).await?;
        Ok(path)
    }

    async fn read_page(&self, location: &Path) -> Result<String> {
        Ok(tokio::fs::read_to_string(location).await?)
    }

    async fn discard_target(&self, bucket: &RunBucket, slug: &str) -> Result<usize> {
        let dir = self.bucket_dir(bucket);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name.to_str().is_some_and(|n| is_target_file(n, slug)) {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn commit_snapshot(
        &self,
        bucket: &RunBucket,
        snapshot: &RunSnapshot,
    ) -> Result<PathBuf> {
        let path = self.snapshot_path(bucket);
        self.write_json(&path, snapshot)
            .await
            .map_err(|e| AppError::snapshot_commit(bucket, e))?;
        log::info!(
            "Snapshot committed: {} targets, {} links -> {}",
            snapshot.len(),
            snapshot.link_count(),
            path.display()
        );
        Ok(path)
    }

    async fn list_snapshots(&self) -> Result<Vec<RunBucket>> {
        let (_, snapshots) = self.scan().await?;
        Ok(snapshots)
    }

    async fn load_snapshot(&self, bucket: &RunBucket) -> Result<Option<RunSnapshot>> {
        self.read_json(&self.snapshot_path(bucket)).await
    }

    async fn list_failed_runs(&self) -> Result<Vec<RunBucket>> {
        let (dirs, snapshots) = self.scan().await?;
        Ok(dirs
            .into_iter()
            .filter(|bucket| snapshots.binary_search(bucket).is_err())
            .collect())
    }

    async fn remove_run(&self, bucket: &RunBucket) -> Result<()> {
        tokio::fs::remove_dir_all(self.bucket_dir(bucket)).await?;
        Ok(())
    }
}
