// src/pipeline/cleanup.rs

//! Removal of failed runs.
//!
//! A bucket directory without a committed snapshot belongs to a run that was
//! aborted or failed; its page sources cannot be trusted.

use crate::error::Result;
use crate::models::RunBucket;
use crate::storage::RunStorage;

/// Delete every uncommitted bucket directory. Returns the removed buckets.
pub async fn clean_failed_runs(storage: &dyn RunStorage) -> Result<Vec<RunBucket>> {
    let failed = storage.list_failed_runs().await?;
    if failed.is_empty() {
        log::debug!("No failed runs to clean up");
        return Ok(failed);
    }

    for bucket in &failed {
        storage.remove_run(bucket).await?;
        log::info!("Removed failed run {}", bucket);
    }

    Ok(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunSnapshot;
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn removes_only_uncommitted_buckets() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let committed: RunBucket = "2026-10-19-08".parse().unwrap();
        let failed: RunBucket = "2026-10-19-09".parse().unwrap();

        storage.claim_run(&committed, false).await.unwrap();
        storage
            .write_page(&committed, "flats.html", "<p></p>")
            .await
            .unwrap();
        storage
            .commit_snapshot(&committed, &RunSnapshot::new())
            .await
            .unwrap();
        storage.claim_run(&failed, false).await.unwrap();
        storage
            .write_page(&failed, "flats-part1.html", "<p></p>")
            .await
            .unwrap();

        let removed = clean_failed_runs(&storage).await.unwrap();
        assert_eq!(removed, vec![failed]);
        assert!(!tmp.path().join("2026-10-19-09").exists());
        assert!(tmp.path().join("2026-10-19-08").join("flats.html").exists());

        assert!(clean_failed_runs(&storage).await.unwrap().is_empty());
    }
}
