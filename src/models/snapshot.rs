//! Run identity and committed link snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Hourly timestamp identifying one run of one configuration (`yyyy-mm-dd-HH`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunBucket(NaiveDateTime);

impl RunBucket {
    /// Bucket containing the given instant, truncated to the hour.
    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        let naive = at.naive_local();
        let hour = naive
            .date()
            .and_hms_opt(naive.hour(), 0, 0)
            .unwrap_or(naive);
        Self(hour)
    }

    /// Bucket for the current local hour.
    pub fn now() -> Self {
        Self::from_datetime(&chrono::Local::now())
    }

    pub fn as_datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for RunBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d-%H"))
    }
}

impl FromStr for RunBucket {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AppError::InvalidBucket(s.to_string());

        let (date, hour) = s.rsplit_once('-').ok_or_else(invalid)?;
        if hour.len() != 2 || date.len() != 10 {
            return Err(invalid());
        }
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid())?;
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let at = date.and_hms_opt(hour, 0, 0).ok_or_else(invalid)?;

        Ok(Self(at))
    }
}

/// Listing links found in one run, keyed by target slug.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunSnapshot {
    targets: BTreeMap<String, BTreeSet<String>>,
}

impl RunSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add links for a target, merging with links already recorded for it.
    pub fn insert<I, S>(&mut self, slug: impl Into<String>, links: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets
            .entry(slug.into())
            .or_default()
            .extend(links.into_iter().map(Into::into));
    }

    /// Links for a target; an unknown target has none.
    pub fn links(&self, slug: &str) -> Option<&BTreeSet<String>> {
        self.targets.get(slug)
    }

    pub fn targets(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.targets.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All links across targets as one set.
    pub fn flatten(&self) -> BTreeSet<&str> {
        self.targets
            .values()
            .flat_map(|links| links.iter().map(String::as_str))
            .collect()
    }

    /// Number of targets in the snapshot.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Sum of per-target link counts (a link under two targets counts twice).
    pub fn link_count(&self) -> usize {
        self.targets.values().map(BTreeSet::len).sum()
    }
}

/// Committed snapshots of one configuration, oldest bucket first.
pub type SnapshotHistory = Vec<(RunBucket, RunSnapshot)>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn bucket_round_trips_through_display() {
        let bucket: RunBucket = "2026-10-19-07".parse().unwrap();
        assert_eq!(bucket.to_string(), "2026-10-19-07");
    }

    #[test]
    fn bucket_truncates_to_hour() {
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 22, 47, 13).unwrap();
        assert_eq!(RunBucket::from_datetime(&at).to_string(), "2026-03-04-22");
    }

    #[test]
    fn bucket_rejects_garbage() {
        for bad in ["", "2026-10-19", "2026-10-19-24", "2026-1-19-07", "item_html_files"] {
            assert!(bad.parse::<RunBucket>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn buckets_order_chronologically() {
        let mut buckets: Vec<RunBucket> = ["2026-10-19-10", "2025-12-31-23", "2026-10-19-09"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        buckets.sort();

        let ordered: Vec<String> = buckets.iter().map(ToString::to_string).collect();
        assert_eq!(ordered, vec!["2025-12-31-23", "2026-10-19-09", "2026-10-19-10"]);
    }

    #[test]
    fn snapshot_merges_parts_and_dedups() {
        let mut snapshot = RunSnapshot::new();
        snapshot.insert("flats", ["a", "b"]);
        snapshot.insert("flats", ["b", "c"]);
        snapshot.insert("houses", ["c"]);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.links("flats").unwrap().len(), 3);
        assert_eq!(snapshot.link_count(), 4);
        assert_eq!(snapshot.flatten().len(), 3);
    }

    #[test]
    fn snapshot_serializes_as_plain_object() {
        let mut snapshot = RunSnapshot::new();
        snapshot.insert("t", ["z", "a"]);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"t":["a","z"]}"#);

        let empty = serde_json::to_string(&RunSnapshot::new()).unwrap();
        assert_eq!(empty, "{}");
    }
}
