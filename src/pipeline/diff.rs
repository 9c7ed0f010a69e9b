//! Diff calculation across run snapshots.
//!
//! Answers "which listings are new?" for a configuration's snapshot history.
//! A link counts as new in a run when no baseline snapshot contained it under
//! any target; the baseline is either every earlier run or only the
//! previous one. A target missing from an earlier snapshot simply contributes
//! no links.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{RunBucket, RunSnapshot};

/// New links of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDiff {
    pub bucket: RunBucket,
    /// Distinct links in the run, across all targets
    pub total_links: usize,
    /// Links absent from the baseline
    pub new_links: BTreeSet<String>,
}

impl RunDiff {
    pub fn new_count(&self) -> usize {
        self.new_links.len()
    }
}

/// What each run is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffBaseline {
    /// Union of every strictly earlier snapshot.
    #[default]
    AllPrior,
    /// The single preceding snapshot.
    PreviousRun,
}

/// Calculator for computing diffs over an ordered snapshot history.
#[derive(Debug, Clone, Default)]
pub struct SnapshotDiffer {
    baseline: DiffBaseline,
}

impl SnapshotDiffer {
    /// Create a differ comparing each run against all earlier runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a differ with an explicit baseline.
    pub fn with_baseline(baseline: DiffBaseline) -> Self {
        Self { baseline }
    }

    /// One entry per snapshot, in history order.
    ///
    /// The first snapshot's new links are all of its links.
    pub fn timeline(&self, history: &[(RunBucket, RunSnapshot)]) -> Vec<RunDiff> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut diffs = Vec::with_capacity(history.len());

        for (bucket, snapshot) in history {
            let current = snapshot.flatten();
            let new_links = current
                .difference(&seen)
                .map(|link| link.to_string())
                .collect();

            diffs.push(RunDiff {
                bucket: *bucket,
                total_links: current.len(),
                new_links,
            });

            match self.baseline {
                DiffBaseline::AllPrior => seen.extend(current),
                DiffBaseline::PreviousRun => seen = current,
            }
        }

        diffs
    }

    /// Per-target links of the latest snapshot that no earlier snapshot had.
    ///
    /// Always uses every earlier snapshot as the baseline. Empty for an
    /// empty history.
    pub fn current(
        &self,
        history: &[(RunBucket, RunSnapshot)],
    ) -> BTreeMap<String, BTreeSet<String>> {
        let Some(((_, latest), earlier)) = history.split_last() else {
            return BTreeMap::new();
        };

        let prior: BTreeSet<&str> = earlier
            .iter()
            .flat_map(|(_, snapshot)| snapshot.flatten())
            .collect();

        latest
            .targets()
            .map(|(slug, links)| {
                let fresh = links
                    .iter()
                    .filter(|link| !prior.contains(link.as_str()))
                    .cloned()
                    .collect();
                (slug.to_string(), fresh)
            })
            .collect()
    }
}

/// New links per run relative to the union of all earlier runs.
pub fn diff_against_all_prior(history: &[(RunBucket, RunSnapshot)]) -> Vec<RunDiff> {
    SnapshotDiffer::new().timeline(history)
}

/// New links per run relative to the immediately preceding run only.
pub fn diff_against_previous_run(history: &[(RunBucket, RunSnapshot)]) -> Vec<RunDiff> {
    SnapshotDiffer::with_baseline(DiffBaseline::PreviousRun).timeline(history)
}

/// Per-target links of the latest run not seen in any earlier run.
pub fn diff_against_immediate_prior(
    history: &[(RunBucket, RunSnapshot)],
) -> BTreeMap<String, BTreeSet<String>> {
    SnapshotDiffer::new().current(history)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(targets: &[(&str, &[&str])]) -> RunSnapshot {
        let mut snapshot = RunSnapshot::new();
        for (slug, links) in targets {
            snapshot.insert(*slug, links.iter().copied());
        }
        snapshot
    }

    fn history() -> Vec<(RunBucket, RunSnapshot)> {
        vec![
            (
                "2026-10-17-08".parse().unwrap(),
                snap(&[("flats", &["a", "b"]), ("houses", &["h1"])]),
            ),
            (
                "2026-10-18-08".parse().unwrap(),
                snap(&[("flats", &["b", "c"])]),
            ),
            (
                "2026-10-19-08".parse().unwrap(),
                snap(&[("flats", &["a", "c", "d"]), ("studios", &["s1", "h1"])]),
            ),
        ]
    }

    fn set(links: &[&str]) -> BTreeSet<String> {
        links.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_run_is_entirely_new() {
        let diffs = diff_against_all_prior(&history());
        assert_eq!(diffs[0].new_links, set(&["a", "b", "h1"]));
        assert_eq!(diffs[0].total_links, 3);
    }

    #[test]
    fn all_prior_ignores_links_seen_in_any_earlier_run() {
        let diffs = diff_against_all_prior(&history());
        let counts: Vec<_> = diffs.iter().map(RunDiff::new_count).collect();
        assert_eq!(counts, vec![3, 1, 2]);
        assert_eq!(diffs[1].new_links, set(&["c"]));
        assert_eq!(diffs[2].new_links, set(&["d", "s1"]));
    }

    #[test]
    fn previous_run_only_looks_one_back() {
        let diffs = diff_against_previous_run(&history());
        assert_eq!(diffs[1].new_links, set(&["c"]));
        // "a" and "h1" vanished in run 2, so they are new again in run 3.
        assert_eq!(diffs[2].new_links, set(&["a", "d", "h1", "s1"]));
    }

    #[test]
    fn all_prior_is_idempotent() {
        let h = history();
        assert_eq!(diff_against_all_prior(&h), diff_against_all_prior(&h));
    }

    #[test]
    fn union_of_new_links_covers_every_link() {
        let h = history();
        let from_diffs: BTreeSet<String> = diff_against_all_prior(&h)
            .into_iter()
            .flat_map(|d| d.new_links)
            .collect();
        let everything: BTreeSet<String> = h
            .iter()
            .flat_map(|(_, s)| s.flatten())
            .map(str::to_string)
            .collect();
        assert_eq!(from_diffs, everything);
    }

    #[test]
    fn current_diff_is_per_target() {
        let current = diff_against_immediate_prior(&history());
        assert_eq!(current.len(), 2);
        assert_eq!(current["flats"], set(&["d"]));
        assert_eq!(current["studios"], set(&["s1"]));
    }

    #[test]
    fn current_diff_of_single_snapshot_is_everything() {
        let h: Vec<(RunBucket, RunSnapshot)> = vec![(
            "2026-10-19-08".parse().unwrap(),
            snap(&[("flats", &["a"])]),
        )];
        assert_eq!(diff_against_immediate_prior(&h)["flats"], set(&["a"]));
    }

    #[test]
    fn empty_history() {
        assert!(diff_against_all_prior(&[]).is_empty());
        assert!(diff_against_immediate_prior(&[]).is_empty());
    }
}
