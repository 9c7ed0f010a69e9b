// src/pipeline/report.rs

//! Read-only views over a configuration's run history.

use std::collections::BTreeSet;

use crate::models::{RunBucket, RunSnapshot};

use super::diff::{diff_against_all_prior, diff_against_previous_run};

/// One line of the run timetable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableRow {
    pub bucket: RunBucket,
    pub total_links: usize,
    pub new_since_previous: usize,
    pub new_since_all: usize,
}

/// Per-run link counts, oldest first.
pub fn timetable(history: &[(RunBucket, RunSnapshot)]) -> Vec<TimetableRow> {
    diff_against_previous_run(history)
        .into_iter()
        .zip(diff_against_all_prior(history))
        .map(|(previous, all)| TimetableRow {
            bucket: previous.bucket,
            total_links: previous.total_links,
            new_since_previous: previous.new_count(),
            new_since_all: all.new_count(),
        })
        .collect()
}

/// Render links grouped by target as numbered lines.
///
/// Targets without links are left out.
pub fn format_links<'a, I>(groups: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a BTreeSet<String>)>,
{
    let mut lines = Vec::new();
    for (slug, links) in groups {
        if links.is_empty() {
            continue;
        }
        lines.push(format!("{} ({})", slug, links.len()));
        lines.extend(
            links
                .iter()
                .enumerate()
                .map(|(i, link)| format!("  {:>3}. {}", i + 1, link)),
        );
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn snapshot(entries: &[(&str, &[&str])]) -> RunSnapshot {
        let mut snapshot = RunSnapshot::new();
        for (slug, links) in entries {
            snapshot.insert(*slug, links.iter().copied());
        }
        snapshot
    }

    #[test]
    fn timetable_counts_both_baselines() {
        let history = vec![
            ("2026-10-19-08".parse().unwrap(), snapshot(&[("f", &["a", "b"])])),
            ("2026-10-19-09".parse().unwrap(), snapshot(&[("f", &["b", "c"])])),
            ("2026-10-19-10".parse().unwrap(), snapshot(&[("f", &["a", "c"])])),
        ];

        let rows = timetable(&history);
        let counts: Vec<_> = rows
            .iter()
            .map(|r| (r.total_links, r.new_since_previous, r.new_since_all))
            .collect();
        assert_eq!(counts, vec![(2, 2, 2), (2, 1, 1), (2, 1, 0)]);
        assert_eq!(rows[2].bucket.to_string(), "2026-10-19-10");
    }

    #[test]
    fn format_skips_empty_targets() {
        let mut groups = BTreeMap::new();
        groups.insert("flats".to_string(), BTreeSet::from(["u1".to_string(), "u2".to_string()]));
        groups.insert("houses".to_string(), BTreeSet::new());

        let lines = format_links(groups.iter().map(|(k, v)| (k.as_str(), v)));
        assert_eq!(lines, vec!["flats (2)", "    1. u1", "    2. u2"]);
    }
}
