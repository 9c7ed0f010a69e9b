//! Pipeline entry points.
//!
//! - `run_crawler`: crawl every search config into the current run bucket
//! - `clean_failed_runs`: remove runs that never committed a snapshot
//! - `diff` / `report`: read-only views over committed snapshots

pub mod cleanup;
pub mod crawl;
pub mod diff;
pub mod report;

pub use cleanup::clean_failed_runs;
pub use crawl::{
    RunOptions, RunOrchestrator, RunReport, TargetReport, TargetStatus, run_crawler,
};
pub use diff::{
    DiffBaseline, RunDiff, SnapshotDiffer, diff_against_all_prior, diff_against_immediate_prior,
    diff_against_previous_run,
};
pub use report::{TimetableRow, format_links, timetable};
