// src/lib.rs

//! listwatch: classifieds search crawler.
//!
//! Expands search filter configs into result-page URLs, crawls every page of
//! each search into an hourly run bucket and diffs the listing links found
//! against earlier runs.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
