// src/services/expander.rs

//! Filter expansion.
//!
//! Turns a [`FilterConfig`] into the flat, ordered list of search URLs to crawl.
//! Each `spec_mods` entry is one expansion stage folded over the working set;
//! a URL that no rule of a stage applies to is carried forward unchanged so a
//! filter dimension is never silently dropped.

use crate::models::{APPLY_TO_ALL, CrawlTarget, FilterConfig, ModBlock};

/// Expand a filter configuration into crawl targets.
///
/// Output order is stable for identical input. Duplicates are kept.
pub fn expand(config: &FilterConfig) -> Vec<CrawlTarget> {
    let initial: Vec<String> = config
        .link_mods
        .iter()
        .map(|m| format!("{}{}", config.base_link, m))
        .collect();

    config
        .spec_mods
        .iter()
        .fold(initial, |links, (key, block)| expand_stage(&links, key, block))
        .into_iter()
        .map(|link| CrawlTarget::new(link.replace("/&", "/?")))
        .collect()
}

/// Apply one modifier block to every URL of the working set.
fn expand_stage(links: &[String], key: &str, block: &ModBlock) -> Vec<String> {
    let mut emitted = Vec::new();
    let mut leftover = Vec::new();

    for link in links {
        let before = emitted.len();

        emitted.extend(block.apply_to_all.iter().map(|m| format!("{link}{key}{m}")));

        for (substring, mods) in &block.rules {
            if substring == APPLY_TO_ALL || !link.contains(substring.as_str()) {
                continue;
            }
            emitted.extend(mods.iter().map(|m| format!("{link}{key}{m}")));
        }

        if emitted.len() == before {
            leftover.push(link.clone());
        }
    }

    log::debug!(
        "Stage '{}': {} in, {} expanded, {} carried over",
        key,
        links.len(),
        emitted.len(),
        leftover.len()
    );

    emitted.extend(leftover);
    emitted
}
