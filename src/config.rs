// src/config.rs

//! Configuration loading utilities.
//!
//! Locates and loads the search filter configs of an invocation.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::SearchConfig;

/// Resolve which filter files to use.
///
/// With no names, every `*.json` file in `configs_dir` is used, sorted by
/// file name. Named files are looked up relative to `configs_dir` unless the
/// name is already a path to an existing file.
pub fn search_config_paths(configs_dir: &Path, names: &[String]) -> Result<Vec<PathBuf>> {
    if names.is_empty() {
        let entries = std::fs::read_dir(configs_dir).map_err(|e| {
            AppError::config(format!(
                "Cannot read config directory {}: {}",
                configs_dir.display(),
                e
            ))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(AppError::config(format!(
                "No search configs found in {}",
                configs_dir.display()
            )));
        }
        return Ok(paths);
    }

    names
        .iter()
        .map(|name| {
            let direct = PathBuf::from(name);
            if direct.is_file() {
                return Ok(direct);
            }
            let path = configs_dir.join(name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(AppError::config(format!(
                    "Search config not found: {}",
                    path.display()
                )))
            }
        })
        .collect()
}

/// Load and parse every selected search config.
///
/// All files are parsed up front so one malformed file aborts before any
/// network activity.
pub fn load_search_configs(configs_dir: &Path, names: &[String]) -> Result<Vec<SearchConfig>> {
    let configs = search_config_paths(configs_dir, names)?
        .iter()
        .map(SearchConfig::load)
        .collect::<Result<Vec<_>>>()?;

    log::info!(
        "Loaded {} search config(s): {}",
        configs.len(),
        configs
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FLATS: &str = r#"{"base_link": "https://site.ro/flats/?", "link_mods": ["a=1"], "spec_mods": {}}"#;

    #[test]
    fn loads_all_json_files_sorted() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("zeta.json"), FLATS).unwrap();
        std::fs::write(tmp.path().join("alpha.json"), FLATS).unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let configs = load_search_configs(tmp.path(), &[]).unwrap();
        let names: Vec<_> = configs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn missing_named_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("flats.json"), FLATS).unwrap();

        let names = vec!["flats.json".to_string(), "houses.json".to_string()];
        let err = load_search_configs(tmp.path(), &names).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn one_malformed_file_fails_everything() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("flats.json"), FLATS).unwrap();
        std::fs::write(tmp.path().join("houses.json"), r#"{"link_mods": "#).unwrap();

        let err = load_search_configs(tmp.path(), &[]).unwrap_err();
        assert!(matches!(err, AppError::ConfigMalformed { .. }));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load_search_configs(tmp.path(), &[]).is_err());
    }
}
