//! Search filter configuration.
//!
//! A filter file describes a tree of URL fragments that expands into every
//! search the crawler runs. Example:
//!
//! ```json
//! {
//!   "base_link": "https://www.example.ro/anunturi/apartamente/",
//!   "link_mods": ["2-camere/", "3-camere/"],
//!   "spec_mods": {
//!     "&area=": {
//!       "apply_to_all": ["unirii", "centru"],
//!       "3-camere": ["titan"]
//!     }
//!   }
//! }
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Key inside a modifier block that applies to every URL.
pub const APPLY_TO_ALL: &str = "apply_to_all";

/// Declarative filter configuration for one search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterConfig {
    /// Prefix shared by every generated URL
    pub base_link: String,

    /// First-level variants appended to `base_link`
    pub link_mods: Vec<String>,

    /// Nested expansion stages, applied in declaration order
    pub spec_mods: IndexMap<String, ModBlock>,
}

/// Values for one modifier key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ModBlock {
    /// Values appended to every URL in the working set
    #[serde(default)]
    pub apply_to_all: Vec<String>,

    /// Values appended only to URLs containing the key as a substring
    #[serde(flatten)]
    pub rules: IndexMap<String, Vec<String>>,
}

impl FilterConfig {
    /// Parse a filter config from JSON text.
    pub fn from_json(path: impl AsRef<Path>, content: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(content).map_err(|e| AppError::malformed(path.as_ref(), e))?;
        config.validate(path.as_ref())?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.base_link.trim().is_empty() {
            return Err(AppError::malformed(path, "base_link is empty"));
        }
        Ok(())
    }
}

/// A named filter configuration, as read from `search_configs/<name>.json`.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// File stem; also the name of the output directory
    pub name: String,
    pub filters: FilterConfig,
}

impl SearchConfig {
    /// Load and validate a filter file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::malformed(path, "file name has no usable stem"))?
            .to_string();

        let content = fs::read_to_string(path)?;
        let filters = FilterConfig::from_json(path, &content)?;

        Ok(Self { name, filters })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ordered_spec_mods() {
        let json = r#"{
            "base_link": "https://site/",
            "link_mods": ["a/"],
            "spec_mods": {
                "&z=": {"apply_to_all": ["1"]},
                "&a=": {"b": ["2"], "a": ["3"]}
            }
        }"#;

        let config = FilterConfig::from_json("test.json", json).unwrap();
        let keys: Vec<_> = config.spec_mods.keys().collect();
        assert_eq!(keys, vec!["&z=", "&a="]);

        let block = &config.spec_mods["&a="];
        assert!(block.apply_to_all.is_empty());
        let rule_keys: Vec<_> = block.rules.keys().collect();
        assert_eq!(rule_keys, vec!["b", "a"]);
    }

    #[test]
    fn apply_to_all_is_not_a_rule() {
        let json = r#"{
            "base_link": "x",
            "link_mods": [],
            "spec_mods": {"&k=": {"apply_to_all": ["v"], "sub": ["w"]}}
        }"#;

        let config = FilterConfig::from_json("test.json", json).unwrap();
        let block = &config.spec_mods["&k="];
        assert_eq!(block.apply_to_all, vec!["v"]);
        assert!(!block.rules.contains_key(APPLY_TO_ALL));
        assert_eq!(block.rules["sub"], vec!["w"]);
    }

    #[test]
    fn missing_field_is_malformed() {
        let json = r#"{"base_link": "x", "link_mods": []}"#;
        let err = FilterConfig::from_json("broken.json", json).unwrap_err();
        assert!(matches!(err, AppError::ConfigMalformed { .. }));
    }

    #[test]
    fn blank_base_link_is_malformed() {
        let json = r#"{"base_link": " ", "link_mods": [], "spec_mods": {}}"#;
        let err = FilterConfig::from_json("blank.json", json).unwrap_err();
        assert!(matches!(err, AppError::ConfigMalformed { .. }));
    }

    #[test]
    fn search_config_name_is_file_stem() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("flats.json");
        fs::write(
            &path,
            r#"{"base_link": "site/?", "link_mods": ["x=1"], "spec_mods": {}}"#,
        )
        .unwrap();

        let search = SearchConfig::load(&path).unwrap();
        assert_eq!(search.name, "flats");
        assert_eq!(search.filters.link_mods, vec!["x=1"]);
    }
}
