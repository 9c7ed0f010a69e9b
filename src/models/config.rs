//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Listing link extraction selectors
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Rules turning a target URL into a file-name slug
    #[serde(default)]
    pub slug: SlugConfig,

    /// Input and output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Run lifecycle settings
    #[serde(default)]
    pub run: RunConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.crawler.part_size == 0 {
            return Err(AppError::validation("crawler.part_size must be > 0"));
        }
        if self.crawler.page_param.trim().is_empty() {
            return Err(AppError::validation("crawler.page_param is empty"));
        }
        if self.crawler.no_results_marker.is_empty() {
            return Err(AppError::validation("crawler.no_results_marker is empty"));
        }
        if self.extract.link_attr.trim().is_empty() {
            return Err(AppError::validation("extract.link_attr is empty"));
        }
        for selector in [&self.extract.item_selector, &self.extract.link_selector] {
            scraper::Selector::parse(selector)
                .map_err(|e| AppError::selector(selector.as_str(), format!("{e:?}")))?;
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Pause after every page fetch in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Number of targets crawled at once (pages of one target are always sequential)
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Query parameter the site uses for the result page number
    #[serde(default = "defaults::page_param")]
    pub page_param: String,

    /// Text the site renders when a search has no listings
    #[serde(default = "defaults::no_results_marker")]
    pub no_results_marker: String,

    /// Pages per output part once a target gets long
    #[serde(default = "defaults::part_size")]
    pub part_size: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
            page_param: defaults::page_param(),
            no_results_marker: defaults::no_results_marker(),
            part_size: defaults::part_size(),
        }
    }
}

/// Selectors used to pull listing links out of a result page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// CSS selector for one listing entry
    #[serde(default = "defaults::item_selector")]
    pub item_selector: String,

    /// CSS selector for the link inside an entry
    #[serde(default = "defaults::link_selector")]
    pub link_selector: String,

    /// HTML attribute holding the listing URL
    #[serde(default = "defaults::link_attr")]
    pub link_attr: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            item_selector: defaults::item_selector(),
            link_selector: defaults::link_selector(),
            link_attr: defaults::link_attr(),
        }
    }
}

/// Text rewriting applied to a target URL before it becomes a slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlugConfig {
    /// Substrings removed from the URL
    #[serde(default = "defaults::slug_remove_patterns")]
    pub remove_patterns: Vec<String>,

    /// Replacements applied after removal
    #[serde(default = "defaults::slug_replacements")]
    pub replacements: Vec<Replacement>,
}

impl Default for SlugConfig {
    fn default() -> Self {
        Self {
            remove_patterns: defaults::slug_remove_patterns(),
            replacements: defaults::slug_replacements(),
        }
    }
}

impl SlugConfig {
    /// Apply removal patterns, then replacements.
    pub fn rewrite(&self, text: &str) -> String {
        let mut result = text.to_string();

        for pattern in &self.remove_patterns {
            result = result.replace(pattern, "");
        }

        for r in &self.replacements {
            result = result.replace(&r.from, &r.to);
        }

        result
    }
}

/// A text replacement rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

/// File system locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the JSON search filter files
    #[serde(default = "defaults::configs_dir")]
    pub configs_dir: String,

    /// Root directory for page sources and snapshots
    #[serde(default = "defaults::output_dir")]
    pub output_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            configs_dir: defaults::configs_dir(),
            output_dir: defaults::output_dir(),
        }
    }
}

/// Run lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Delete uncommitted bucket directories before crawling
    #[serde(default = "defaults::clean_failed_runs")]
    pub clean_failed_runs: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            clean_failed_runs: defaults::clean_failed_runs(),
        }
    }
}

mod defaults {
    use super::Replacement;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        1000
    }
    pub fn max_concurrent() -> usize {
        1
    }
    pub fn page_param() -> String {
        "pag".into()
    }
    pub fn no_results_marker() -> String {
        "Nu am găsit ceea ce cauți.".into()
    }
    pub fn part_size() -> u32 {
        25
    }

    // Extraction defaults
    pub fn item_selector() -> String {
        "li[data-adid]".into()
    }
    pub fn link_selector() -> String {
        "a".into()
    }
    pub fn link_attr() -> String {
        "href".into()
    }

    // Slug defaults
    pub fn slug_remove_patterns() -> Vec<String> {
        vec!["area=".into()]
    }
    pub fn slug_replacements() -> Vec<Replacement> {
        vec![Replacement {
            from: "commercial=".into(),
            to: "commercial-".into(),
        }]
    }

    // Path defaults
    pub fn configs_dir() -> String {
        "search_configs".into()
    }
    pub fn output_dir() -> String {
        "page_source_folder".into()
    }

    pub fn clean_failed_runs() -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_part_size() {
        let mut config = Config::default();
        config.crawler.part_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = Config::default();
        config.extract.item_selector = "[[invalid".to_string();
        assert!(matches!(
            config.validate(),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            request_delay_ms = 250

            [paths]
            output_dir = "out"
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.request_delay_ms, 250);
        assert_eq!(config.crawler.page_param, "pag");
        assert_eq!(config.crawler.part_size, 25);
        assert_eq!(config.paths.output_dir, "out");
        assert_eq!(config.paths.configs_dir, "search_configs");
        assert!(config.run.clean_failed_runs);
    }

    #[test]
    fn slug_rewrite_applies_removals_then_replacements() {
        let slug = SlugConfig::default();
        assert_eq!(
            slug.rewrite("bucuresti/?area=unirii&commercial=true"),
            "bucuresti/?unirii&commercial-true"
        );
    }
}
