// src/services/extractor.rs

//! Listing link extraction from stored result pages.

use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::ExtractConfig;
use crate::utils::url::resolve;

/// Pulls listing URLs out of one HTML document.
pub trait LinkExtractor: Send + Sync {
    /// `base_url` is the search URL the document came from, used to resolve
    /// relative links.
    fn extract(&self, html: &str, base_url: &str) -> Vec<String>;
}

/// Extracts the link attribute of the first link element inside each
/// listing entry.
pub struct SelectorLinkExtractor {
    item: Selector,
    link: Selector,
    attr: String,
}

impl SelectorLinkExtractor {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            item: Self::parse_selector(&config.item_selector)?,
            link: Self::parse_selector(&config.link_selector)?,
            attr: config.link_attr.clone(),
        })
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

impl LinkExtractor for SelectorLinkExtractor {
    fn extract(&self, html: &str, base_url: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        document
            .select(&self.item)
            .filter_map(|item| item.select(&self.link).next())
            .filter_map(|link| link.value().attr(&self.attr))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(|href| resolve(base_url, href))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SelectorLinkExtractor {
        SelectorLinkExtractor::new(&ExtractConfig::default()).unwrap()
    }

    #[test]
    fn extracts_links_from_listing_items() {
        let html = r#"
            <ul>
              <li data-adid="1"><a href="https://site.ro/ad/1.html">One</a></li>
              <li data-adid="2"><div><a href="/ad/2.html">Two</a><a href="/other">x</a></div></li>
              <li><a href="https://site.ro/not-an-ad">Nav</a></li>
              <li data-adid="3"><span>no link</span></li>
            </ul>
        "#;

        let links = extractor().extract(html, "https://site.ro/search/?x=1");
        assert_eq!(
            links,
            vec!["https://site.ro/ad/1.html", "https://site.ro/ad/2.html"]
        );
    }

    #[test]
    fn concatenated_pages_are_one_document() {
        let page = |id: u32| {
            format!(r#"<html><body><li data-adid="{id}"><a href="/ad/{id}">ad</a></li></body></html>"#)
        };
        let html = format!("{}{}", page(1), page(2));

        let links = extractor().extract(&html, "https://site.ro/");
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn relative_links_kept_without_absolute_base() {
        let html = r#"<li data-adid="1"><a href="/ad/1">ad</a></li>"#;
        assert_eq!(extractor().extract(html, "site/?x=1"), vec!["/ad/1"]);
    }

    #[test]
    fn invalid_selector_is_rejected() {
        let config = ExtractConfig {
            item_selector: "[[invalid".into(),
            ..ExtractConfig::default()
        };
        assert!(SelectorLinkExtractor::new(&config).is_err());
    }
}
