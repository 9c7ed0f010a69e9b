// src/utils/url.rs

//! URL manipulation utilities.

use regex::Regex;

use crate::error::{AppError, Result};

/// The site's page-number query parameter.
///
/// Page 1 of a search carries no page parameter; later pages carry
/// `<name>=<n>`. This is the only place that knows how the site spells it.
#[derive(Debug, Clone)]
pub struct PageParam {
    name: String,
    pattern: Regex,
}

impl PageParam {
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(AppError::validation("page parameter name is empty"));
        }
        let pattern = Regex::new(&format!(r"[?&]{}=", regex::escape(name)))
            .map_err(|e| AppError::config(format!("bad page parameter '{name}': {e}")))?;

        Ok(Self {
            name: name.to_string(),
            pattern,
        })
    }

    /// Whether the URL points at an explicit result page.
    pub fn is_present(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }

    /// The URL with its page parameter (and anything after it) replaced by `page`.
    pub fn with_page(&self, url: &str, page: u32) -> String {
        let base = match self.pattern.find(url) {
            Some(m) => &url[..m.start()],
            None => url,
        };
        let separator = if base.contains('?') { '&' } else { '?' };
        format!("{base}{separator}{}={page}", self.name)
    }
}

/// Resolve a potentially relative URL against a base URL.
///
/// Falls back to `href` unchanged when the base is not an absolute URL.
///
/// # Examples
/// ```
/// use listwatch::utils::url::resolve;
///
/// assert_eq!(
///     resolve("https://example.com/path/", "/ad/123.html"),
///     "https://example.com/ad/123.html"
/// );
/// assert_eq!(resolve("site/?x=1", "/ad/123.html"), "/ad/123.html");
/// ```
pub fn resolve(base: &str, href: &str) -> String {
    url::Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pag() -> PageParam {
        PageParam::new("pag").unwrap()
    }

    #[test]
    fn detects_page_param() {
        let p = pag();
        assert!(p.is_present("https://site/?x=1&pag=3"));
        assert!(p.is_present("https://site/?pag=3"));
        assert!(!p.is_present("https://site/?x=1"));
        assert!(!p.is_present("https://site/?xpag=3"));
    }

    #[test]
    fn appends_page_param() {
        let p = pag();
        assert_eq!(p.with_page("https://site/?x=1", 2), "https://site/?x=1&pag=2");
        assert_eq!(p.with_page("https://site/a/", 2), "https://site/a/?pag=2");
    }

    #[test]
    fn replaces_existing_page_param() {
        let p = pag();
        assert_eq!(
            p.with_page("https://site/?x=1&pag=7", 8),
            "https://site/?x=1&pag=8"
        );
        assert_eq!(p.with_page("https://site/?pag=7", 8), "https://site/?pag=8");
    }

    #[test]
    fn rejects_empty_name() {
        assert!(PageParam::new("").is_err());
    }

    #[test]
    fn test_resolve() {
        assert_eq!(
            resolve("https://example.com/path/", "page.html"),
            "https://example.com/path/page.html"
        );
        assert_eq!(
            resolve("https://example.com/path/", "https://other.com/x"),
            "https://other.com/x"
        );
    }
}
