//! Crawl target data structure.

use std::fmt;

use crate::models::SlugConfig;

/// One fully parameterized search URL to paginate and scrape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrawlTarget {
    url: String,
}

impl CrawlTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Derive the file-name identifier for this target from its filter path.
    ///
    /// The host is dropped and the remaining path and query fragments are
    /// joined with `-`, e.g. `https://site.ro/a/b/?area=unirii` becomes
    /// `a-b-unirii` with the default rules.
    pub fn slug(&self, rules: &SlugConfig) -> String {
        let rewritten = rules.rewrite(&self.url).replace('?', "");

        let mut path = rewritten.as_str();
        if let Some(idx) = path.find("://") {
            path = &path[idx + 3..];
        }

        let slug = path
            .split('/')
            .skip(1)
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        if slug.is_empty() {
            "index".to_string()
        } else {
            slug
        }
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_drops_scheme_and_host() {
        let target = CrawlTarget::new(
            "https://www.site.ro/anunturi/apartamente/bucuresti/?area=unirii&commercial=true",
        );
        assert_eq!(
            target.slug(&SlugConfig::default()),
            "anunturi-apartamente-bucuresti-unirii&commercial-true"
        );
    }

    #[test]
    fn slug_without_scheme() {
        let target = CrawlTarget::new("site/?x=1");
        assert_eq!(target.slug(&SlugConfig::default()), "x=1");
    }

    #[test]
    fn slug_collapses_double_slashes() {
        let target = CrawlTarget::new("https://site.ro//a//b/");
        assert_eq!(target.slug(&SlugConfig::default()), "a-b");
    }

    #[test]
    fn slug_of_bare_host_is_index() {
        let target = CrawlTarget::new("https://site.ro/");
        assert_eq!(target.slug(&SlugConfig::default()), "index");
    }
}
