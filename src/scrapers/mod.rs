//! Scrapers for the episode listing and episode detail pages.

pub mod browser;
pub mod config;
pub mod detail;
pub mod http_client;
pub mod listing;

pub use browser::{BrowserEngineConfig, BrowserError, BrowserSession, PageDriver};
pub use config::{DetailSelectors, ListingSelectors, WalkerConfig};
pub use detail::{parse_episode_detail, DetailFetcher, DetailPage, DetailParser};
pub use http_client::{FetchText, HttpClient};
pub use listing::{parse_listing_page, ListingBatch, ListingParser, ListingWalker, NextPage};

use scraper::{ElementRef, Selector};

/// Errors from scraping.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("Invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },
}

/// Compile a CSS selector, naming it in the error.
pub(crate) fn compile_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Text content of an element, trimmed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// `Some(s)` unless `s` is blank.
pub(crate) fn non_empty(s: impl Into<String>) -> Option<String> {
    let s = s.into();
    if s.trim().is_empty() {
        None
    } else {
        Some(s.trim().to_string())
    }
}

/// Resolve a path to a full URL, handling both absolute and relative paths.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{}{}", base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("https://site.test", "/episode/x"),
            "https://site.test/episode/x"
        );
        assert_eq!(
            resolve_url("https://site.test", "https://other.test/a"),
            "https://other.test/a"
        );
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  x "), Some("x".to_string()));
        assert_eq!(non_empty("   "), None);
        assert_eq!(non_empty(""), None);
    }

    #[test]
    fn test_compile_selector_error_names_selector() {
        let err = compile_selector("div[").unwrap_err();
        assert!(err.to_string().contains("div["));
    }
}
