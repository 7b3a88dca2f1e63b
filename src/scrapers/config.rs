//! Scraper configuration: page selectors and walker timing.
//!
//! Defaults match the episode listing site's current markup. Every selector
//! is overridable from the config file when the markup shifts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// CSS selectors used when parsing the rendered listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// Results container.
    pub container: String,
    /// Ordered list whose direct `li` children are the date groups.
    pub groups: String,
    /// Header inside a group carrying the "Month Year" text.
    pub group_header: String,
    /// Individual episode entry inside a group.
    pub entry: String,
    pub link: String,
    /// Image whose `src` is the thumbnail and `alt` the title.
    pub image: String,
    pub description: String,
    /// Element carrying the category/date/primary-topic attributes.
    pub hit: String,
    pub category_attr: String,
    pub date_attr: String,
    pub primary_topic_attr: String,
    /// Topic links inside an entry.
    pub topics: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            container: "div#hits".to_string(),
            groups: "ol.topics-section".to_string(),
            group_header: "h2".to_string(),
            entry: "li.ais-Hits-item".to_string(),
            link: "a[href]".to_string(),
            image: "img".to_string(),
            description: "div.description".to_string(),
            hit: "div.hit".to_string(),
            category_attr: "algolia-category".to_string(),
            date_attr: "algolia-date".to_string(),
            primary_topic_attr: "algolia-primarytopic".to_string(),
            topics: "div.topics-list a".to_string(),
        }
    }
}

/// CSS selectors used when parsing an episode's detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    /// Show notes container.
    pub notes_container: String,
    /// Nodes inside the container whose text forms the show notes.
    pub notes_items: String,
    /// Heading followed by the resources list.
    pub resources_heading: String,
    /// Heading followed by the timestamps list.
    pub timestamps_heading: String,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            notes_container: "div.rich-text-episode-notes".to_string(),
            notes_items: "p, li".to_string(),
            resources_heading: "#h-resources".to_string(),
            timestamps_heading: "#h-timestamps".to_string(),
        }
    }
}

/// Timing and bounds for the listing walker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// "Next page" control. Must only match while another page exists.
    pub next_selector: String,
    /// Pause after each scroll-to-bottom, in milliseconds.
    pub scroll_pause_ms: u64,
    /// Upper bound on scroll rounds per page.
    pub max_scroll_iterations: u32,
    /// How long to wait for the results container to render, in milliseconds.
    pub ready_timeout_ms: u64,
    /// How long to wait for the "next" control to become clickable, in milliseconds.
    pub next_wait_timeout_ms: u64,
    /// Polling interval for bounded waits, in milliseconds.
    pub poll_interval_ms: u64,
    /// Pause after clicking "next", in milliseconds.
    pub page_pause_ms: u64,
    /// Stop after this many pages (0 = unlimited).
    pub max_pages: u32,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            next_selector: "li.ais-Pagination-item--nextPage:not(.ais-Pagination-item--disabled) a"
                .to_string(),
            scroll_pause_ms: 1000,
            max_scroll_iterations: 50,
            ready_timeout_ms: 20_000,
            next_wait_timeout_ms: 20_000,
            poll_interval_ms: 250,
            page_pause_ms: 2000,
            max_pages: 0,
        }
    }
}

impl WalkerConfig {
    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn next_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.next_wait_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn page_pause(&self) -> Duration {
        Duration::from_millis(self.page_pause_ms)
    }
}
