//! Episode models surfaced by the listing and detail pages.
//!
//! Metadata comes from the paginated listing page; details come from the
//! per-episode page. The two are correlated by `link`, never by position.

use std::fmt;
use std::str::FromStr;

use chrono::Month;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Month and year of a date-grouped section on the listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthYear {
    pub month: Month,
    pub year: i32,
}

impl MonthYear {
    /// Parse a group header such as `"March 2024"`.
    ///
    /// Surrounding whitespace and repeated inner whitespace are tolerated.
    /// Returns `None` unless the text is exactly a month name followed by a year.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let month = parts.next()?;
        let year = parts.next()?;
        if parts.next().is_some() {
            return None;
        }

        let month = Month::from_str(month).ok()?;
        let year = year.parse::<i32>().ok()?;
        Some(Self { month, year })
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month.name(), self.year)
    }
}

impl Serialize for MonthYear {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthYear {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        MonthYear::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid month/year: {s:?}")))
    }
}

/// Episode metadata as listed on the paginated listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    /// Generated identifier. Not content-addressed: re-running yields new ids.
    pub id: Uuid,
    /// Relative URL of the episode's detail page.
    pub link: String,
    /// Month/year of the date group the episode was listed under.
    pub month_year: Option<MonthYear>,
    pub thumbnail: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Publish date exactly as the site renders it (unvalidated).
    pub publish_date: Option<String>,
    pub primary_topic: Option<String>,
    /// Secondary topics, in listing order.
    pub topics: Vec<String>,
}

impl EpisodeMetadata {
    /// Create metadata for `link` with a fresh id and no other fields set.
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            link: link.into(),
            month_year: None,
            thumbnail: None,
            title: None,
            description: None,
            category: None,
            publish_date: None,
            primary_topic: None,
            topics: Vec::new(),
        }
    }
}

/// Content extracted from an episode's detail page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeDetail {
    /// Link this detail was fetched for (join key against [`EpisodeMetadata::link`]).
    pub link: String,
    /// Paragraph and list-item texts of the notes container, joined by single spaces.
    pub show_notes: Option<String>,
    /// Hrefs listed under the resources heading.
    pub resources: Vec<String>,
    /// Hrefs of the timestamp entries.
    pub timestamps: Vec<String>,
    /// Text of the timestamp entries, parallel to `timestamps`.
    pub timestamp_descriptions: Vec<String>,
}

impl EpisodeDetail {
    /// An empty detail for `link`, used when the page could not be fetched.
    pub fn empty(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            ..Default::default()
        }
    }
}
