//! Flat output rows written to the delimited file.

use serde::{Deserialize, Serialize};

use super::{EpisodeDetail, EpisodeMetadata};

/// Inner delimiter for list-valued fields.
///
/// Distinct from the outer `,` field delimiter so list cells survive a
/// round trip through the CSV writer without extra escaping.
pub const LIST_DELIMITER: &str = "; ";

/// Marks an empty item, so `[""]` and `[]` produce different cells.
const EMPTY_ITEM: &str = "\\-";

/// Join a list-valued field into a single cell.
///
/// `\` and `;` inside an item are backslash-escaped and an empty item is
/// written as `\-`, so [`split_list`] returns exactly the items given.
pub fn join_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| escape_item(item))
        .collect::<Vec<_>>()
        .join(LIST_DELIMITER)
}

fn escape_item(item: &str) -> String {
    if item.is_empty() {
        return EMPTY_ITEM.to_string();
    }
    let mut escaped = String::with_capacity(item.len());
    for c in item.chars() {
        if c == '\\' || c == ';' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Split a cell written by [`join_list`] back into its items.
///
/// An empty cell is an empty list. Only an unescaped `"; "` separates items.
pub fn split_list(cell: &str) -> Vec<String> {
    if cell.is_empty() {
        return Vec::new();
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = cell.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('-') => {}
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            },
            ';' if chars.peek() == Some(&' ') => {
                chars.next();
                items.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    items.push(current);
    items
}

/// One row of the output file. Field order is the column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub video_id: String,
    pub video_title: String,
    pub video_description: String,
    pub video_url: String,
    pub video_resources: String,
    pub timestamps: String,
    pub timestamp_descriptions: String,
    pub show_notes: String,
    pub thumbnail: String,
    pub category: String,
    pub publish_date: String,
    pub month_year: String,
    pub primary_topic: String,
    pub topics: String,
}

impl OutputRecord {
    /// Build a row from listing metadata and the detail fetched for the same link.
    pub fn from_parts(meta: &EpisodeMetadata, detail: Option<&EpisodeDetail>) -> Self {
        let (resources, timestamps, descriptions, notes) = match detail {
            Some(d) => (
                join_list(&d.resources),
                join_list(&d.timestamps),
                join_list(&d.timestamp_descriptions),
                d.show_notes.clone().unwrap_or_default(),
            ),
            None => Default::default(),
        };

        Self {
            video_id: meta.id.to_string(),
            video_title: meta.title.clone().unwrap_or_default(),
            video_description: meta.description.clone().unwrap_or_default(),
            video_url: meta.link.clone(),
            video_resources: resources,
            timestamps,
            timestamp_descriptions: descriptions,
            show_notes: notes,
            thumbnail: meta.thumbnail.clone().unwrap_or_default(),
            category: meta.category.clone().unwrap_or_default(),
            publish_date: meta.publish_date.clone().unwrap_or_default(),
            month_year: meta
                .month_year
                .map(|my| my.to_string())
                .unwrap_or_default(),
            primary_topic: meta.primary_topic.clone().unwrap_or_default(),
            topics: join_list(&meta.topics),
        }
    }

    pub fn topic_list(&self) -> Vec<String> {
        split_list(&self.topics)
    }

    pub fn resource_list(&self) -> Vec<String> {
        split_list(&self.video_resources)
    }

    pub fn timestamp_list(&self) -> Vec<String> {
        split_list(&self.timestamps)
    }
}
