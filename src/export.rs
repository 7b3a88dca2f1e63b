//! Record assembly and CSV export.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use crate::models::{EpisodeDetail, EpisodeMetadata, ExtractionWarning, OutputRecord};

/// Output column order. Matches the field order of [`OutputRecord`].
pub const COLUMNS: [&str; 14] = [
    "video_id",
    "video_title",
    "video_description",
    "video_url",
    "video_resources",
    "timestamps",
    "timestamp_descriptions",
    "show_notes",
    "thumbnail",
    "category",
    "publish_date",
    "month_year",
    "primary_topic",
    "topics",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Join listing metadata with details by link.
///
/// One record per metadata entry, in listing order. An entry with no detail
/// gets empty detail columns and a warning.
pub fn assemble(
    episodes: &[EpisodeMetadata],
    details: &HashMap<String, EpisodeDetail>,
) -> Vec<OutputRecord> {
    let (records, warnings) = assemble_with_warnings(episodes, details);
    for warning in &warnings {
        warning.log();
    }
    records
}

/// [`assemble`], returning the missing-detail warnings instead of logging them.
pub fn assemble_with_warnings(
    episodes: &[EpisodeMetadata],
    details: &HashMap<String, EpisodeDetail>,
) -> (Vec<OutputRecord>, Vec<ExtractionWarning>) {
    let mut warnings = Vec::new();
    let records = episodes
        .iter()
        .map(|meta| {
            let detail = details.get(&meta.link);
            if detail.is_none() {
                warnings.push(ExtractionWarning::new(
                    Some(meta.link.as_str()),
                    "detail",
                    "no detail fetched; detail columns left empty",
                ));
            }
            OutputRecord::from_parts(meta, detail)
        })
        .collect();
    (records, warnings)
}

/// Write the header and `records` to `path`, creating parent directories.
pub fn write_records(path: &Path, records: &[OutputRecord]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }

    // Header written by hand so an empty run still produces a valid file.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;

    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Load records previously written by [`write_records`].
pub fn read_records(path: &Path) -> Result<Vec<OutputRecord>, ExportError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    if headers.iter().ne(COLUMNS.iter().copied()) {
        warn!(
            "Unexpected header in {}: {:?}",
            path.display(),
            headers.iter().collect::<Vec<_>>()
        );
    }

    let records = reader
        .deserialize()
        .collect::<Result<Vec<OutputRecord>, csv::Error>>()?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{split_list, MonthYear};
    use tempfile::tempdir;

    fn meta(link: &str, title: &str) -> EpisodeMetadata {
        let mut m = EpisodeMetadata::new(link);
        m.title = Some(title.to_string());
        m.month_year = MonthYear::parse("March 2024");
        m.topics = vec!["Sleep".to_string(), "Light".to_string()];
        m
    }

    fn detail(link: &str, notes: &str) -> EpisodeDetail {
        EpisodeDetail {
            link: link.to_string(),
            show_notes: Some(notes.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_assemble_keys_by_link_not_position() {
        let episodes = vec![meta("/episode/a", "A"), meta("/episode/b", "B")];
        // Inserted in reverse order; only the link decides the pairing.
        let details: HashMap<_, _> = [
            ("/episode/b".to_string(), detail("/episode/b", "notes b")),
            ("/episode/a".to_string(), detail("/episode/a", "notes a")),
        ]
        .into_iter()
        .collect();

        let records = assemble(&episodes, &details);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].video_url, "/episode/a");
        assert_eq!(records[0].show_notes, "notes a");
        assert_eq!(records[1].video_url, "/episode/b");
        assert_eq!(records[1].show_notes, "notes b");
    }

    #[test]
    fn test_assemble_missing_detail_leaves_columns_empty() {
        let episodes = vec![meta("/episode/a", "A"), meta("/episode/b", "B")];
        let details: HashMap<_, _> =
            [("/episode/b".to_string(), detail("/episode/b", "notes b"))]
                .into_iter()
                .collect();

        let (records, warnings) = assemble_with_warnings(&episodes, &details);
        assert_eq!(records[0].show_notes, "");
        assert_eq!(records[0].video_title, "A");
        assert_eq!(records[1].show_notes, "notes b");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].link.as_deref(), Some("/episode/a"));
    }

    #[test]
    fn test_write_then_read_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");

        let mut d = detail("/episode/a", "Hello, \"quoted\" world");
        d.resources = vec!["https://a.test".to_string(), "https://b.test".to_string()];
        let episodes = vec![meta("/episode/a", "A, with comma")];
        let details: HashMap<_, _> = [("/episode/a".to_string(), d)].into_iter().collect();
        let records = assemble(&episodes, &details);

        write_records(&path, &records).unwrap();
        let loaded = read_records(&path).unwrap();
        assert_eq!(loaded, records);
        assert_eq!(split_list(&loaded[0].topics), vec!["Sleep", "Light"]);
        assert_eq!(loaded[0].resource_list().len(), 2);
    }

    #[test]
    fn test_timestamp_lists_stay_parallel_after_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut unlinked = detail("/episode/a", "notes a");
        unlinked.timestamps = vec![String::new()];
        unlinked.timestamp_descriptions = vec!["00:05:00 Sleep".to_string()];

        let mut semicolons = detail("/episode/b", "notes b");
        semicolons.timestamps = vec![
            "https://youtu.be/abc?t=1".to_string(),
            String::new(),
            "https://youtu.be/abc?t=9".to_string(),
        ];
        semicolons.timestamp_descriptions = vec![
            "00:00 Intro; why light matters".to_string(),
            "00:04 Caffeine".to_string(),
            "00:09 Wrap".to_string(),
        ];

        let episodes = vec![meta("/episode/a", "A"), meta("/episode/b", "B")];
        let details: HashMap<_, _> = [
            ("/episode/a".to_string(), unlinked.clone()),
            ("/episode/b".to_string(), semicolons.clone()),
        ]
        .into_iter()
        .collect();
        write_records(&path, &assemble(&episodes, &details)).unwrap();
        let loaded = read_records(&path).unwrap();

        for (row, expected) in loaded.iter().zip([&unlinked, &semicolons]) {
            let timestamps = row.timestamp_list();
            let descriptions = split_list(&row.timestamp_descriptions);
            assert_eq!(timestamps.len(), descriptions.len());
            assert_eq!(timestamps, expected.timestamps);
            assert_eq!(descriptions, expected.timestamp_descriptions);
        }
    }

    #[test]
    fn test_header_matches_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_records(&path, &[]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim_end(), COLUMNS.join(","));
        assert!(read_records(&path).unwrap().is_empty());
    }

    #[test]
    fn test_list_cells_are_unquoted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let records = assemble(&[meta("/episode/a", "A")], &HashMap::new());
        write_records(&path, &records).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains(",Sleep; Light\n"));
        assert!(contents.contains(",March 2024,"));
    }
}
