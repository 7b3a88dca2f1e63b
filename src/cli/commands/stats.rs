//! YouTube statistics command.

use std::path::PathBuf;

use anyhow::Context;

use crate::cli::icons::{info, warn};
use crate::config::Config;
use crate::export::read_records;
use crate::services::{video_ids_from_records, YoutubeClient};

/// Print video or channel statistics as JSON.
///
/// With `--channel` (or a configured `channel_username` and nothing else to
/// look up) the channel is queried. Otherwise ids come from `--video-id` and
/// the CSV written by `scrape`.
pub async fn cmd_stats(
    config: &Config,
    input: Option<PathBuf>,
    video_ids: Vec<String>,
    channel: Option<String>,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let client = YoutubeClient::new(&config.youtube, api_key, config.request_timeout())?;

    let channel = channel.or_else(|| {
        if video_ids.is_empty() && input.is_none() {
            config.youtube.channel_username.clone()
        } else {
            None
        }
    });
    if let Some(username) = channel {
        let stats = client
            .fetch_channel_stats(&username)
            .await
            .with_context(|| format!("Failed to fetch channel {}", username))?;
        match stats {
            Some(stats) => println!("{}", serde_json::to_string_pretty(&stats)?),
            None => anyhow::bail!("No channel found for username {}", username),
        }
        return Ok(());
    }

    let ids = collect_ids(config, input, video_ids)?;
    if ids.is_empty() {
        anyhow::bail!("No YouTube video ids found. Pass --video-id or scrape first.");
    }
    eprintln!("{} Looking up {} videos", info(), ids.len());

    let mut found = Vec::with_capacity(ids.len());
    for id in &ids {
        match client
            .fetch_video_stats(id)
            .await
            .with_context(|| format!("Failed to fetch video {}", id))?
        {
            Some(stats) => found.push(stats),
            None => eprintln!("{} No video found for id {}", warn(), id),
        }
    }

    println!("{}", serde_json::to_string_pretty(&found)?);
    Ok(())
}

/// Explicit ids first, then ids referenced by the scraped CSV, without repeats.
fn collect_ids(
    config: &Config,
    input: Option<PathBuf>,
    mut ids: Vec<String>,
) -> anyhow::Result<Vec<String>> {
    if input.is_some() || ids.is_empty() {
        let path = input.unwrap_or_else(|| config.output_path());
        let records = read_records(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        ids.extend(video_ids_from_records(&records));
    }

    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::write_records;
    use crate::models::OutputRecord;

    #[test]
    fn test_collect_ids_merges_explicit_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let record = OutputRecord {
            video_resources: "https://youtu.be/BBB; https://www.youtube.com/watch?v=AAA"
                .to_string(),
            ..Default::default()
        };
        write_records(&path, &[record]).unwrap();

        let ids = collect_ids(
            &Config::default(),
            Some(path),
            vec!["AAA".to_string(), "AAA".to_string()],
        )
        .unwrap();
        assert_eq!(ids, vec!["AAA", "BBB"]);
    }

    #[test]
    fn test_collect_ids_explicit_only() {
        let ids = collect_ids(&Config::default(), None, vec!["X".to_string()]).unwrap();
        assert_eq!(ids, vec!["X"]);
    }
}
