//! Single-episode show notes command.

use anyhow::Context;
use console::style;

use crate::cli::icons::{dim_arrow, warn};
use crate::config::Config;
use crate::scrapers::{DetailFetcher, HttpClient};

/// Fetch one episode page and print its show notes.
pub async fn cmd_notes(config: &Config, link: &str) -> anyhow::Result<()> {
    let client = HttpClient::new(
        config.request_timeout(),
        config.request_delay(),
        config.user_agent.as_deref(),
    )?;
    let fetcher = DetailFetcher::new(client, config.site_root(), &config.detail)?;

    let detail = fetcher
        .fetch_show_notes(link)
        .await
        .with_context(|| format!("Failed to fetch {}", link))?;

    match detail.show_notes {
        Some(notes) => println!("{}", notes),
        None => eprintln!("{} No show notes found for {}", warn(), link),
    }

    if !detail.resources.is_empty() {
        println!("\n{}", style("Resources").bold());
        for resource in &detail.resources {
            println!("  {} {}", dim_arrow(), resource);
        }
    }
    if !detail.timestamps.is_empty() {
        println!("\n{}", style("Timestamps").bold());
        for (href, text) in detail
            .timestamps
            .iter()
            .zip(&detail.timestamp_descriptions)
        {
            println!("  {} {} {}", dim_arrow(), text, style(href).dim());
        }
    }
    Ok(())
}
