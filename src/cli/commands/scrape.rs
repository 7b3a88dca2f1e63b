//! Full scrape command.

use std::path::PathBuf;

use console::style;

use super::apply_walk_flags;
use crate::cli::icons::{dim_arrow, info, success, warn};
use crate::config::Config;
use crate::services::{run_scrape, ScrapeOptions};

/// Walk the listing, fetch every episode's details, and write the CSV.
pub async fn cmd_scrape(
    mut config: Config,
    output: Option<PathBuf>,
    max_pages: Option<u32>,
    keep_going: bool,
    headed: bool,
) -> anyhow::Result<()> {
    apply_walk_flags(&mut config, max_pages, headed);

    let options = ScrapeOptions {
        output: output.unwrap_or_else(|| config.output_path()),
        keep_going,
        show_progress: true,
    };

    println!("{} Scraping {}", info(), style(config.listing_url()).bold());
    let summary = run_scrape(&config, &options).await?;

    println!(
        "{} Wrote {} episodes to {}",
        success(),
        summary.episodes,
        summary.output.display()
    );
    println!("  {} {} detail pages fetched", dim_arrow(), summary.details);
    if summary.warnings > 0 {
        println!(
            "  {} {} fields could not be extracted (see log)",
            warn(),
            summary.warnings
        );
    }
    if summary.failed > 0 {
        println!(
            "  {} {} detail pages failed and were left empty",
            warn(),
            summary.failed
        );
    }
    Ok(())
}
