//! Listing-only command.

use std::path::PathBuf;

use super::apply_walk_flags;
use crate::cli::icons::{info, success};
use crate::config::Config;
use crate::services::run_listing;

/// Walk the listing and write metadata rows with empty detail columns.
pub async fn cmd_listing(
    mut config: Config,
    output: Option<PathBuf>,
    max_pages: Option<u32>,
    headed: bool,
) -> anyhow::Result<()> {
    apply_walk_flags(&mut config, max_pages, headed);
    let output = output.unwrap_or_else(|| config.output_path());

    println!("{} Walking {}", info(), config.listing_url());
    let count = run_listing(&config, &output).await?;
    println!("{} Wrote {} episodes to {}", success(), count, output.display());
    Ok(())
}
