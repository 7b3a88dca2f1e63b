//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod config_cmd;
mod listing;
mod notes;
mod scrape;
mod stats;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "podnotes")]
#[command(about = "Podcast episode metadata and show-notes scraper")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the listing, fetch every episode's show notes, and write the CSV
    Scrape {
        /// Output file (defaults to output_dir/output_file from config)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Stop after this many listing pages (0 = unlimited)
        #[arg(long)]
        max_pages: Option<u32>,
        /// Log failed detail fetches and keep going instead of aborting
        #[arg(short, long)]
        keep_going: bool,
        /// Show the browser window
        #[arg(long)]
        headed: bool,
    },

    /// Walk the listing only and write metadata rows without show notes
    Listing {
        /// Output file (defaults to output_dir/output_file from config)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Stop after this many listing pages (0 = unlimited)
        #[arg(long)]
        max_pages: Option<u32>,
        /// Show the browser window
        #[arg(long)]
        headed: bool,
    },

    /// Fetch and print one episode's show notes
    Notes {
        /// Episode link, relative to the site root (e.g. /episode/slug)
        link: String,
    },

    /// Look up YouTube statistics for episode videos or a channel
    Stats {
        /// CSV written by `scrape` to collect video ids from
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Video id to look up (repeatable)
        #[arg(long = "video-id")]
        video_ids: Vec<String>,
        /// Channel username to look up instead of videos
        #[arg(long)]
        channel: Option<String>,
        /// YouTube Data API key
        #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Load the config from `--config` or by discovery.
async fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Config::load_from_path(&path).await?.with_env_overrides()
        }
        None => Config::load().await,
    };
    Ok(config)
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config).await?;

    match cli.command {
        Commands::Scrape {
            output,
            max_pages,
            keep_going,
            headed,
        } => scrape::cmd_scrape(config, output, max_pages, keep_going, headed).await,
        Commands::Listing {
            output,
            max_pages,
            headed,
        } => listing::cmd_listing(config, output, max_pages, headed).await,
        Commands::Notes { link } => notes::cmd_notes(&config, &link).await,
        Commands::Stats {
            input,
            video_ids,
            channel,
            api_key,
        } => stats::cmd_stats(&config, input, video_ids, channel, api_key).await,
        Commands::Config => config_cmd::cmd_config(&config),
    }
}

/// Apply the browser/walker flags shared by `scrape` and `listing`.
fn apply_walk_flags(config: &mut Config, max_pages: Option<u32>, headed: bool) {
    if let Some(max_pages) = max_pages {
        config.walker.max_pages = max_pages;
    }
    if headed {
        config.browser.headless = false;
    }
}
