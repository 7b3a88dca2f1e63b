//! End-to-end scrape: walk the listing, fetch details, write the CSV.
//!
//! Stages run one after another. The browser session is owned here and is
//! closed whether the walk succeeds or fails.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::Config;
use crate::export::{assemble, write_records};
use crate::models::{EpisodeDetail, EpisodeMetadata, ExtractionWarning, OutputRecord};
use crate::scrapers::{
    BrowserSession, DetailFetcher, FetchText, HttpClient, ListingBatch, ListingWalker, PageDriver,
    ScrapeError,
};

/// Options for a full scrape run.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Output file.
    pub output: PathBuf,
    /// Log failed detail fetches and continue instead of aborting.
    pub keep_going: bool,
    /// Show a progress bar while fetching details.
    pub show_progress: bool,
}

/// What a scrape run produced.
#[derive(Debug, Clone)]
pub struct ScrapeSummary {
    pub episodes: usize,
    pub details: usize,
    pub failed: usize,
    /// Listing and detail fields that could not be extracted.
    pub warnings: usize,
    pub output: PathBuf,
}

/// Details fetched for a set of episodes, keyed by link.
#[derive(Debug, Default)]
pub struct DetailCollection {
    pub details: HashMap<String, EpisodeDetail>,
    pub warnings: Vec<ExtractionWarning>,
    /// Links whose fetch failed (only populated with `keep_going`).
    pub failures: Vec<(String, String)>,
}

/// Progress bar for detail fetching; hidden unless `visible`.
pub fn detail_progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
    {
        bar.set_style(style.progress_chars("█▓░"));
    }
    bar.set_message("Fetching show notes");
    bar
}

/// Launch the browser, walk the whole listing, and close the browser.
pub async fn run_walk(config: &Config) -> Result<ListingBatch, ScrapeError> {
    let walker = ListingWalker::new(&config.listing, config.walker.clone())?;

    let mut session = BrowserSession::launch(&config.browser).await?;
    let result = walker.collect_all(&mut session, &config.listing_url()).await;
    session.close().await;

    result
}

/// Fetch the detail page of every distinct link in `episodes`.
///
/// Without `keep_going` the first failure aborts. With it, the failure is
/// logged and that link simply has no detail.
pub async fn collect_details<F: FetchText>(
    fetcher: &DetailFetcher<F>,
    episodes: &[EpisodeMetadata],
    keep_going: bool,
    progress: &ProgressBar,
) -> Result<DetailCollection, ScrapeError> {
    let mut collection = DetailCollection::default();

    for episode in episodes {
        let link = episode.link.as_str();
        if collection.details.contains_key(link)
            || collection.failures.iter().any(|(l, _)| l == link)
        {
            progress.inc(1);
            continue;
        }

        progress.set_message(link.to_string());
        match fetcher.fetch_detail(link).await {
            Ok(page) => {
                for warning in &page.warnings {
                    warning.log();
                }
                collection.warnings.extend(page.warnings);
                collection.details.insert(link.to_string(), page.detail);
            }
            Err(e) if keep_going => {
                warn!("Failed to fetch {}: {}", link, e);
                collection.failures.push((link.to_string(), e.to_string()));
            }
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(collection)
}

/// Walk with `driver`, fetch details with `fetcher`, and write the CSV.
pub async fn scrape_with<D: PageDriver, F: FetchText>(
    driver: &mut D,
    fetcher: &DetailFetcher<F>,
    config: &Config,
    options: &ScrapeOptions,
) -> anyhow::Result<ScrapeSummary> {
    let walker = ListingWalker::new(&config.listing, config.walker.clone())?;
    let listing = walker
        .collect_all(driver, &config.listing_url())
        .await
        .context("Failed to walk the episode listing")?;

    finish_scrape(listing, fetcher, options).await
}

async fn finish_scrape<F: FetchText>(
    listing: ListingBatch,
    fetcher: &DetailFetcher<F>,
    options: &ScrapeOptions,
) -> anyhow::Result<ScrapeSummary> {
    let episodes = listing.episodes;
    info!("Fetching details for {} episodes", episodes.len());
    let progress = detail_progress_bar(episodes.len() as u64, options.show_progress);
    let collection = collect_details(fetcher, &episodes, options.keep_going, &progress)
        .await
        .context("Failed to fetch episode details")?;

    let records = assemble(&episodes, &collection.details);
    write_records(&options.output, &records)
        .with_context(|| format!("Failed to write {}", options.output.display()))?;

    Ok(ScrapeSummary {
        episodes: episodes.len(),
        details: collection.details.len(),
        failed: collection.failures.len(),
        warnings: listing.warnings.len() + collection.warnings.len(),
        output: options.output.clone(),
    })
}

/// Full pipeline against the live site.
pub async fn run_scrape(config: &Config, options: &ScrapeOptions) -> anyhow::Result<ScrapeSummary> {
    let client = HttpClient::new(
        config.request_timeout(),
        config.request_delay(),
        config.user_agent.as_deref(),
    )?;
    let fetcher = DetailFetcher::new(client, config.site_root(), &config.detail)?;

    let listing = run_walk(config)
        .await
        .context("Failed to walk the episode listing")?;

    finish_scrape(listing, &fetcher, options).await
}

/// Walk the listing only and write metadata rows with empty detail columns.
pub async fn run_listing(config: &Config, output: &Path) -> anyhow::Result<usize> {
    let listing = run_walk(config)
        .await
        .context("Failed to walk the episode listing")?;

    let records: Vec<OutputRecord> = listing
        .episodes
        .iter()
        .map(|episode| OutputRecord::from_parts(episode, None))
        .collect();
    write_records(output, &records)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(records.len())
}
