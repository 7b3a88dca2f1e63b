//! Service layer for podnotes.
//!
//! Orchestration lives here, separated from the CLI so the pipeline can be
//! driven by tests with fake page drivers and fetchers.

pub mod pipeline;
pub mod youtube;

pub use pipeline::{
    collect_details, run_listing, run_scrape, run_walk, scrape_with, DetailCollection,
    ScrapeOptions, ScrapeSummary,
};
pub use youtube::{extract_video_id, video_ids_from_records, YoutubeClient, YoutubeError};
