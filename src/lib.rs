//! podnotes - podcast episode metadata and show-notes scraper.
//!
//! Walks a JavaScript-rendered, paginated episode listing with a headless
//! browser, fetches each episode's detail page over plain HTTP, and writes
//! one flat CSV row per episode. A side command looks up YouTube statistics
//! for the videos the episodes link to.

pub mod cli;
pub mod config;
pub mod export;
pub mod models;
pub mod scrapers;
pub mod services;
