//! Episode detail fetcher: one GET per episode page.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::config::DetailSelectors;
use super::http_client::FetchText;
use super::{compile_selector, element_text, resolve_url, ScrapeError};
use crate::models::{EpisodeDetail, ExtractionWarning};

/// Parsed detail page plus anything that could not be extracted.
#[derive(Debug, Clone, Default)]
pub struct DetailPage {
    pub detail: EpisodeDetail,
    pub warnings: Vec<ExtractionWarning>,
}

/// Compiled detail-page selectors.
pub struct DetailParser {
    notes_container: Selector,
    notes_items: Selector,
    resources_heading: Selector,
    timestamps_heading: Selector,
    anchor: Selector,
    item: Selector,
}

impl DetailParser {
    pub fn new(selectors: &DetailSelectors) -> Result<Self, ScrapeError> {
        Ok(Self {
            notes_container: compile_selector(&selectors.notes_container)?,
            notes_items: compile_selector(&selectors.notes_items)?,
            resources_heading: compile_selector(&selectors.resources_heading)?,
            timestamps_heading: compile_selector(&selectors.timestamps_heading)?,
            anchor: compile_selector("a[href]")?,
            item: compile_selector("li")?,
        })
    }

    /// Parse one episode page.
    pub fn parse(&self, html: &str, link: &str) -> DetailPage {
        let document = Html::parse_document(html);
        let mut page = DetailPage {
            detail: EpisodeDetail::empty(link),
            warnings: Vec::new(),
        };

        match document.select(&self.notes_container).next() {
            Some(container) => {
                let notes: Vec<String> = container
                    .select(&self.notes_items)
                    .map(element_text)
                    .filter(|t| !t.is_empty())
                    .collect();
                page.detail.show_notes = Some(notes.join(" "));
            }
            None => page.warnings.push(ExtractionWarning::new(
                Some(link),
                "show_notes",
                "show notes container not found",
            )),
        }

        match self.list_after(&document, &self.resources_heading) {
            Some(list) => {
                page.detail.resources = list
                    .select(&self.anchor)
                    .filter_map(|a| a.value().attr("href"))
                    .map(str::to_string)
                    .collect();
            }
            None => debug!(link, "No resources list"),
        }

        match self.list_after(&document, &self.timestamps_heading) {
            Some(list) => {
                for item in list.select(&self.item) {
                    // Items without a link keep an empty slot so both lists stay aligned.
                    let href = item
                        .select(&self.anchor)
                        .next()
                        .and_then(|a| a.value().attr("href"))
                        .unwrap_or_default();
                    page.detail.timestamps.push(href.to_string());
                    page.detail.timestamp_descriptions.push(element_text(item));
                }
            }
            None => debug!(link, "No timestamps list"),
        }

        page
    }

    /// First `ul` following the heading matched by `heading`, among its siblings.
    fn list_after<'a>(&self, document: &'a Html, heading: &Selector) -> Option<ElementRef<'a>> {
        document
            .select(heading)
            .next()?
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "ul")
    }
}

/// Parse one episode page with the given selectors.
pub fn parse_episode_detail(
    html: &str,
    link: &str,
    selectors: &DetailSelectors,
) -> Result<DetailPage, ScrapeError> {
    Ok(DetailParser::new(selectors)?.parse(html, link))
}

/// Fetches and parses episode detail pages.
pub struct DetailFetcher<F: FetchText> {
    fetcher: F,
    base_url: String,
    parser: DetailParser,
}

impl<F: FetchText> DetailFetcher<F> {
    pub fn new(
        fetcher: F,
        base_url: impl Into<String>,
        selectors: &DetailSelectors,
    ) -> Result<Self, ScrapeError> {
        Ok(Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            parser: DetailParser::new(selectors)?,
        })
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// GET `base_url + link` and parse it, returning the warnings alongside.
    pub async fn fetch_detail(&self, link: &str) -> Result<DetailPage, ScrapeError> {
        let url = resolve_url(&self.base_url, link);
        let html = self.fetcher.fetch_text(&url).await?;
        Ok(self.parser.parse(&html, link))
    }

    /// GET `base_url + link` and parse it, logging any extraction warnings.
    pub async fn fetch_show_notes(&self, link: &str) -> Result<EpisodeDetail, ScrapeError> {
        let page = self.fetch_detail(link).await?;
        for warning in &page.warnings {
            warning.log();
        }
        Ok(page.detail)
    }
}
