//! Listing walker: drives the paginated episode listing.
//!
//! Each page is scrolled until its height stops growing, parsed into a
//! [`ListingBatch`], and then the walker tries to advance. Whether another
//! page exists is an explicit predicate ([`NextPage`]), evaluated after a
//! bounded wait for the "next" control; it is kept separate from the
//! "page not rendered yet" wait on the results container.

use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::browser::PageDriver;
use super::config::{ListingSelectors, WalkerConfig};
use super::{compile_selector, element_text, non_empty, ScrapeError};
use crate::models::{EpisodeMetadata, ExtractionWarning, MonthYear};

/// Episodes parsed from one rendered listing page, in document order.
#[derive(Debug, Clone, Default)]
pub struct ListingBatch {
    pub episodes: Vec<EpisodeMetadata>,
    pub warnings: Vec<ExtractionWarning>,
}

/// Compiled listing selectors.
pub struct ListingParser {
    container: Selector,
    groups: Selector,
    group_header: Selector,
    entry: Selector,
    link: Selector,
    image: Selector,
    description: Selector,
    hit: Selector,
    topics: Selector,
    category_attr: String,
    date_attr: String,
    primary_topic_attr: String,
}

impl ListingParser {
    pub fn new(selectors: &ListingSelectors) -> Result<Self, ScrapeError> {
        Ok(Self {
            container: compile_selector(&selectors.container)?,
            groups: compile_selector(&selectors.groups)?,
            group_header: compile_selector(&selectors.group_header)?,
            entry: compile_selector(&selectors.entry)?,
            link: compile_selector(&selectors.link)?,
            image: compile_selector(&selectors.image)?,
            description: compile_selector(&selectors.description)?,
            hit: compile_selector(&selectors.hit)?,
            topics: compile_selector(&selectors.topics)?,
            category_attr: selectors.category_attr.clone(),
            date_attr: selectors.date_attr.clone(),
            primary_topic_attr: selectors.primary_topic_attr.clone(),
        })
    }

    /// Parse rendered listing markup.
    ///
    /// A missing container or group list yields an empty batch with a warning.
    pub fn parse(&self, html: &str) -> ListingBatch {
        let document = Html::parse_document(html);
        let mut batch = ListingBatch::default();

        let Some(container) = document.select(&self.container).next() else {
            batch.warnings.push(ExtractionWarning::new(
                None,
                "container",
                "results container not found; skipping page",
            ));
            return batch;
        };

        let Some(groups) = container.select(&self.groups).next() else {
            // An empty result set renders the container without a group list.
            debug!("No date groups in results container");
            return batch;
        };

        for group in groups
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "li")
        {
            let header = group.select(&self.group_header).next().map(element_text);
            let month_year = header.as_deref().and_then(MonthYear::parse);
            if month_year.is_none() {
                batch.warnings.push(ExtractionWarning::new(
                    None,
                    "month_year",
                    format!("unparseable group header {:?}", header.unwrap_or_default()),
                ));
            }

            for entry in group.select(&self.entry) {
                if let Some(episode) = self.parse_entry(entry, month_year, &mut batch.warnings) {
                    batch.episodes.push(episode);
                }
            }
        }

        batch
    }

    fn parse_entry(
        &self,
        entry: ElementRef<'_>,
        month_year: Option<MonthYear>,
        warnings: &mut Vec<ExtractionWarning>,
    ) -> Option<EpisodeMetadata> {
        let Some(link) = entry
            .select(&self.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(non_empty)
        else {
            warnings.push(ExtractionWarning::new(
                None,
                "link",
                "episode entry without a link; skipped",
            ));
            return None;
        };

        let mut episode = EpisodeMetadata::new(link);
        episode.month_year = month_year;

        let image = entry.select(&self.image).next();
        episode.thumbnail = image.and_then(|img| img.value().attr("src")).and_then(non_empty);
        episode.title = image.and_then(|img| img.value().attr("alt")).and_then(non_empty);
        episode.description = entry
            .select(&self.description)
            .next()
            .map(element_text)
            .and_then(non_empty);

        let hit = entry.select(&self.hit).next();
        let hit_attr = |name: &str| hit.and_then(|h| h.value().attr(name)).and_then(non_empty);
        episode.category = hit_attr(self.category_attr.as_str());
        episode.publish_date = hit_attr(self.date_attr.as_str());
        episode.primary_topic = hit_attr(self.primary_topic_attr.as_str());

        episode.topics = entry
            .select(&self.topics)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect();

        let expected = [
            ("thumbnail", episode.thumbnail.is_none()),
            ("title", episode.title.is_none()),
            ("description", episode.description.is_none()),
            ("category", episode.category.is_none()),
            ("publish_date", episode.publish_date.is_none()),
            ("primary_topic", episode.primary_topic.is_none()),
        ];
        for (field, missing) in expected {
            if missing {
                warnings.push(ExtractionWarning::new(
                    Some(episode.link.as_str()),
                    field,
                    format!("{} not found", field),
                ));
            }
        }

        Some(episode)
    }
}

/// Parse rendered listing markup with the given selectors.
pub fn parse_listing_page(
    html: &str,
    selectors: &ListingSelectors,
) -> Result<ListingBatch, ScrapeError> {
    Ok(ListingParser::new(selectors)?.parse(html))
}

/// Outcome of trying to advance the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// The "next" control was clicked.
    Advanced,
    /// The "next" control never became clickable: this was the last page.
    Exhausted,
}

#[derive(Debug, Clone, Copy)]
enum Condition {
    Present,
    Clickable,
}

/// Walks every page of the listing through a [`PageDriver`].
///
/// The walker borrows the driver per call, so the caller keeps ownership of
/// the browser session and can close it on every exit path.
pub struct ListingWalker {
    parser: ListingParser,
    ready_selector: String,
    config: WalkerConfig,
}

impl ListingWalker {
    pub fn new(selectors: &ListingSelectors, config: WalkerConfig) -> Result<Self, ScrapeError> {
        // Validate the next selector up front rather than on the last page.
        compile_selector(&config.next_selector)?;

        Ok(Self {
            parser: ListingParser::new(selectors)?,
            ready_selector: selectors.container.clone(),
            config,
        })
    }

    /// Walk every page starting at `listing_url`, returning all episodes in
    /// listing order together with every page's warnings.
    pub async fn collect_all<D: PageDriver>(
        &self,
        driver: &mut D,
        listing_url: &str,
    ) -> Result<ListingBatch, ScrapeError> {
        driver.navigate(listing_url).await?;

        let mut all = ListingBatch::default();
        let mut page: u32 = 1;
        loop {
            info!("Processing page {}", page);
            let batch = self.scrape_current_page(driver).await?;
            info!(
                "Page {}: {} episodes, {} warnings",
                page,
                batch.episodes.len(),
                batch.warnings.len()
            );
            all.episodes.extend(batch.episodes);
            all.warnings.extend(batch.warnings);

            if self.config.max_pages > 0 && page >= self.config.max_pages {
                info!("Reached page limit ({})", self.config.max_pages);
                break;
            }

            match self.next_page(driver).await? {
                NextPage::Advanced => {
                    page += 1;
                    tokio::time::sleep(self.config.page_pause()).await;
                }
                NextPage::Exhausted => break,
            }
        }

        info!(
            "Processed a total of {} pages ({} episodes)",
            page,
            all.episodes.len()
        );
        Ok(all)
    }

    /// Scroll, wait for the results, and parse the current page.
    pub async fn scrape_current_page<D: PageDriver>(
        &self,
        driver: &mut D,
    ) -> Result<ListingBatch, ScrapeError> {
        self.scroll_until_stable(driver).await?;

        let ready = wait_for(
            driver,
            &self.ready_selector,
            Condition::Present,
            self.config.ready_timeout(),
            self.config.poll_interval(),
        )
        .await?;
        if !ready {
            let warning = ExtractionWarning::new(
                None,
                "container",
                "results container did not render in time; skipping page",
            );
            warning.log();
            return Ok(ListingBatch {
                episodes: Vec::new(),
                warnings: vec![warning],
            });
        }

        let html = driver.content().await?;
        let batch = self.parser.parse(&html);
        for warning in &batch.warnings {
            warning.log();
        }
        Ok(batch)
    }

    /// Scroll to the bottom until the page height stops increasing.
    ///
    /// Bounded by `max_scroll_iterations`, so an oscillating or endlessly
    /// growing page still terminates. Returns the number of scroll rounds.
    pub async fn scroll_until_stable<D: PageDriver>(
        &self,
        driver: &mut D,
    ) -> Result<u32, ScrapeError> {
        let max = self.config.max_scroll_iterations.max(1);
        let mut last_height = driver.page_height().await?;

        for round in 1..=max {
            driver.scroll_to_bottom().await?;
            tokio::time::sleep(self.config.scroll_pause()).await;
            let new_height = driver.page_height().await?;
            if new_height <= last_height {
                debug!("Page height settled at {} after {} scrolls", new_height, round);
                return Ok(round);
            }
            last_height = new_height;
        }

        warn!("Page height still changing after {} scrolls", max);
        Ok(max)
    }

    /// Try to advance to the next page.
    pub async fn next_page<D: PageDriver>(&self, driver: &mut D) -> Result<NextPage, ScrapeError> {
        let selector = &self.config.next_selector;
        let clickable = wait_for(
            driver,
            selector,
            Condition::Clickable,
            self.config.next_wait_timeout(),
            self.config.poll_interval(),
        )
        .await?;

        if !clickable {
            debug!("Next control not clickable: last page reached");
            return Ok(NextPage::Exhausted);
        }

        driver.click(selector).await?;
        Ok(NextPage::Advanced)
    }
}

/// Poll until `condition` holds for `selector` or `timeout` elapses.
/// Always checks at least once.
async fn wait_for<D: PageDriver>(
    driver: &mut D,
    selector: &str,
    condition: Condition,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<bool, ScrapeError> {
    let deadline = Instant::now() + timeout;
    loop {
        let holds = match condition {
            Condition::Present => driver.is_present(selector).await?,
            Condition::Clickable => driver.is_clickable(selector).await?,
        };
        if holds {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::browser::BrowserError;
    use async_trait::async_trait;
    use chrono::Month;

    /// One listing entry for fixture pages.
    struct Entry<'a> {
        link: &'a str,
        title: &'a str,
        category: &'a str,
        date: &'a str,
        topics: &'a [&'a str],
    }

    fn entry_html(e: &Entry<'_>) -> String {
        let topics: String = e
            .topics
            .iter()
            .map(|t| format!(r#"<a href="/topics/{t}">{t}</a>"#))
            .collect();
        format!(
            r#"<li class="ais-Hits-item">
                <div class="hit" algolia-category="{category}" algolia-date="{date}" algolia-primarytopic="{primary}">
                  <a href="{link}"><img src="https://cdn.test{link}.jpg" alt="{title}"></a>
                  <div class="description"> About {title} </div>
                  <div class="topics-list">{topics}</div>
                </div>
              </li>"#,
            category = e.category,
            date = e.date,
            primary = e.topics.first().copied().unwrap_or(""),
            link = e.link,
            title = e.title,
            topics = topics,
        )
    }

    /// Render a listing page from `(header, entries)` groups.
    fn listing_html(groups: &[(&str, Vec<Entry<'_>>)]) -> String {
        let groups: String = groups
            .iter()
            .map(|(header, entries)| {
                let items: String = entries.iter().map(entry_html).collect();
                format!(r#"<li><h2>{header}</h2><ol class="ais-Hits-list">{items}</ol></li>"#)
            })
            .collect();
        format!(
            r#"<html><body><main><div id="hits"><ol class="topics-section">{groups}</ol></div></main></body></html>"#
        )
    }

    fn entry<'a>(link: &'a str, title: &'a str) -> Entry<'a> {
        Entry {
            link,
            title,
            category: "Science",
            date: "2024-03-01",
            topics: &["Sleep", "Light"],
        }
    }

    /// Scripted page driver: `pages[i]` is the markup of page i; the next
    /// control is clickable on every page except the last.
    struct FakeDriver {
        pages: Vec<String>,
        current: usize,
        heights: Vec<i64>,
        height_reads: usize,
        scrolls: usize,
        clicks: usize,
        navigated: Vec<String>,
        container_present: bool,
    }

    impl FakeDriver {
        fn new(pages: Vec<String>) -> Self {
            Self {
                pages,
                current: 0,
                heights: vec![1000],
                height_reads: 0,
                scrolls: 0,
                clicks: 0,
                navigated: Vec::new(),
                container_present: true,
            }
        }
    }

    #[async_trait]
    impl PageDriver for FakeDriver {
        async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
            self.navigated.push(url.to_string());
            self.current = 0;
            Ok(())
        }

        async fn page_height(&mut self) -> Result<i64, BrowserError> {
            let idx = self.height_reads.min(self.heights.len() - 1);
            self.height_reads += 1;
            Ok(self.heights[idx])
        }

        async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
            self.scrolls += 1;
            Ok(())
        }

        async fn is_present(&mut self, _selector: &str) -> Result<bool, BrowserError> {
            Ok(self.container_present)
        }

        async fn is_clickable(&mut self, _selector: &str) -> Result<bool, BrowserError> {
            Ok(self.current + 1 < self.pages.len())
        }

        async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
            if self.current + 1 >= self.pages.len() {
                return Err(BrowserError::ElementNotFound(selector.to_string()));
            }
            self.clicks += 1;
            self.current += 1;
            Ok(())
        }

        async fn content(&mut self) -> Result<String, BrowserError> {
            Ok(self.pages[self.current].clone())
        }
    }

    fn fast_config() -> WalkerConfig {
        WalkerConfig {
            scroll_pause_ms: 0,
            max_scroll_iterations: 5,
            ready_timeout_ms: 0,
            next_wait_timeout_ms: 0,
            poll_interval_ms: 1,
            page_pause_ms: 0,
            ..WalkerConfig::default()
        }
    }

    #[test]
    fn test_parse_groups_and_entries() {
        let html = listing_html(&[
            (
                "March 2024",
                vec![entry("/episode/a", "A"), entry("/episode/b", "B")],
            ),
            ("February 2024", vec![entry("/episode/c", "C")]),
        ]);

        let batch = parse_listing_page(&html, &ListingSelectors::default()).unwrap();
        assert_eq!(batch.episodes.len(), 3);
        assert!(batch.warnings.is_empty(), "{:?}", batch.warnings);

        let links: Vec<_> = batch.episodes.iter().map(|e| e.link.as_str()).collect();
        assert_eq!(links, vec!["/episode/a", "/episode/b", "/episode/c"]);

        let march = batch.episodes[0].month_year.unwrap();
        assert_eq!((march.month, march.year), (Month::March, 2024));
        assert_eq!(batch.episodes[1].month_year, batch.episodes[0].month_year);
        assert_eq!(batch.episodes[2].month_year.unwrap().month, Month::February);
    }

    #[test]
    fn test_parse_entry_fields() {
        let html = listing_html(&[(
            "March 2024",
            vec![Entry {
                link: "/episode/x",
                title: "Topic A",
                category: "Science",
                date: "2024-03-01",
                topics: &["A", "B"],
            }],
        )]);

        let batch = parse_listing_page(&html, &ListingSelectors::default()).unwrap();
        let ep = &batch.episodes[0];
        assert_eq!(ep.link, "/episode/x");
        assert_eq!(ep.title.as_deref(), Some("Topic A"));
        assert_eq!(ep.thumbnail.as_deref(), Some("https://cdn.test/episode/x.jpg"));
        assert_eq!(ep.description.as_deref(), Some("About Topic A"));
        assert_eq!(ep.category.as_deref(), Some("Science"));
        assert_eq!(ep.publish_date.as_deref(), Some("2024-03-01"));
        assert_eq!(ep.primary_topic.as_deref(), Some("A"));
        assert_eq!(ep.topics, vec!["A", "B"]);
    }

    #[test]
    fn test_missing_fields_become_warnings() {
        let html = r#"<div id="hits"><ol class="topics-section">
            <li><h2>Someday</h2><ol>
              <li class="ais-Hits-item"><a href="/episode/bare">x</a></li>
              <li class="ais-Hits-item"><span>no link</span></li>
            </ol></li></ol></div>"#;

        let batch = parse_listing_page(html, &ListingSelectors::default()).unwrap();
        assert_eq!(batch.episodes.len(), 1);

        let ep = &batch.episodes[0];
        assert_eq!(ep.link, "/episode/bare");
        assert!(ep.month_year.is_none());
        assert!(ep.title.is_none());
        assert!(ep.topics.is_empty());

        let fields: Vec<_> = batch.warnings.iter().map(|w| w.field).collect();
        assert!(fields.contains(&"month_year"));
        assert!(fields.contains(&"link"));
        assert!(fields.contains(&"title"));
        assert!(fields.contains(&"category"));
        assert!(!fields.contains(&"topics"));
    }

    #[test]
    fn test_missing_container_warns_and_returns_empty() {
        let batch =
            parse_listing_page("<html><body></body></html>", &ListingSelectors::default())
                .unwrap();
        assert!(batch.episodes.is_empty());
        assert_eq!(batch.warnings.len(), 1);
        assert_eq!(batch.warnings[0].field, "container");
    }

    #[test]
    fn test_empty_listing_yields_nothing() {
        let html = listing_html(&[]);
        let batch = parse_listing_page(&html, &ListingSelectors::default()).unwrap();
        assert!(batch.episodes.is_empty());
        assert!(batch.warnings.is_empty());
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let selectors = ListingSelectors {
            entry: "li[".to_string(),
            ..ListingSelectors::default()
        };
        assert!(matches!(
            parse_listing_page("", &selectors),
            Err(ScrapeError::Selector { .. })
        ));
    }

    fn walker(config: WalkerConfig) -> ListingWalker {
        ListingWalker::new(&ListingSelectors::default(), config).unwrap()
    }

    #[tokio::test]
    async fn test_walker_visits_every_clickable_page() {
        let pages = vec![
            listing_html(&[("March 2024", vec![entry("/episode/1", "1")])]),
            listing_html(&[(
                "February 2024",
                vec![entry("/episode/2", "2"), entry("/episode/3", "3")],
            )]),
            listing_html(&[("January 2024", vec![entry("/episode/4", "4")])]),
        ];
        let mut driver = FakeDriver::new(pages);

        let batch = walker(fast_config())
            .collect_all(&mut driver, "https://site.test/all-episodes")
            .await
            .unwrap();
        let links: Vec<_> = batch.episodes.iter().map(|e| e.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["/episode/1", "/episode/2", "/episode/3", "/episode/4"]
        );
        assert_eq!(driver.clicks, 2);
        assert_eq!(driver.navigated, vec!["https://site.test/all-episodes"]);
    }

    #[tokio::test]
    async fn test_walker_respects_max_pages() {
        let pages = vec![
            listing_html(&[("March 2024", vec![entry("/episode/1", "1")])]),
            listing_html(&[("February 2024", vec![entry("/episode/2", "2")])]),
            listing_html(&[("January 2024", vec![entry("/episode/3", "3")])]),
        ];
        let config = WalkerConfig {
            max_pages: 2,
            ..fast_config()
        };
        let mut driver = FakeDriver::new(pages);

        let batch = walker(config)
            .collect_all(&mut driver, "https://site.test/")
            .await
            .unwrap();
        assert_eq!(batch.episodes.len(), 2);
        assert_eq!(driver.clicks, 1);
    }

    #[tokio::test]
    async fn test_walker_empty_listing() {
        let mut driver = FakeDriver::new(vec![listing_html(&[])]);
        let batch = walker(fast_config())
            .collect_all(&mut driver, "https://site.test/")
            .await
            .unwrap();
        assert!(batch.episodes.is_empty());
        assert!(batch.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_walker_keeps_warnings_from_every_page() {
        let bare = r#"<div id="hits"><ol class="topics-section">
            <li><h2>Someday</h2><ol>
              <li class="ais-Hits-item"><a href="/episode/bare">x</a></li>
            </ol></li></ol></div>"#;
        let pages = vec![
            listing_html(&[("March 2024", vec![entry("/episode/1", "1")])]),
            bare.to_string(),
        ];
        let mut driver = FakeDriver::new(pages);

        let batch = walker(fast_config())
            .collect_all(&mut driver, "https://site.test/")
            .await
            .unwrap();
        assert_eq!(batch.episodes.len(), 2);
        assert!(batch.warnings.iter().any(|w| w.field == "month_year"));
        assert!(batch.warnings.iter().any(|w| w.field == "title"));
    }

    #[tokio::test]
    async fn test_walker_skips_page_that_never_renders() {
        let mut driver = FakeDriver::new(vec![listing_html(&[(
            "March 2024",
            vec![entry("/episode/1", "1")],
        )])]);
        driver.container_present = false;

        let batch = walker(fast_config())
            .scrape_current_page(&mut driver)
            .await
            .unwrap();
        assert!(batch.episodes.is_empty());
        assert_eq!(batch.warnings[0].field, "container");
    }

    #[test]
    fn test_walker_rejects_bad_next_selector() {
        let config = WalkerConfig {
            next_selector: "a[".to_string(),
            ..fast_config()
        };
        assert!(ListingWalker::new(&ListingSelectors::default(), config).is_err());
    }

    #[tokio::test]
    async fn test_scroll_stops_when_height_settles() {
        let mut driver = FakeDriver::new(vec![String::new()]);
        driver.heights = vec![100, 200, 300, 300];

        let rounds = walker(fast_config())
            .scroll_until_stable(&mut driver)
            .await
            .unwrap();
        assert_eq!(rounds, 3);
        assert_eq!(driver.scrolls, 3);
    }

    #[tokio::test]
    async fn test_scroll_bounded_when_height_oscillates() {
        let mut driver = FakeDriver::new(vec![String::new()]);
        driver.heights = (0..100).map(|i| if i % 2 == 0 { 100 } else { 200 }).collect();

        let rounds = walker(fast_config())
            .scroll_until_stable(&mut driver)
            .await
            .unwrap();
        assert!(rounds <= 5);
    }

    #[tokio::test]
    async fn test_scroll_bounded_when_height_grows_forever() {
        let mut driver = FakeDriver::new(vec![String::new()]);
        driver.heights = (1..=1000).map(|i| i * 100).collect();

        let rounds = walker(fast_config())
            .scroll_until_stable(&mut driver)
            .await
            .unwrap();
        assert_eq!(rounds, 5);
        assert_eq!(driver.scrolls, 5);
    }

    #[tokio::test]
    async fn test_next_page_exhausted_on_single_page() {
        let mut driver = FakeDriver::new(vec![listing_html(&[])]);
        let next = walker(fast_config()).next_page(&mut driver).await.unwrap();
        assert_eq!(next, NextPage::Exhausted);
        assert_eq!(driver.clicks, 0);
    }
}
