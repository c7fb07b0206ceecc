use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::stabilizer::Submission;

use self::{akraya::AkrayaScraper, workday::WorkdayScraper};

mod akraya;
mod workday;


pub(crate) const PRESETS: [&str; 2] = [AkrayaScraper::NAME, WorkdayScraper::NAME];


/// CSS selectors for every part of a search results page the scraper touches.
///
/// `title`, `location`, `date` and `link` are looked up inside each `card`, never on the
/// whole page. A card whose `title` selector finds nothing is not treated as a listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SelectorSet {
    /// The input that queries are typed into. Layouts that put the query in the URL do
    /// not need one.
    #[serde(default)]
    pub(crate) search_field: Option<String>,
    /// Appears once results have rendered
    pub(crate) results_marker: String,
    /// Appears instead of `results_marker` when the search matched nothing
    #[serde(default)]
    pub(crate) no_results_marker: Option<String>,
    pub(crate) card: String,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) location: Option<String>,
    #[serde(default)]
    pub(crate) date: Option<String>,
    /// An element whose `href` points at the listing
    #[serde(default)]
    pub(crate) link: Option<String>,
}


/// Everything needed to drive one job board's search page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SiteLayout {
    /// Where every query starts from. Relative listing links are resolved against it.
    pub(crate) entry_url: Url,
    pub(crate) selectors: SelectorSet,
    pub(crate) submission: Submission,
    /// Whether more cards are appended as the page is scrolled
    pub(crate) infinite_scroll: bool,
    /// Paused once after the results marker shows up, for boards that keep rendering
    /// cards after the container appears
    pub(crate) render_delay: Duration,
}


pub(crate) trait PageScraper {
    const NAME: &'static str;

    /// The default entry URL, if the board has a single public one.
    ///
    /// Boards hosted per employer (each company gets its own subdomain) have no sensible
    /// default, and the entry URL must come from the configuration.
    const ENTRY_URL: Option<&'static str>;

    fn layout(entry_url: Url) -> SiteLayout;
}


/// Builds the layout of a bundled board by name.
///
/// Returns None if no preset has that name. `entry_url` replaces the preset's own entry URL;
/// presets without one return `Some(Err(_))` when none is given.
pub(crate) fn preset(name: &str, entry_url: Option<Url>) -> Option<Result<SiteLayout, &'static str>> {
    fn build<P: PageScraper>(entry_url: Option<Url>) -> Result<SiteLayout, &'static str> {
        let entry_url = match entry_url {
            Some(url) => url,
            None => P::ENTRY_URL
                .and_then(|url| Url::parse(url).ok())
                .ok_or(P::NAME)?,
        };
        Ok(P::layout(entry_url))
    }

    match name {
        AkrayaScraper::NAME => Some(build::<AkrayaScraper>(entry_url)),
        WorkdayScraper::NAME => Some(build::<WorkdayScraper>(entry_url)),
        _ => None,
    }
}
