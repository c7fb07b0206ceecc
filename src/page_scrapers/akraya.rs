use std::time::Duration;

use url::Url;

use crate::stabilizer::Submission;

use super::{PageScraper, SelectorSet, SiteLayout};

/// The Akraya job board.
///
/// Searching by location is done through the `location` URL parameter; the result rows are
/// lazily appended as the page scrolls, and the newest rows tend to render a moment after the
/// list container appears.
#[derive(Default)]
pub(super) struct AkrayaScraper;

impl PageScraper for AkrayaScraper {
    const NAME: &'static str = "akraya";
    const ENTRY_URL: Option<&'static str> =
        Some("https://jobs.akraya.com/index.smpl?arg=jb_search_results&jb_search_submitted=1");

    fn layout(entry_url: Url) -> SiteLayout {
        SiteLayout {
            entry_url,
            selectors: SelectorSet {
                search_field: None,
                results_marker: "#JBSearchList_container".to_string(),
                no_results_marker: None,
                card: ".clearfix.hmg-jb-row".to_string(),
                title: "h3.job-post-title".to_string(),
                location: Some(".job-post-location.POST_LOCATION".to_string()),
                date: Some(".job-post-date .POST_DATE_F".to_string()),
                link: Some("h3.job-post-title a".to_string()),
            },
            submission: Submission::UrlParameter { param: "location".to_string() },
            infinite_scroll: true,
            render_delay: Duration::from_secs(3),
        }
    }
}
