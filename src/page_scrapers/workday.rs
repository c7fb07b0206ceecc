use std::time::Duration;

use url::Url;

use crate::stabilizer::Submission;

use super::{PageScraper, SelectorSet, SiteLayout};

/// Career sites hosted on Workday (`*.myworkdayjobs.com`, `*.myworkdaysite.com`)
///
/// Every employer has its own site, so there is no default entry URL. Queries go in the `q`
/// parameter rather than the search box, since the landing page already lists jobs before any
/// search. Workday prints posting dates as "Posted 3 Days Ago", which is not a calendar date,
/// so these listings only survive the pipeline with the recency filter turned off.
#[derive(Default)]
pub(super) struct WorkdayScraper;

impl PageScraper for WorkdayScraper {
    const NAME: &'static str = "workday";
    const ENTRY_URL: Option<&'static str> = None;

    fn layout(entry_url: Url) -> SiteLayout {
        SiteLayout {
            entry_url,
            selectors: SelectorSet {
                search_field: None,
                results_marker: "section[data-automation-id=\"jobResults\"] li".to_string(),
                no_results_marker: Some("[data-automation-id=\"noJobsFound\"]".to_string()),
                card: "section[data-automation-id=\"jobResults\"] li".to_string(),
                title: "a[data-automation-id=\"jobTitle\"]".to_string(),
                location: Some("[data-automation-id=\"locations\"] dd".to_string()),
                date: Some("[data-automation-id=\"postedOn\"] dd".to_string()),
                link: Some("a[data-automation-id=\"jobTitle\"]".to_string()),
            },
            submission: Submission::UrlParameter { param: "q".to_string() },
            infinite_scroll: false,
            render_delay: Duration::from_secs(1),
        }
    }
}
