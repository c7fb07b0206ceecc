use chrono::NaiveDate;
use serde::Serialize;
use url::Url;


/// One job listing scraped from a search results page.
///
/// Only ever built by the extractor when the card had a non-empty title. Every other
/// field is optional because result cards routinely omit sub-elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct JobRecord {
    pub(crate) title: String,
    pub(crate) location_text: Option<String>,
    pub(crate) link: Option<Url>,
    /// The date exactly as the site printed it
    pub(crate) posted_raw: Option<String>,
    /// Filled in by the pipeline from `posted_raw`. Stays `None` when the text does not
    /// follow the `month/day/yy` format.
    pub(crate) posted_date: Option<NaiveDate>,
    /// The search query whose results contained this listing
    pub(crate) source_query: String,
}


/// Identity of a listing across queries.
pub(crate) type DedupKey = (String, Option<String>, Option<Url>);


impl JobRecord {
    #[cfg(test)]
    pub(crate) fn new(title: impl Into<String>, source_query: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            location_text: None,
            link: None,
            posted_raw: None,
            posted_date: None,
            source_query: source_query.into(),
        }
    }

    /// Two records with the same key are the same listing, regardless of which query found them
    pub(crate) fn dedup_key(&self) -> DedupKey {
        (self.title.clone(), self.location_text.clone(), self.link.clone())
    }

    #[cfg(test)]
    pub(crate) fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location_text = Some(location.into());
        self
    }

    #[cfg(test)]
    pub(crate) fn with_posted(mut self, posted: impl Into<String>) -> Self {
        self.posted_raw = Some(posted.into());
        self
    }

    #[cfg(test)]
    pub(crate) fn with_link(mut self, link: &str) -> Self {
        self.link = Url::parse(link).ok();
        self
    }
}
