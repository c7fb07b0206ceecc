use url::Url;

use crate::{models::JobRecord, page_scrapers::SelectorSet, session::PageSession};


/// Reads job cards into [`JobRecord`]s.
///
/// Every field is looked up independently, so a card missing its date still yields its title
/// and location. Nothing is cached: each call reads the card as it is on the page right now.
pub(crate) struct CardExtractor<'a> {
    selectors: &'a SelectorSet,
    base_url: &'a Url,
}


impl<'a> CardExtractor<'a> {
    pub(crate) fn new(selectors: &'a SelectorSet, base_url: &'a Url) -> Self {
        Self { selectors, base_url }
    }

    /// Returns None if the card has no title.
    ///
    /// Coarse card selectors often match banners and separators as well as listings; having
    /// a title is what makes a card a listing.
    pub(crate) fn extract<S: PageSession>(&self, session: &S, card: &S::Handle, query: &str) -> Option<JobRecord> {
        let title = read_text(session, card, &self.selectors.title)?;

        let location_text = self
            .selectors
            .location
            .as_deref()
            .and_then(|selector| read_text(session, card, selector));
        let posted_raw = self
            .selectors
            .date
            .as_deref()
            .and_then(|selector| read_text(session, card, selector));
        let link = self
            .selectors
            .link
            .as_deref()
            .and_then(|selector| session.find_in(card, selector))
            .and_then(|anchor| session.attribute(&anchor, "href"))
            .and_then(|href| self.resolve_link(&href));

        Some(JobRecord {
            title,
            location_text,
            link,
            posted_raw,
            posted_date: None,
            source_query: query.to_string(),
        })
    }

    /// Absolute http(s) URL for an `href`, which may be relative to the search page
    fn resolve_link(&self, href: &str) -> Option<Url> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        let url = self.base_url.join(href).ok()?;
        matches!(url.scheme(), "http" | "https").then_some(url)
    }
}


/// Trimmed text of the first match of `selector` inside `card`, with runs of whitespace
/// collapsed. Blank text counts as missing.
fn read_text<S: PageSession>(session: &S, card: &S::Handle, selector: &str) -> Option<String> {
    let element = session.find_in(card, selector)?;
    let text = session
        .text(&element)?
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}
