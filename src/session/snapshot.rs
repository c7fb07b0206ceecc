use std::{cell::RefCell, path::Path};

use anyhow::Context;
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use super::PageSession;


/// A page that has already been rendered and saved to disk.
///
/// Useful for trying a layout's selectors against a results page saved from a real browser
/// without launching one. Navigation, typing and scrolling do nothing; every lookup runs
/// against the same parsed document.
pub(crate) struct SnapshotSession {
    document: Html,
    visited: RefCell<Vec<String>>,
}


impl SnapshotSession {
    pub(crate) fn from_html(html: &str) -> Self {
        Self { document: Html::parse_document(html), visited: RefCell::new(Vec::new()) }
    }

    pub(crate) fn from_file(path: &Path) -> anyhow::Result<Self> {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        Ok(Self::from_html(&html))
    }

    /// Every URL the scraper asked to navigate to, in order
    #[cfg(test)]
    pub(crate) fn visited(&self) -> Vec<String> {
        self.visited.borrow().clone()
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.document.tree.get(id).and_then(ElementRef::wrap)
    }
}


fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::debug!(selector, error = ?e, "ignoring unparseable selector");
            None
        }
    }
}


impl PageSession for SnapshotSession {
    type Handle = NodeId;

    fn navigate(&self, url: &str) -> anyhow::Result<()> {
        tracing::debug!(url, "snapshot session ignores navigation");
        self.visited.borrow_mut().push(url.to_string());
        Ok(())
    }

    fn find(&self, selector: &str) -> Option<Self::Handle> {
        let selector = parse_selector(selector)?;
        self.document.select(&selector).next().map(|element| element.id())
    }

    fn find_all(&self, selector: &str) -> Vec<Self::Handle> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        self.document.select(&selector).map(|element| element.id()).collect()
    }

    fn find_in(&self, scope: &Self::Handle, selector: &str) -> Option<Self::Handle> {
        let selector = parse_selector(selector)?;
        let scope = self.element(*scope)?;
        scope
            .select(&selector)
            .find(|element| element.id() != scope.id())
            .map(|element| element.id())
    }

    fn text(&self, handle: &Self::Handle) -> Option<String> {
        Some(self.element(*handle)?.text().collect::<String>())
    }

    fn attribute(&self, handle: &Self::Handle, name: &str) -> Option<String> {
        self.element(*handle)?.value().attr(name).map(str::to_string)
    }

    fn submit_text(&self, _handle: &Self::Handle, _text: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn press_enter(&self, _handle: &Self::Handle) -> anyhow::Result<()> {
        Ok(())
    }

    fn click(&self, _handle: &Self::Handle) -> anyhow::Result<()> {
        Ok(())
    }

    fn scroll_to_bottom(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const PAGE: &str = r#"
        <html><body>
            <div id="results">
                <div class="card"><h3>First <b>job</b></h3><a href="/jobs/1">view</a></div>
                <div class="card"><h3>Second job</h3></div>
            </div>
        </body></html>
    "#;

    #[test]
    fn finds_elements_in_document_order() {
        let session = SnapshotSession::from_html(PAGE);
        let cards = session.find_all(".card");

        assert_eq!(cards.len(), 2);
        let titles: Vec<_> = cards
            .iter()
            .filter_map(|card| session.find_in(card, "h3"))
            .filter_map(|title| session.text(&title))
            .collect();
        assert_eq!(titles, vec!["First job", "Second job"]);
    }

    #[test]
    fn inline_markup_does_not_split_words() {
        let session = SnapshotSession::from_html(r#"<div class="card"><h3>Data <mark>Eng</mark>ineer</h3></div>"#);
        let title = session.find("h3").unwrap();

        assert_eq!(session.text(&title).as_deref(), Some("Data Engineer"));
    }

    #[test]
    fn missing_elements_and_bad_selectors_are_empty() {
        let session = SnapshotSession::from_html(PAGE);
        let second = session.find_all(".card")[1];

        assert!(session.find_in(&second, "a").is_none());
        assert!(session.find("#no-results").is_none());
        assert!(session.find_all("div[[").is_empty());
    }

    #[test]
    fn reads_attributes() {
        let session = SnapshotSession::from_html(PAGE);
        let first = session.find_all(".card")[0];
        let link = session.find_in(&first, "a").unwrap();

        assert_eq!(session.attribute(&link, "href").as_deref(), Some("/jobs/1"));
        assert_eq!(session.attribute(&link, "title"), None);
    }

    #[test]
    fn default_wait_checks_the_predicate_once_without_timeout() {
        let session = SnapshotSession::from_html(PAGE);
        let mut calls = 0;

        let present = session.wait_until(Duration::ZERO, |s| {
            calls += 1;
            s.find("#results").is_some()
        });
        assert!(present);

        let absent = session.wait_until(Duration::ZERO, |s| s.find("#no-results").is_some());
        assert!(!absent);
        assert_eq!(calls, 1);
    }

    #[test]
    fn records_navigation() {
        let session = SnapshotSession::from_html(PAGE);
        session.navigate("https://jobs.example.com/search").unwrap();

        assert_eq!(session.visited(), vec!["https://jobs.example.com/search".to_string()]);
    }
}
