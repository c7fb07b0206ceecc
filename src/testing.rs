// Test doubles for the scraping pipeline.
//
// MockSession stands in for a browser tab. Each registered page belongs to one query and
// becomes the current page once that query is submitted (typed + activated, or loaded through
// a URL parameter). Navigating anywhere else resets to a blank entry page.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    rc::Rc,
    time::Duration,
};

use url::Url;

use crate::{
    page_scrapers::{SelectorSet, SiteLayout},
    session::PageSession,
    stabilizer::Submission,
};


pub(crate) const ENTRY_URL: &str = "https://jobs.example.com/search?source=test";
pub(crate) const SEARCH_FIELD: &str = "#search";
pub(crate) const SUBMIT_BUTTON: &str = "#go";
pub(crate) const RESULTS_MARKER: &str = ".results";
pub(crate) const NO_RESULTS_MARKER: &str = ".no-results";
pub(crate) const CARD: &str = ".card";
pub(crate) const TITLE: &str = ".title";
pub(crate) const LOCATION: &str = ".location";
pub(crate) const DATE: &str = ".date";
pub(crate) const LINK: &str = "a.view";


pub(crate) fn selectors() -> SelectorSet {
    SelectorSet {
        search_field: Some(SEARCH_FIELD.to_string()),
        results_marker: RESULTS_MARKER.to_string(),
        no_results_marker: Some(NO_RESULTS_MARKER.to_string()),
        card: CARD.to_string(),
        title: TITLE.to_string(),
        location: Some(LOCATION.to_string()),
        date: Some(DATE.to_string()),
        link: Some(LINK.to_string()),
    }
}


pub(crate) fn layout(submission: Submission, infinite_scroll: bool) -> SiteLayout {
    SiteLayout {
        entry_url: Url::parse(ENTRY_URL).unwrap(),
        selectors: selectors(),
        submission,
        infinite_scroll,
        render_delay: Duration::ZERO,
    }
}


#[derive(Debug, Clone, Default)]
pub(crate) struct MockCard {
    pub(crate) title: Option<String>,
    pub(crate) location: Option<String>,
    pub(crate) date: Option<String>,
    pub(crate) href: Option<String>,
}


impl MockCard {
    pub(crate) fn titled(title: &str) -> Self {
        Self { title: Some(title.to_string()), ..Default::default() }
    }

    pub(crate) fn at(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub(crate) fn posted(mut self, date: &str) -> Self {
        self.date = Some(date.to_string());
        self
    }

    pub(crate) fn linking(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }
}


/// `n` distinct, fully populated cards
pub(crate) fn cards(n: usize) -> Vec<MockCard> {
    (0..n)
        .map(|i| {
            MockCard::titled(&format!("Job {i}"))
                .at("San Diego, CA")
                .posted("03/14/25")
                .linking(&format!("/jobs/{i}"))
        })
        .collect()
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Results,
    NoResults,
    Never,
}


#[derive(Debug, Clone)]
pub(crate) struct MockPage {
    marker: Marker,
    cards: Vec<MockCard>,
    /// Successive card counts; the last one repeats forever
    counts: RefCell<VecDeque<usize>>,
}


impl MockPage {
    pub(crate) fn with_results(cards: Vec<MockCard>) -> Self {
        Self { marker: Marker::Results, cards, counts: RefCell::new(VecDeque::new()) }
    }

    pub(crate) fn no_results() -> Self {
        Self { marker: Marker::NoResults, ..Self::with_results(vec![]) }
    }

    /// A page whose markers never appear
    pub(crate) fn never_loads() -> Self {
        Self { marker: Marker::Never, ..Self::with_results(vec![]) }
    }

    pub(crate) fn with_counts(self, counts: impl IntoIterator<Item = usize>) -> Self {
        self.counts.replace(counts.into_iter().collect());
        self
    }

    fn visible(&self) -> usize {
        let mut counts = self.counts.borrow_mut();
        let count = match counts.len() {
            0 => self.cards.len(),
            1 => counts[0],
            _ => counts.pop_front().unwrap_or_default(),
        };
        count.min(self.cards.len())
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Part {
    Title,
    Location,
    Date,
    Link,
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MockHandle {
    SearchField,
    SubmitButton,
    Marker,
    Card(usize),
    Part(usize, Part),
}


pub(crate) struct MockSession {
    pages: HashMap<String, MockPage>,
    current: RefCell<Option<String>>,
    typed: RefCell<String>,
    search_field: bool,
    failing_navigation: bool,
    actions: RefCell<Vec<String>>,
    closes: Rc<Cell<usize>>,
}


impl MockSession {
    pub(crate) fn new() -> Self {
        Self {
            pages: HashMap::new(),
            current: RefCell::new(None),
            typed: RefCell::new(String::new()),
            search_field: true,
            failing_navigation: false,
            actions: RefCell::new(Vec::new()),
            closes: Rc::new(Cell::new(0)),
        }
    }

    pub(crate) fn with_page(mut self, query: &str, page: MockPage) -> Self {
        self.pages.insert(query.to_string(), page);
        self
    }

    pub(crate) fn without_search_field(mut self) -> Self {
        self.search_field = false;
        self
    }

    pub(crate) fn with_failing_navigation(mut self) -> Self {
        self.failing_navigation = true;
        self
    }

    /// Everything done to the page so far, oldest first
    pub(crate) fn actions(&self) -> Vec<String> {
        self.actions.borrow().clone()
    }

    pub(crate) fn close_counter(&self) -> Rc<Cell<usize>> {
        self.closes.clone()
    }

    fn record(&self, action: String) {
        self.actions.borrow_mut().push(action);
    }

    fn page(&self) -> Option<&MockPage> {
        self.current.borrow().as_ref().and_then(|query| self.pages.get(query))
    }

    fn card(&self, index: usize) -> Option<&MockCard> {
        self.page()?.cards.get(index)
    }

    fn activate(&self) {
        let typed = self.typed.borrow().clone();
        self.current.replace(Some(typed));
    }
}


impl PageSession for MockSession {
    type Handle = MockHandle;

    fn navigate(&self, url: &str) -> anyhow::Result<()> {
        self.record(format!("navigate {url}"));
        if self.failing_navigation {
            anyhow::bail!("net::ERR_CONNECTION_RESET");
        }
        self.typed.borrow_mut().clear();
        let query = Url::parse(url)?
            .query_pairs()
            .map(|(_, value)| value.into_owned())
            .find(|value| self.pages.contains_key(value));
        self.current.replace(query);
        Ok(())
    }

    fn find(&self, selector: &str) -> Option<Self::Handle> {
        match selector {
            SEARCH_FIELD if self.search_field => Some(MockHandle::SearchField),
            SUBMIT_BUTTON => Some(MockHandle::SubmitButton),
            RESULTS_MARKER if self.page()?.marker == Marker::Results => Some(MockHandle::Marker),
            NO_RESULTS_MARKER if self.page()?.marker == Marker::NoResults => Some(MockHandle::Marker),
            _ => None,
        }
    }

    fn find_all(&self, selector: &str) -> Vec<Self::Handle> {
        match (selector, self.page()) {
            (CARD, Some(page)) => (0..page.visible()).map(MockHandle::Card).collect(),
            _ => Vec::new(),
        }
    }

    fn find_in(&self, scope: &Self::Handle, selector: &str) -> Option<Self::Handle> {
        let MockHandle::Card(index) = *scope else {
            return None;
        };
        let card = self.card(index)?;
        let (part, present) = match selector {
            TITLE => (Part::Title, card.title.is_some()),
            LOCATION => (Part::Location, card.location.is_some()),
            DATE => (Part::Date, card.date.is_some()),
            LINK => (Part::Link, card.href.is_some()),
            _ => return None,
        };
        present.then_some(MockHandle::Part(index, part))
    }

    fn text(&self, handle: &Self::Handle) -> Option<String> {
        let MockHandle::Part(index, part) = *handle else {
            return None;
        };
        let card = self.card(index)?;
        match part {
            Part::Title => card.title.clone(),
            Part::Location => card.location.clone(),
            Part::Date => card.date.clone(),
            Part::Link => Some("View".to_string()),
        }
    }

    fn attribute(&self, handle: &Self::Handle, name: &str) -> Option<String> {
        match *handle {
            MockHandle::Part(index, Part::Link) if name == "href" => self.card(index)?.href.clone(),
            _ => None,
        }
    }

    fn submit_text(&self, _handle: &Self::Handle, text: &str) -> anyhow::Result<()> {
        self.record(format!("type {text}"));
        self.typed.replace(text.to_string());
        Ok(())
    }

    fn press_enter(&self, _handle: &Self::Handle) -> anyhow::Result<()> {
        self.record("enter".to_string());
        self.activate();
        Ok(())
    }

    fn click(&self, _handle: &Self::Handle) -> anyhow::Result<()> {
        self.record("click".to_string());
        self.activate();
        Ok(())
    }

    fn scroll_to_bottom(&self) -> anyhow::Result<()> {
        self.record("scroll".to_string());
        Ok(())
    }

    fn pause(&self, duration: Duration) {
        self.record(format!("pause {}ms", duration.as_millis()));
    }

    /// Checks the predicate once: mock pages never change while waiting
    fn wait_until<F>(&self, _timeout: Duration, mut predicate: F) -> bool
    where
        F: FnMut(&Self) -> bool,
    {
        predicate(self)
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.closes.set(self.closes.get() + 1);
        Ok(())
    }
}
