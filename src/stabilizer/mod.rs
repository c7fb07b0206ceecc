use std::time::Duration;

use thiserror::Error;

use crate::{page_scrapers::SiteLayout, session::PageSession};

mod submit;

pub(crate) use submit::Submission;


/// Why a query could not be brought to an extractable state.
///
/// None of these end the run: the query simply contributes no listings.
#[derive(Debug, Error)]
pub(crate) enum StabilizeError {
    #[error("navigation failed: {0:#}")]
    Navigation(anyhow::Error),
    #[error("element `{selector}` not found")]
    FieldMissing { selector: String },
    #[error("could not submit the query: {0:#}")]
    Submit(anyhow::Error),
    #[error("timed out after {0:?} waiting for results")]
    Timeout(Duration),
    #[error("could not scroll the results: {0:#}")]
    Scroll(anyhow::Error),
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Results,
    /// The board said nothing matched, or the results list stayed empty
    NoResults,
}


/// The page has stopped changing and its cards can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReadyState {
    pub(crate) outcome: Outcome,
    /// Cards visible when the page settled
    pub(crate) item_count: usize,
    /// Scroll-pause-recount cycles performed
    pub(crate) settle_iterations: u32,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StabilizerSettings {
    /// Upper bound on waiting for the results or no-results marker
    pub(crate) marker_timeout: Duration,
    /// Pause between scrolling and recounting
    pub(crate) settle_interval: Duration,
    pub(crate) max_settle_iterations: u32,
}


impl Default for StabilizerSettings {
    fn default() -> Self {
        Self {
            marker_timeout: Duration::from_secs(10),
            settle_interval: Duration::from_secs(2),
            max_settle_iterations: 5,
        }
    }
}


#[derive(Debug)]
enum State {
    Submitted,
    WaitingForMarker,
    ScrollSettling { iteration: u32, last_count: usize },
    Ready(ReadyState),
}


/// Drives a search page from "query submitted" to "all results rendered".
#[derive(Debug, Clone)]
pub(crate) struct Stabilizer {
    settings: StabilizerSettings,
}


impl Stabilizer {
    pub(crate) fn new(settings: StabilizerSettings) -> Self {
        Self { settings }
    }

    /// Submits `query` and waits until the page's results stop changing.
    ///
    /// The session is expected to be at the layout's entry point already. On pages that load
    /// more cards as they scroll, scrolling continues until a scroll adds no cards or the
    /// iteration budget runs out. Running out of budget is not an error: whatever has loaded
    /// by then is what gets extracted.
    pub(crate) fn stabilize<S: PageSession>(
        &self,
        session: &S,
        layout: &SiteLayout,
        query: &str,
    ) -> Result<ReadyState, StabilizeError> {
        layout.submission.submit(session, layout, query)?;

        let mut state = State::Submitted;
        loop {
            tracing::trace!(?state, "stabilizer step");
            state = match state {
                State::Submitted => State::WaitingForMarker,
                State::WaitingForMarker => self.await_marker(session, layout)?,
                State::ScrollSettling { iteration, last_count } => {
                    self.settle_step(session, layout, iteration, last_count)?
                }
                State::Ready(ready) => return Ok(ready),
            };
        }
    }

    fn await_marker<S: PageSession>(&self, session: &S, layout: &SiteLayout) -> Result<State, StabilizeError> {
        let selectors = &layout.selectors;
        let has_results = |s: &S| s.find(&selectors.results_marker).is_some();
        let has_no_results = |s: &S| {
            selectors
                .no_results_marker
                .as_deref()
                .is_some_and(|marker| s.find(marker).is_some())
        };

        let appeared = session.wait_until(self.settings.marker_timeout, |s| has_results(s) || has_no_results(s));
        if !appeared {
            return Err(StabilizeError::Timeout(self.settings.marker_timeout));
        }
        if !has_results(session) {
            tracing::info!("board reported no results");
            return Ok(State::Ready(ReadyState { outcome: Outcome::NoResults, item_count: 0, settle_iterations: 0 }));
        }

        if !layout.render_delay.is_zero() {
            session.pause(layout.render_delay);
        }
        let count = session.find_all(&selectors.card).len();

        if layout.infinite_scroll {
            Ok(State::ScrollSettling { iteration: 0, last_count: count })
        } else {
            Ok(State::Ready(ready_with(count, 0)))
        }
    }

    fn settle_step<S: PageSession>(
        &self,
        session: &S,
        layout: &SiteLayout,
        iteration: u32,
        last_count: usize,
    ) -> Result<State, StabilizeError> {
        if iteration >= self.settings.max_settle_iterations {
            tracing::warn!(
                iterations = iteration,
                count = last_count,
                "results still growing after the last settle iteration"
            );
            return Ok(State::Ready(ready_with(last_count, iteration)));
        }

        session.scroll_to_bottom().map_err(StabilizeError::Scroll)?;
        session.pause(self.settings.settle_interval);
        let count = session.find_all(&layout.selectors.card).len();
        let iteration = iteration + 1;

        if count == 0 && last_count == 0 {
            tracing::info!("no listings rendered");
            return Ok(State::Ready(ready_with(0, iteration)));
        }
        if count <= last_count {
            tracing::debug!(count, iterations = iteration, "finished scrolling");
            return Ok(State::Ready(ready_with(count, iteration)));
        }

        tracing::debug!(count, iteration, "more listings loaded");
        Ok(State::ScrollSettling { iteration, last_count: count })
    }
}


fn ready_with(item_count: usize, settle_iterations: u32) -> ReadyState {
    let outcome = if item_count == 0 { Outcome::NoResults } else { Outcome::Results };
    ReadyState { outcome, item_count, settle_iterations }
}
