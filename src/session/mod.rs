use std::{ops::Deref, time::{Duration, Instant}};

pub(crate) mod chrome;
pub(crate) mod snapshot;

pub(crate) use chrome::ChromeSession;
pub(crate) use snapshot::SnapshotSession;


/// How often [`PageSession::wait_until`] re-checks its predicate by default
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(250);


/// A live (or simulated) browser page that the scraper drives.
///
/// Lookups never fail: a selector that matches nothing, or a handle that no longer points at
/// anything, simply yields `None` or an empty list. Only actions that change the page return
/// errors, since a failed click or navigation means the page is in an unknown state.
///
/// Handles are cheap descriptions of where an element is. Implementations must not assume
/// that a handle obtained before a scroll or navigation still resolves afterwards.
pub(crate) trait PageSession {
    type Handle: Clone;

    fn navigate(&self, url: &str) -> anyhow::Result<()>;

    fn find(&self, selector: &str) -> Option<Self::Handle>;

    fn find_all(&self, selector: &str) -> Vec<Self::Handle>;

    /// Looks up the first descendant of `scope` matching `selector`
    fn find_in(&self, scope: &Self::Handle, selector: &str) -> Option<Self::Handle>;

    /// The rendered text of the element
    fn text(&self, handle: &Self::Handle) -> Option<String>;

    fn attribute(&self, handle: &Self::Handle, name: &str) -> Option<String>;

    /// Clears whatever the input already holds, then types `text` into it
    fn submit_text(&self, handle: &Self::Handle, text: &str) -> anyhow::Result<()>;

    fn press_enter(&self, handle: &Self::Handle) -> anyhow::Result<()>;

    fn click(&self, handle: &Self::Handle) -> anyhow::Result<()>;

    fn scroll_to_bottom(&self) -> anyhow::Result<()>;

    /// Blocks the calling thread. Simulated sessions override this to avoid real sleeps.
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    /// Polls `predicate` until it holds or `timeout` elapses.
    ///
    /// Returns whether the predicate was satisfied. The predicate is always evaluated at least
    /// once, even with a zero timeout.
    fn wait_until<F>(&self, timeout: Duration, mut predicate: F) -> bool
    where
        Self: Sized,
        F: FnMut(&Self) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if predicate(self) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.pause(POLL_INTERVAL.min(deadline - now));
        }
    }

    fn close(&mut self) -> anyhow::Result<()>;
}


/// Owns a session for the duration of a run and closes it on every exit path.
///
/// Closing happens in `Drop`, so an early `?` return or a panic while scraping still releases
/// the browser. Errors while closing are logged since there is nobody left to return them to.
pub(crate) struct SessionGuard<S: PageSession> {
    session: S,
}


impl<S: PageSession> SessionGuard<S> {
    pub(crate) fn new(session: S) -> Self {
        Self { session }
    }
}


impl<S: PageSession> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}


impl<S: PageSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        match self.session.close() {
            Ok(()) => tracing::debug!("page session closed"),
            Err(e) => tracing::warn!(error = %e, "failed to close page session cleanly"),
        }
    }
}
