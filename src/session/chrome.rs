use std::{ffi::OsString, sync::Arc, time::Duration};

use anyhow::Context;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};

use crate::config::BrowserConfig;

use super::PageSession;


const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight)";
const CLEAR_INPUT_JS: &str = "function() { this.value = ''; }";
/// Chrome drops the connection after this long without a command
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(300);


/// Where an element lives, as a chain of `(selector, index)` lookups starting at the document.
///
/// Chrome node ids go stale whenever the page re-renders, which infinite scroll pages do
/// constantly, so handles are re-resolved from the document on every use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChromeHandle {
    steps: Vec<(String, usize)>,
}


impl ChromeHandle {
    fn root(selector: &str, index: usize) -> Self {
        Self { steps: vec![(selector.to_string(), index)] }
    }

    fn child(&self, selector: &str, index: usize) -> Self {
        let mut steps = self.steps.clone();
        steps.push((selector.to_string(), index));
        Self { steps }
    }
}


/// A single tab of a headless Chrome instance.
pub(crate) struct ChromeSession {
    // Dropping the browser kills the Chrome process, so it must outlive the tab
    _browser: Browser,
    tab: Arc<Tab>,
    closed: bool,
}


impl ChromeSession {
    pub(crate) fn launch(config: &BrowserConfig) -> anyhow::Result<Self> {
        let mut args = vec![
            OsString::from("--disable-dev-shm-usage"),
            OsString::from("--disable-gpu"),
        ];
        if let Some(user_agent) = &config.user_agent {
            args.push(OsString::from(format!("--user-agent={user_agent}")));
        }

        let browser = Browser::new(LaunchOptions {
            headless: config.headless,
            sandbox: false,
            window_size: Some((config.window_width, config.window_height)),
            args: args.iter().map(OsString::as_os_str).collect(),
            idle_browser_timeout: IDLE_BROWSER_TIMEOUT,
            ..Default::default()
        })
        .context("Failed to launch Chrome. Is a Chrome or Chromium binary installed?")?;

        let tab = browser.new_tab().context("Failed to open a browser tab")?;
        tracing::info!(headless = config.headless, "browser session started");

        Ok(Self { _browser: browser, tab, closed: false })
    }

    fn resolve(&self, handle: &ChromeHandle) -> Option<Element<'_>> {
        let mut steps = handle.steps.iter();
        let (selector, index) = steps.next()?;
        let mut element = self.tab.find_elements(selector).ok()?.into_iter().nth(*index)?;
        for (selector, index) in steps {
            element = element.find_elements(selector).ok()?.into_iter().nth(*index)?;
        }
        Some(element)
    }

    fn resolve_or_fail(&self, handle: &ChromeHandle) -> anyhow::Result<Element<'_>> {
        self.resolve(handle)
            .with_context(|| format!("Element {:?} is no longer on the page", handle.steps))
    }
}


impl PageSession for ChromeSession {
    type Handle = ChromeHandle;

    fn navigate(&self, url: &str) -> anyhow::Result<()> {
        self.tab
            .navigate_to(url)?
            .wait_until_navigated()
            .with_context(|| format!("Failed to navigate to {url}"))?;
        Ok(())
    }

    fn find(&self, selector: &str) -> Option<Self::Handle> {
        self.tab.find_element(selector).ok()?;
        Some(ChromeHandle::root(selector, 0))
    }

    fn find_all(&self, selector: &str) -> Vec<Self::Handle> {
        let count = self.tab.find_elements(selector).map(|elements| elements.len()).unwrap_or(0);
        (0..count).map(|index| ChromeHandle::root(selector, index)).collect()
    }

    fn find_in(&self, scope: &Self::Handle, selector: &str) -> Option<Self::Handle> {
        self.resolve(scope)?.find_element(selector).ok()?;
        Some(scope.child(selector, 0))
    }

    fn text(&self, handle: &Self::Handle) -> Option<String> {
        self.resolve(handle)?.get_inner_text().ok()
    }

    fn attribute(&self, handle: &Self::Handle, name: &str) -> Option<String> {
        self.resolve(handle)?.get_attribute_value(name).ok().flatten()
    }

    fn submit_text(&self, handle: &Self::Handle, text: &str) -> anyhow::Result<()> {
        let element = self.resolve_or_fail(handle)?;
        element.call_js_fn(CLEAR_INPUT_JS, vec![], false)?;
        element.click()?;
        element.type_into(text)?;
        Ok(())
    }

    fn press_enter(&self, handle: &Self::Handle) -> anyhow::Result<()> {
        self.resolve_or_fail(handle)?.focus()?;
        self.tab.press_key("Enter")?;
        Ok(())
    }

    fn click(&self, handle: &Self::Handle) -> anyhow::Result<()> {
        self.resolve_or_fail(handle)?.click()?;
        Ok(())
    }

    fn scroll_to_bottom(&self) -> anyhow::Result<()> {
        self.tab.evaluate(SCROLL_TO_BOTTOM_JS, false)?;
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.tab.close(false)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_handles_extend_the_lookup_chain() {
        let card = ChromeHandle::root(".clearfix.hmg-jb-row", 3);
        let title = card.child("h3.job-post-title", 0);

        assert_eq!(
            title.steps,
            vec![
                (".clearfix.hmg-jb-row".to_string(), 3),
                ("h3.job-post-title".to_string(), 0),
            ]
        );
        assert_eq!(card.steps.len(), 1);
    }
}
