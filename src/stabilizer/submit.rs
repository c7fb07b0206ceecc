use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::{page_scrapers::SiteLayout, session::PageSession};

use super::StabilizeError;


fn default_double_enter_pause_ms() -> u64 {
    500
}


/// How a query is handed to the search page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum Submission {
    /// Type into the search field and press Enter
    Enter,
    /// Type, press Enter, wait, press Enter again.
    ///
    /// Some search boxes open a suggestion list on the first Enter and only search on the
    /// second.
    DoubleEnter {
        #[serde(default = "default_double_enter_pause_ms")]
        pause_ms: u64,
    },
    /// Type into the search field and click a submit button
    Click { button: String },
    /// Skip the form and load the entry URL with the query added as `param`
    UrlParameter { param: String },
}


impl Submission {
    pub(crate) fn submit<S: PageSession>(
        &self,
        session: &S,
        layout: &SiteLayout,
        query: &str,
    ) -> Result<(), StabilizeError> {
        match self {
            Self::Enter => {
                let field = type_query(session, layout, query)?;
                session.press_enter(&field).map_err(StabilizeError::Submit)
            }
            Self::DoubleEnter { pause_ms } => {
                let field = type_query(session, layout, query)?;
                session.press_enter(&field).map_err(StabilizeError::Submit)?;
                session.pause(Duration::from_millis(*pause_ms));
                session.press_enter(&field).map_err(StabilizeError::Submit)
            }
            Self::Click { button } => {
                type_query(session, layout, query)?;
                let button = session
                    .find(button)
                    .ok_or_else(|| StabilizeError::FieldMissing { selector: button.clone() })?;
                session.click(&button).map_err(StabilizeError::Submit)
            }
            Self::UrlParameter { param } => {
                let url = query_url(&layout.entry_url, param, query);
                tracing::debug!(%url, "loading search url");
                session.navigate(url.as_str()).map_err(StabilizeError::Navigation)
            }
        }
    }
}


/// Clears the search field and types the query into it
fn type_query<S: PageSession>(session: &S, layout: &SiteLayout, query: &str) -> Result<S::Handle, StabilizeError> {
    let selector = layout
        .selectors
        .search_field
        .as_deref()
        .ok_or_else(|| StabilizeError::FieldMissing { selector: "<no search_field configured>".to_string() })?;
    let field = session
        .find(selector)
        .ok_or_else(|| StabilizeError::FieldMissing { selector: selector.to_string() })?;
    session.submit_text(&field, query).map_err(StabilizeError::Submit)?;
    Ok(field)
}


/// The entry URL with the query appended, keeping any parameters the entry URL already has
pub(crate) fn query_url(entry_url: &Url, param: &str, query: &str) -> Url {
    let mut url = entry_url.clone();
    url.query_pairs_mut().append_pair(param, query);
    url
}
