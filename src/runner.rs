use crate::{
    extractor::CardExtractor,
    models::JobRecord,
    page_scrapers::SiteLayout,
    session::PageSession,
    stabilizer::{Outcome, StabilizeError, Stabilizer},
};


#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum QueryStatus {
    /// `skipped` cards matched the card selector but had no title
    Succeeded { items: usize, skipped: usize },
    NoResults,
    Failed { reason: String },
}


#[derive(Debug, Clone)]
pub(crate) struct QueryResult {
    pub(crate) query: String,
    pub(crate) status: QueryStatus,
    /// In the order the cards appeared on the page
    pub(crate) records: Vec<JobRecord>,
}


/// A query that produced nothing because scraping it went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueryFailure {
    pub(crate) query: String,
    pub(crate) reason: String,
}


/// What each query of a run produced, in the order the queries were given.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunOutcome {
    results: Vec<QueryResult>,
}


impl RunOutcome {
    pub(crate) fn results(&self) -> &[QueryResult] {
        &self.results
    }

    /// The listings of the first query with this text
    #[cfg(test)]
    pub(crate) fn records_for(&self, query: &str) -> Option<&[JobRecord]> {
        self.find(query).map(|result| result.records.as_slice())
    }

    #[cfg(test)]
    pub(crate) fn status_of(&self, query: &str) -> Option<&QueryStatus> {
        self.find(query).map(|result| &result.status)
    }

    pub(crate) fn failures(&self) -> Vec<QueryFailure> {
        self.results
            .iter()
            .filter_map(|result| match &result.status {
                QueryStatus::Failed { reason } => Some(QueryFailure { query: result.query.clone(), reason: reason.clone() }),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn into_per_query(self) -> impl Iterator<Item = Vec<JobRecord>> {
        self.results.into_iter().map(|result| result.records)
    }

    #[cfg(test)]
    fn find(&self, query: &str) -> Option<&QueryResult> {
        self.results.iter().find(|result| result.query == query)
    }
}


/// Runs search queries one after another against a single page session.
pub(crate) struct QueryRunner {
    layout: SiteLayout,
    stabilizer: Stabilizer,
}


impl QueryRunner {
    pub(crate) fn new(layout: SiteLayout, stabilizer: Stabilizer) -> Self {
        Self { layout, stabilizer }
    }

    /// Scrapes every query in order.
    ///
    /// A query that fails contributes no listings and a [`QueryStatus::Failed`]; the run always
    /// goes on to the next query. Each query starts by sending the session back to the entry
    /// page, whatever state the previous query left it in.
    pub(crate) fn run<S: PageSession>(&self, session: &S, queries: &[String]) -> RunOutcome {
        let results = queries
            .iter()
            .map(|query| {
                let _span = tracing::info_span!("query", %query).entered();
                self.run_query(session, query)
            })
            .collect();
        RunOutcome { results }
    }

    fn run_query<S: PageSession>(&self, session: &S, query: &str) -> QueryResult {
        match self.capture(session, query) {
            Ok((status, records)) => {
                tracing::info!(count = records.len(), "scraped listings");
                QueryResult { query: query.to_string(), status, records }
            }
            Err(e) => {
                tracing::warn!(error = %e, "query failed, skipping");
                QueryResult {
                    query: query.to_string(),
                    status: QueryStatus::Failed { reason: e.to_string() },
                    records: Vec::new(),
                }
            }
        }
    }

    fn capture<S: PageSession>(&self, session: &S, query: &str) -> Result<(QueryStatus, Vec<JobRecord>), StabilizeError> {
        session
            .navigate(self.layout.entry_url.as_str())
            .map_err(StabilizeError::Navigation)?;

        let ready = self.stabilizer.stabilize(session, &self.layout, query)?;
        tracing::debug!(items = ready.item_count, settle_iterations = ready.settle_iterations, "page settled");
        if ready.outcome == Outcome::NoResults {
            return Ok((QueryStatus::NoResults, Vec::new()));
        }

        let extractor = CardExtractor::new(&self.layout.selectors, &self.layout.entry_url);
        let cards = session.find_all(&self.layout.selectors.card);
        tracing::debug!(cards = cards.len(), "parsing result cards");
        let records: Vec<_> = cards
            .iter()
            .filter_map(|card| extractor.extract(session, card, query))
            .collect();

        let status = QueryStatus::Succeeded { items: records.len(), skipped: cards.len() - records.len() };
        Ok((status, records))
    }
}
