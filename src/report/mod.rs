use crate::{models::JobRecord, runner::QueryFailure};

mod csv;
mod email;
mod text;

pub(crate) use self::{csv::CsvReporter, email::{EmailReporter, EmailSettings}, text::TextReporter};


/// The final listings of a run, ready to be handed out.
pub(crate) struct Report<'a> {
    pub(crate) title: &'a str,
    /// Newest first
    pub(crate) records: &'a [JobRecord],
    /// 0 when listings of any age were kept
    pub(crate) recency_days: u32,
    /// Queries that produced nothing because scraping them failed
    pub(crate) failures: &'a [QueryFailure],
}


impl Report<'_> {
    pub(crate) fn count(&self) -> usize {
        self.records.len()
    }

    /// Nothing was found and no query failed, so there is nothing to tell anyone
    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty() && self.failures.is_empty()
    }

    /// One line describing what was found, e.g. "Found 4 jobs posted in the last 30 days"
    pub(crate) fn headline(&self) -> String {
        let jobs = if self.count() == 1 { "job" } else { "jobs" };
        match self.recency_days {
            0 => format!("Found {} {jobs}", self.count()),
            days => format!("Found {} {jobs} posted in the last {days} days", self.count()),
        }
    }
}


/// Somewhere the listings of a run end up.
///
/// Reporters are independent of each other: one failing does not stop the rest.
pub(crate) trait Reporter {
    fn name(&self) -> &'static str;

    fn deliver(&mut self, report: &Report<'_>) -> anyhow::Result<()>;
}


pub(crate) fn display_date(record: &JobRecord) -> String {
    match (record.posted_date, &record.posted_raw) {
        (Some(date), _) => date.format("%Y-%m-%d").to_string(),
        (None, Some(raw)) => raw.clone(),
        (None, None) => "Unknown".to_string(),
    }
}
