use std::{cmp::Reverse, sync::OnceLock};

use chrono::{Days, NaiveDate};
use fxhash::FxHashSet;
use regex::Regex;

use crate::models::JobRecord;


/// Which listings survive into the report.
///
/// Empty lists and a zero recency window switch the corresponding filter off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FilterOptions {
    /// Keep only listings whose location contains one of these (case-insensitive)
    pub(crate) locations: Vec<String>,
    /// Drop listings whose location contains any of these (case-insensitive)
    pub(crate) exclude: Vec<String>,
    /// Keep only listings posted within this many days of today
    pub(crate) recency_days: u32,
}


impl FilterOptions {
    fn cutoff(&self, today: NaiveDate) -> Option<NaiveDate> {
        if self.recency_days == 0 {
            return None;
        }
        today.checked_sub_days(Days::new(self.recency_days.into()))
    }
}


/// Turns the listings of every query into the final report order.
///
/// Listings are merged in query order, deduplicated (first copy wins), filtered by location,
/// dated, filtered by recency, filtered by excluded terms and finally sorted newest first.
/// Listings whose date could not be read are dropped by the recency filter, and sort after
/// every dated listing when that filter is off.
pub(crate) fn process<I>(per_query: I, options: &FilterOptions, today: NaiveDate) -> Vec<JobRecord>
where
    I: IntoIterator<Item = Vec<JobRecord>>,
{
    let merged: Vec<_> = per_query.into_iter().flatten().collect();
    let scraped = merged.len();
    let mut records = dedup(merged);
    tracing::debug!(scraped, unique = records.len(), "merged listings");

    if !options.locations.is_empty() {
        records.retain(|record| mentions_any(record.location_text.as_deref(), &options.locations));
    }

    for record in &mut records {
        record.posted_date = record.posted_raw.as_deref().and_then(parse_posted_date);
    }

    if let Some(cutoff) = options.cutoff(today) {
        records.retain(|record| record.posted_date.is_some_and(|date| date >= cutoff));
    }

    if !options.exclude.is_empty() {
        records.retain(|record| !mentions_any(record.location_text.as_deref(), &options.exclude));
    }

    records.sort_by_key(|record| Reverse(record.posted_date));
    tracing::info!(scraped, kept = records.len(), "filtered listings");
    records
}


/// Removes later copies of the same listing, keeping order otherwise
pub(crate) fn dedup(records: Vec<JobRecord>) -> Vec<JobRecord> {
    let mut seen = FxHashSet::default();
    records
        .into_iter()
        .filter(|record| seen.insert(record.dedup_key()))
        .collect()
}


/// Listings without a location never match
fn mentions_any(location: Option<&str>, needles: &[String]) -> bool {
    let Some(location) = location else {
        return false;
    };
    let location = location.to_lowercase();
    needles.iter().any(|needle| location.contains(&needle.to_lowercase()))
}


fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([0-9]{1,2})/([0-9]{1,2})/([0-9]{2})$").unwrap())
}


/// Parses `month/day/yy` dates such as `03/14/25`.
///
/// Two digit years follow the POSIX pivot: 00-68 are 2000-2068, 69-99 are 1969-1999.
/// Anything else, including dates that do not exist, gives None.
pub(crate) fn parse_posted_date(raw: &str) -> Option<NaiveDate> {
    let captures = date_pattern().captures(raw.trim())?;
    let month: u32 = captures[1].parse().ok()?;
    let day: u32 = captures[2].parse().ok()?;
    let year: i32 = captures[3].parse().ok()?;
    let year = if year < 69 { 2000 + year } else { 1900 + year };
    NaiveDate::from_ymd_opt(year, month, day)
}
