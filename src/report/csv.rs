use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;

use super::{display_date, Report, Reporter};


#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "Location")]
    location: &'a str,
    #[serde(rename = "Date Posted")]
    date_posted: String,
    #[serde(rename = "Link")]
    link: &'a str,
    #[serde(rename = "Query")]
    query: &'a str,
}


/// Writes the listings to a CSV file, replacing it if it exists.
pub(crate) struct CsvReporter {
    path: PathBuf,
}


impl CsvReporter {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }
}


impl Reporter for CsvReporter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn deliver(&mut self, report: &Report<'_>) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;

        for record in report.records {
            writer.serialize(CsvRow {
                title: &record.title,
                location: record.location_text.as_deref().unwrap_or_default(),
                date_posted: display_date(record),
                link: record.link.as_ref().map(|url| url.as_str()).unwrap_or_default(),
                query: &record.source_query,
            })?;
        }

        writer.flush()?;
        tracing::info!(path = %self.path.display(), count = report.count(), "wrote csv");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;

    #[test]
    fn writes_a_header_and_one_row_per_listing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        let records = fixtures::records();
        let report = Report { title: "Job Alert", records: &records, recency_days: 30, failures: &[] };

        CsvReporter::new(path.clone()).deliver(&report).unwrap();

        let written = std::fs::read_to_string(path).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(lines[0], "Title,Location,Date Posted,Link,Query");
        assert_eq!(
            lines[1],
            "Embedded Engineer,\"San Diego, CA\",2025-03-14,https://jobs.akraya.com/index.smpl?postid=1,\"San Diego, CA\""
        );
        assert_eq!(lines[2], "Data <Analyst> & Modeler,\"Mountain View, CA\",Unknown,,\"Mountain View, CA\"");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let records = fixtures::records();
        let report = Report { title: "Job Alert", records: &records, recency_days: 30, failures: &[] };

        let err = CsvReporter::new(PathBuf::from("/definitely/not/here/jobs.csv")).deliver(&report).unwrap_err();
        assert!(err.to_string().contains("Failed to create"));
    }
}
