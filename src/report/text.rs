use std::io::Write;

use super::{display_date, Report, Reporter};


const HEADERS: [&str; 4] = ["Title", "Location", "Date Posted", "Link"];


/// Prints the listings as an aligned plain-text table.
pub(crate) struct TextReporter<W: Write> {
    out: W,
}


impl<W: Write> TextReporter<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }
}


impl<W: Write> Reporter for TextReporter<W> {
    fn name(&self) -> &'static str {
        "text"
    }

    fn deliver(&mut self, report: &Report<'_>) -> anyhow::Result<()> {
        let rows: Vec<[String; 4]> = report
            .records
            .iter()
            .map(|record| {
                [
                    record.title.clone(),
                    record.location_text.clone().unwrap_or_default(),
                    display_date(record),
                    record.link.as_ref().map(|url| url.to_string()).unwrap_or_default(),
                ]
            })
            .collect();

        let mut widths = HEADERS.map(|header| header.chars().count());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        writeln!(self.out, "{}", report.headline())?;
        writeln!(self.out)?;
        write_row(&mut self.out, &HEADERS.map(str::to_string), &widths)?;
        let rule: Vec<_> = widths.iter().map(|width| "-".repeat(*width)).collect();
        writeln!(self.out, "{}", rule.join("  "))?;
        for row in &rows {
            write_row(&mut self.out, row, &widths)?;
        }

        if !report.failures.is_empty() {
            writeln!(self.out)?;
            writeln!(self.out, "Queries that failed:")?;
            for failure in report.failures {
                writeln!(self.out, "  {}: {}", failure.query, failure.reason)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}


fn write_row(out: &mut impl Write, cells: &[String; 4], widths: &[usize; 4]) -> std::io::Result<()> {
    let padded: Vec<_> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    writeln!(out, "{}", padded.join("  ").trim_end())
}
