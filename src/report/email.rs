use std::fmt::Write;

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};

use super::{display_date, Report, Reporter};


const STYLE: &str = "
    body { font-family: sans-serif; }
    table { border-collapse: collapse; width: 100%; }
    th, td { border: 1px solid #dddddd; text-align: left; padding: 8px; }
    tr:nth-child(even) { background-color: #f2f2f2; }
    th { background-color: #4CAF50; color: white; }
";


/// SMTP account the report is sent from.
#[derive(Debug, Clone)]
pub(crate) struct EmailSettings {
    pub(crate) user: String,
    pub(crate) password: String,
    pub(crate) to: String,
    pub(crate) smtp_host: String,
}


impl EmailSettings {
    /// None unless both the user and the password are known. Mail goes to the sender when no
    /// recipient is given.
    pub(crate) fn new(user: Option<String>, password: Option<String>, to: Option<String>, smtp_host: String) -> Option<Self> {
        let user = user.filter(|user| !user.is_empty())?;
        let password = password.filter(|password| !password.is_empty())?;
        let to = to.filter(|to| !to.is_empty()).unwrap_or_else(|| user.clone());
        Some(Self { user, password, to, smtp_host })
    }
}


/// Emails the listings as an HTML table over implicit-TLS SMTP.
pub(crate) struct EmailReporter {
    settings: EmailSettings,
}


impl EmailReporter {
    pub(crate) fn new(settings: EmailSettings) -> Self {
        Self { settings }
    }
}


impl Reporter for EmailReporter {
    fn name(&self) -> &'static str {
        "email"
    }

    fn deliver(&mut self, report: &Report<'_>) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.settings.user.parse::<Mailbox>()?)
            .to(self.settings.to.parse::<Mailbox>()?)
            .subject(subject(report))
            .header(ContentType::TEXT_HTML)
            .body(render_html(report))?;

        let mailer = SmtpTransport::relay(&self.settings.smtp_host)?
            .credentials(Credentials::new(self.settings.user.clone(), self.settings.password.clone()))
            .build();
        mailer.send(&message)?;

        tracing::info!(to = %self.settings.to, count = report.count(), "sent email report");
        Ok(())
    }
}


pub(crate) fn subject(report: &Report<'_>) -> String {
    match report.failures.len() {
        0 => format!("{} - {}", report.title, report.headline()),
        1 => format!("{} - {} (1 search failed)", report.title, report.headline()),
        failed => format!("{} - {} ({failed} searches failed)", report.title, report.headline()),
    }
}


pub(crate) fn render_html(report: &Report<'_>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<html>\n<head>\n<style>{STYLE}</style>\n</head>\n<body>\n<h2>{}</h2>\n<p>{}:</p>\n",
        escape(report.title),
        escape(&report.headline()),
    );

    html.push_str("<table>\n<tr><th>Title</th><th>Location</th><th>Date Posted</th></tr>\n");
    for record in report.records {
        let title = match &record.link {
            Some(link) => format!("<a href=\"{}\">{}</a>", escape(link.as_str()), escape(&record.title)),
            None => escape(&record.title),
        };
        let _ = writeln!(
            html,
            "<tr><td>{title}</td><td>{}</td><td>{}</td></tr>",
            escape(record.location_text.as_deref().unwrap_or_default()),
            escape(&display_date(record)),
        );
    }
    html.push_str("</table>\n");

    if !report.failures.is_empty() {
        html.push_str("<p>These searches failed and are missing from the results:</p>\n<ul>\n");
        for failure in report.failures {
            let _ = writeln!(html, "<li>{}: {}</li>", escape(&failure.query), escape(&failure.reason));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("<p>This is an automated message.</p>\n</body>\n</html>\n");
    html
}


fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;

    #[test]
    fn settings_need_user_and_password() {
        let host = "smtp.gmail.com".to_string();
        assert!(EmailSettings::new(Some("me@example.com".into()), None, None, host.clone()).is_none());
        assert!(EmailSettings::new(Some(String::new()), Some("pw".into()), None, host.clone()).is_none());

        let settings = EmailSettings::new(Some("me@example.com".into()), Some("pw".into()), None, host).unwrap();
        assert_eq!(settings.to, "me@example.com");
    }

    #[test]
    fn html_lists_records_and_failures_escaped() {
        let records = fixtures::records();
        let failures = fixtures::failures();
        let report = Report { title: "Akraya Job Alert", records: &records, recency_days: 30, failures: &failures };

        let html = render_html(&report);

        assert!(html.contains("<h2>Akraya Job Alert</h2>"));
        assert!(html.contains("<p>Found 2 jobs posted in the last 30 days:</p>"));
        assert!(html.contains(
            "<tr><td><a href=\"https://jobs.akraya.com/index.smpl?postid=1\">Embedded Engineer</a></td><td>San Diego, CA</td><td>2025-03-14</td></tr>"
        ));
        assert!(html.contains("<td>Data &lt;Analyst&gt; &amp; Modeler</td>"));
        assert!(html.contains("<li>Irvine, CA: timed out after 10s waiting for results</li>"));
    }

    #[test]
    fn subject_follows_the_recency_window_and_failures() {
        let records = fixtures::records();
        let report = Report { title: "Job Alert", records: &records, recency_days: 30, failures: &[] };
        assert_eq!(subject(&report), "Job Alert - Found 2 jobs posted in the last 30 days");

        let report = Report { recency_days: 0, ..report };
        assert_eq!(subject(&report), "Job Alert - Found 2 jobs");

        let failures = fixtures::failures();
        let report = Report { records: &[], failures: &failures, ..report };
        assert_eq!(subject(&report), "Job Alert - Found 0 jobs (1 search failed)");
    }
}
