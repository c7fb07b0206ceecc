use std::{io, path::PathBuf};

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{
    config::Config,
    report::{CsvReporter, EmailReporter, EmailSettings, Report, Reporter, TextReporter},
    runner::{QueryRunner, QueryStatus, RunOutcome},
    session::{ChromeSession, PageSession, SessionGuard, SnapshotSession},
    stabilizer::Stabilizer,
};

mod config;
mod extractor;
mod models;
mod page_scrapers;
mod pipeline;
mod report;
mod runner;
mod session;
mod stabilizer;
#[cfg(test)]
mod testing;


#[derive(Parser)]
#[command(name = "job-alert", about = "Scrapes recent job listings from dynamic search pages and reports them")]
struct Cli {
    /// Path to config TOML file
    #[arg(long, default_value = "job-alert.toml")]
    config: PathBuf,
    /// Search for this instead of the queries in the config file (repeatable)
    #[arg(long = "query")]
    queries: Vec<String>,
    /// Scrape a saved, already rendered results page instead of launching a browser
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Also write the listings to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Email the listings
    #[arg(long)]
    email: bool,
    /// Show the browser window
    #[arg(long)]
    headful: bool,
    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,
    #[arg(long, env = "EMAIL_USER")]
    email_user: Option<String>,
    #[arg(long, env = "EMAIL_PASS", hide_env_values = true)]
    email_pass: Option<String>,
    /// Defaults to the sending account
    #[arg(long, env = "EMAIL_TO")]
    email_to: Option<String>,
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    smtp_host: String,
}


fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}


/// Runs every query on a session that is closed again however the run ends
fn scrape<S: PageSession>(session: S, runner: &QueryRunner, queries: &[String]) -> RunOutcome {
    let session = SessionGuard::new(session);
    runner.run(&*session, queries)
}


fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config = Config::load(&cli.config)?;
    if !cli.queries.is_empty() {
        config.queries = cli.queries.clone();
    }
    if cli.headful {
        config.browser.headless = false;
    }
    config.check()?;

    let layout = config.site_layout()?;
    tracing::info!(config = %cli.config.display(), entry = %layout.entry_url, queries = config.queries.len(), "starting job alert");
    let runner = QueryRunner::new(layout, Stabilizer::new(config.stabilizer.settings()));

    let outcome = match &cli.snapshot {
        Some(path) => scrape(SnapshotSession::from_file(path)?, &runner, &config.queries),
        None => {
            let session = ChromeSession::launch(&config.browser).context("Could not start a browser session")?;
            scrape(session, &runner, &config.queries)
        }
    };

    for result in outcome.results() {
        match &result.status {
            QueryStatus::Succeeded { items, skipped } => {
                tracing::info!(query = %result.query, items, skipped, "query finished")
            }
            QueryStatus::NoResults => tracing::info!(query = %result.query, "query had no results"),
            QueryStatus::Failed { reason } => {
                tracing::warn!(query = %result.query, %reason, "query produced no listings")
            }
        }
    }
    let failures = outcome.failures();

    let records = pipeline::process(outcome.into_per_query(), &config.filter_options(), Local::now().date_naive());
    let report = Report {
        title: &config.report.title,
        records: &records,
        recency_days: config.filters.recency_days,
        failures: &failures,
    };
    if report.is_empty() {
        tracing::info!("no listings matched the location, date and exclusion filters");
        return Ok(());
    }

    let mut reporters: Vec<Box<dyn Reporter>> = vec![Box::new(TextReporter::new(io::stdout()))];
    if let Some(path) = cli.csv.clone().or_else(|| config.report.csv.clone()) {
        reporters.push(Box::new(CsvReporter::new(path)));
    }
    if cli.email || config.report.email {
        match EmailSettings::new(cli.email_user, cli.email_pass, cli.email_to, cli.smtp_host) {
            Some(settings) => reporters.push(Box::new(EmailReporter::new(settings))),
            None => tracing::warn!("EMAIL_USER and EMAIL_PASS are not set, skipping email"),
        }
    }

    for reporter in &mut reporters {
        if let Err(e) = reporter.deliver(&report) {
            tracing::error!(reporter = reporter.name(), error = %format!("{e:#}"), "failed to deliver report");
        }
    }

    Ok(())
}
