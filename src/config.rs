use std::{path::{Path, PathBuf}, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use url::Url;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    page_scrapers::{self, SelectorSet, SiteLayout, PRESETS},
    pipeline::FilterOptions,
    stabilizer::{StabilizerSettings, Submission},
};


#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("unknown layout preset `{0}` (available: {presets})", presets = PRESETS.join(", "))]
    UnknownPreset(String),
    #[error("the `{0}` preset has no default entry URL; set `site.entry_url`")]
    MissingEntryUrl(&'static str),
    #[error("a custom site needs `{0}` when no preset is named")]
    IncompleteSite(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationErrors),
}


fn default_true() -> bool {
    true
}

fn default_exclude() -> Vec<String> {
    vec!["remote".to_string()]
}

fn default_recency_days() -> u32 {
    30
}

fn default_marker_timeout_secs() -> u64 {
    10
}

fn default_settle_interval_ms() -> u64 {
    2000
}

fn default_max_settle_iterations() -> u32 {
    5
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_report_title() -> String {
    "Job Alert".to_string()
}


fn no_blank_queries(queries: &Vec<String>) -> Result<(), ValidationError> {
    if queries.iter().any(|query| query.trim().is_empty()) {
        return Err(ValidationError::new("blank_query"));
    }
    Ok(())
}


/// A blank term is a substring of every location, so it would match everything
fn no_blank_terms(terms: &Vec<String>) -> Result<(), ValidationError> {
    if terms.iter().any(|term| term.trim().is_empty()) {
        return Err(ValidationError::new("blank_term"));
    }
    Ok(())
}


/// Settings loaded from `job-alert.toml`.
///
/// Email credentials are not part of the file; they come from the environment.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// Searched in this order, one at a time
    #[validate(length(min = 1), custom = "no_blank_queries")]
    pub(crate) queries: Vec<String>,
    pub(crate) site: SiteConfig,
    #[serde(default)]
    #[validate]
    pub(crate) filters: FilterConfig,
    #[serde(default)]
    #[validate]
    pub(crate) stabilizer: StabilizerConfig,
    #[serde(default)]
    #[validate]
    pub(crate) browser: BrowserConfig,
    #[serde(default)]
    pub(crate) report: ReportConfig,
}


/// Which board to scrape.
///
/// Either names a bundled preset, optionally overriding parts of it, or spells out a whole
/// custom layout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SiteConfig {
    pub(crate) preset: Option<String>,
    pub(crate) entry_url: Option<Url>,
    pub(crate) selectors: Option<SelectorSet>,
    pub(crate) submission: Option<Submission>,
    pub(crate) infinite_scroll: Option<bool>,
}


#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub(crate) struct FilterConfig {
    #[serde(default)]
    #[validate(custom = "no_blank_terms")]
    pub(crate) locations: Vec<String>,
    /// Also keep listings located in the city of any query ("San Diego" for "San Diego, CA")
    #[serde(default)]
    pub(crate) derive_locations_from_queries: bool,
    #[serde(default = "default_exclude")]
    #[validate(custom = "no_blank_terms")]
    pub(crate) exclude: Vec<String>,
    /// 0 keeps listings of any age, including undated ones
    #[serde(default = "default_recency_days")]
    #[validate(range(max = 3650))]
    pub(crate) recency_days: u32,
}


impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            locations: Vec::new(),
            derive_locations_from_queries: false,
            exclude: default_exclude(),
            recency_days: default_recency_days(),
        }
    }
}


#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub(crate) struct StabilizerConfig {
    #[serde(default = "default_marker_timeout_secs")]
    #[validate(range(min = 1, max = 600))]
    pub(crate) marker_timeout_secs: u64,
    #[serde(default = "default_settle_interval_ms")]
    #[validate(range(max = 60000))]
    pub(crate) settle_interval_ms: u64,
    #[serde(default = "default_max_settle_iterations")]
    #[validate(range(min = 1, max = 100))]
    pub(crate) max_settle_iterations: u32,
    /// Replaces the layout's own render delay
    #[serde(default)]
    #[validate(range(max = 60000))]
    pub(crate) render_delay_ms: Option<u64>,
}


impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            marker_timeout_secs: default_marker_timeout_secs(),
            settle_interval_ms: default_settle_interval_ms(),
            max_settle_iterations: default_max_settle_iterations(),
            render_delay_ms: None,
        }
    }
}


impl StabilizerConfig {
    pub(crate) fn settings(&self) -> StabilizerSettings {
        StabilizerSettings {
            marker_timeout: Duration::from_secs(self.marker_timeout_secs),
            settle_interval: Duration::from_millis(self.settle_interval_ms),
            max_settle_iterations: self.max_settle_iterations,
        }
    }
}


#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub(crate) struct BrowserConfig {
    #[serde(default = "default_true")]
    pub(crate) headless: bool,
    #[serde(default = "default_window_width")]
    #[validate(range(min = 320, max = 7680))]
    pub(crate) window_width: u32,
    #[serde(default = "default_window_height")]
    #[validate(range(min = 240, max = 4320))]
    pub(crate) window_height: u32,
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
}


impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: None,
        }
    }
}


#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ReportConfig {
    #[serde(default = "default_report_title")]
    pub(crate) title: String,
    /// Also write the listings to this CSV file
    #[serde(default)]
    pub(crate) csv: Option<PathBuf>,
    /// Email the listings as an HTML table
    #[serde(default)]
    pub(crate) email: bool,
}


impl Default for ReportConfig {
    fn default() -> Self {
        Self { title: default_report_title(), csv: None, email: false }
    }
}


impl Config {
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Validates the settings; run after command line overrides have been applied
    pub(crate) fn check(&self) -> Result<(), ConfigError> {
        self.validate()?;
        Ok(())
    }

    pub(crate) fn site_layout(&self) -> Result<SiteLayout, ConfigError> {
        let site = &self.site;
        let mut layout = match &site.preset {
            Some(name) => page_scrapers::preset(name, site.entry_url.clone())
                .ok_or_else(|| ConfigError::UnknownPreset(name.clone()))?
                .map_err(ConfigError::MissingEntryUrl)?,
            None => SiteLayout {
                entry_url: site.entry_url.clone().ok_or(ConfigError::IncompleteSite("entry_url"))?,
                selectors: site.selectors.clone().ok_or(ConfigError::IncompleteSite("selectors"))?,
                submission: site.submission.clone().ok_or(ConfigError::IncompleteSite("submission"))?,
                infinite_scroll: false,
                render_delay: Duration::ZERO,
            },
        };

        if site.preset.is_some() {
            if let Some(selectors) = &site.selectors {
                layout.selectors = selectors.clone();
            }
            if let Some(submission) = &site.submission {
                layout.submission = submission.clone();
            }
        }
        if let Some(infinite_scroll) = site.infinite_scroll {
            layout.infinite_scroll = infinite_scroll;
        }
        if let Some(render_delay_ms) = self.stabilizer.render_delay_ms {
            layout.render_delay = Duration::from_millis(render_delay_ms);
        }
        Ok(layout)
    }

    pub(crate) fn filter_options(&self) -> FilterOptions {
        let mut locations = self.filters.locations.clone();
        if self.filters.derive_locations_from_queries {
            for query in &self.queries {
                let city = query.split(',').next().unwrap_or_default().trim();
                if !city.is_empty() && !locations.iter().any(|location| location.eq_ignore_ascii_case(city)) {
                    locations.push(city.to_string());
                }
            }
        }

        FilterOptions {
            locations,
            exclude: self.filters.exclude.clone(),
            recency_days: self.filters.recency_days,
        }
    }
}
