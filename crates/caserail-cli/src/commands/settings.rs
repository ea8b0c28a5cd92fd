//! Reporter settings from flags, environment and config file
//!
//! Precedence, highest first: command-line flag, `TESTRAIL_*` environment
//! variable, config file value, built-in default.

use anyhow::{Context, Result, bail};
use caserail_core::{EmptyFilterPolicy, ReporterConfig};
use clap::Args;
use std::convert::Infallible;
use std::path::Path;

/// TestRail connection and filtering options
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// TestRail host, e.g. example.testrail.io
    #[arg(long, env = "TESTRAIL_DOMAIN")]
    pub domain: Option<String>,

    /// TestRail user
    #[arg(long, env = "TESTRAIL_USERNAME")]
    pub username: Option<String>,

    /// TestRail API key
    #[arg(long, env = "TESTRAIL_APIKEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Project id
    #[arg(long, env = "TESTRAIL_PROJECTID")]
    pub project_id: Option<u64>,

    /// Suite id
    #[arg(long, env = "TESTRAIL_SUITEID")]
    pub suite_id: Option<u64>,

    /// Only put cases of this type into a new run
    #[arg(long, env = "TESTRAIL_TYPE")]
    pub case_type: Option<String>,

    /// `key:value` filter on case fields for a new run
    #[arg(long, env = "TESTRAIL_CUSTOM")]
    pub custom_filter: Option<String>,

    /// Run title
    #[arg(long, env = "TESTRAIL_TITLE")]
    pub title: Option<String>,

    /// Close the run when every submitted result passed. From the
    /// environment only the exact value `true` enables it.
    #[arg(long, env = "TESTRAIL_CLOSE_RUN", value_parser = parse_close_run)]
    pub close_run: bool,

    /// Submit into an existing run
    #[arg(long, env = "TESTRAIL_RUNID")]
    pub run_id: Option<u64>,

    /// Letter prefix of case identifiers
    #[arg(long)]
    pub case_prefix: Option<String>,

    /// Read only the first page of list endpoints
    #[arg(long)]
    pub no_paginate: bool,

    /// Submit results even for cases that are not in the run
    #[arg(long)]
    pub no_restrict_to_run: bool,

    /// What to do when filtering leaves no case for a new run (include_all, fail)
    #[arg(long)]
    pub empty_filter: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl SettingsArgs {
    /// Build the reporter configuration
    pub fn resolve(&self, config_path: Option<&Path>) -> Result<ReporterConfig> {
        let mut config = match config_path {
            Some(path) => ReporterConfig::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => {
                let Some(project_id) = self.project_id else {
                    bail!("missing project id (use --project-id, TESTRAIL_PROJECTID or --config)");
                };
                ReporterConfig::new("", "", "", project_id)
            }
        };

        if let Some(domain) = &self.domain {
            config.domain = domain.clone();
        }
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(project_id) = self.project_id {
            config.project_id = project_id;
        }
        if self.suite_id.is_some() {
            config.suite_id = self.suite_id;
        }
        if self.case_type.is_some() {
            config.case_type = self.case_type.clone();
        }
        if self.custom_filter.is_some() {
            config.custom_filter = self.custom_filter.clone();
        }
        if self.title.is_some() {
            config.title = self.title.clone();
        }
        if self.run_id.is_some() {
            config.run_id = self.run_id;
        }
        if let Some(prefix) = &self.case_prefix {
            config.case_prefix = prefix.clone();
        }
        if let Some(policy) = &self.empty_filter {
            config.empty_filter = policy.parse::<EmptyFilterPolicy>()?;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        config.close_run |= self.close_run;
        config.paginate &= !self.no_paginate;
        config.restrict_to_run &= !self.no_restrict_to_run;

        config.validate().context(
            "Invalid configuration (set it in the config file, with flags, or via TESTRAIL_* variables)",
        )?;
        Ok(config)
    }
}

/// `TESTRAIL_CLOSE_RUN` is on only for the exact string `true`
fn parse_close_run(value: &str) -> Result<bool, Infallible> {
    Ok(value == "true")
}
