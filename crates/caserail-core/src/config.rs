//! Reporter configuration
//!
//! Every option the reporter understands lives on [`ReporterConfig`], which is
//! passed into the synchronizer at construction. Nothing in this crate reads
//! the process environment; the CLI layers flags and `TESTRAIL_*` variables
//! over an optional YAML file and hands the result in.
//!
//! # Example file
//!
//! ```yaml
//! domain: example.testrail.io
//! username: ci@example.com
//! api_key: s3cret
//! project_id: 7
//! suite_id: 12
//! case_type: Automated
//! custom_filter: "custom_platform:api"
//! close_run: true
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::results::CaseMatcher;

/// Options for one reporter instance
#[derive(Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// TestRail host, e.g. `example.testrail.io`. A value that already carries
    /// an `http://` or `https://` scheme is used as the base URL verbatim.
    pub domain: String,

    /// Basic-auth user name
    pub username: String,

    /// Basic-auth API key. Never serialized or printed.
    #[serde(skip_serializing, default)]
    pub api_key: String,

    /// Project the run belongs to
    pub project_id: u64,

    /// Restrict case lookup and run creation to this suite
    #[serde(default)]
    pub suite_id: Option<u64>,

    /// Only include cases of this case type (matched by exact name)
    #[serde(default)]
    pub case_type: Option<String>,

    /// `key:value` filter applied to case fields
    #[serde(default)]
    pub custom_filter: Option<String>,

    /// Run title override
    #[serde(default)]
    pub title: Option<String>,

    /// Close the run when no submitted result failed
    #[serde(default)]
    pub close_run: bool,

    /// Submit into this existing run instead of creating one
    #[serde(default)]
    pub run_id: Option<u64>,

    /// Letter prefix of case identifiers in assertion text
    #[serde(default = "default_case_prefix")]
    pub case_prefix: String,

    /// Follow `_links.next` on list endpoints
    #[serde(default = "default_true")]
    pub paginate: bool,

    /// Drop results for cases that are not part of the run before submitting
    #[serde(default = "default_true")]
    pub restrict_to_run: bool,

    /// What to do when case filtering leaves nothing to put in a new run
    #[serde(default)]
    pub empty_filter: EmptyFilterPolicy,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_case_prefix() -> String {
    "C".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

/// Run creation policy when type/custom-field filtering matches no case
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmptyFilterPolicy {
    /// Create the run with every case of the project/suite
    #[default]
    IncludeAll,
    /// Abort synchronization
    Fail,
}

impl std::str::FromStr for EmptyFilterPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "include_all" | "include-all" => Ok(Self::IncludeAll),
            "fail" => Ok(Self::Fail),
            other => Err(Error::ConfigInvalid {
                message: format!(
                    "unknown empty filter policy '{}' (expected include_all or fail)",
                    other
                ),
            }),
        }
    }
}

/// Parsed `key:value` custom field filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFieldFilter {
    /// Case field name, e.g. `custom_platform`
    pub key: String,
    /// Expected value in display form
    pub value: String,
}

impl CustomFieldFilter {
    /// Parse `key:value`. Returns `None` for anything without a colon or with
    /// an empty key, which leaves the filter unapplied.
    pub fn parse(raw: &str) -> Option<Self> {
        let (key, value) = raw.split_once(':')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self {
            key: key.to_string(),
            value: value.trim().to_string(),
        })
    }
}

impl ReporterConfig {
    /// Create a configuration with the required settings and defaults for
    /// everything else
    pub fn new(
        domain: impl Into<String>,
        username: impl Into<String>,
        api_key: impl Into<String>,
        project_id: u64,
    ) -> Self {
        Self {
            domain: domain.into(),
            username: username.into(),
            api_key: api_key.into(),
            project_id,
            suite_id: None,
            case_type: None,
            custom_filter: None,
            title: None,
            close_run: false,
            run_id: None,
            case_prefix: default_case_prefix(),
            paginate: true,
            restrict_to_run: true,
            empty_filter: EmptyFilterPolicy::default(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let config: ReporterConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("domain", &self.domain),
            ("username", &self.username),
            ("api_key", &self.api_key),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::ConfigInvalid {
                    message: format!("'{}' must not be empty", name),
                });
            }
        }

        CaseMatcher::new(&self.case_prefix)?;
        Ok(())
    }

    /// Base URL of the TestRail instance, without a trailing slash
    pub fn base_url(&self) -> String {
        let domain = self.domain.trim().trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{}", domain)
        }
    }

    /// Browser URL of a run
    pub fn run_url(&self, run_id: u64) -> String {
        format!("{}/index.php?/runs/view/{}", self.base_url(), run_id)
    }

    /// Parsed custom field filter, if one is configured and well-formed
    pub fn custom_field_filter(&self) -> Option<CustomFieldFilter> {
        self.custom_filter.as_deref().and_then(CustomFieldFilter::parse)
    }
}

impl fmt::Debug for ReporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterConfig")
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .field("project_id", &self.project_id)
            .field("suite_id", &self.suite_id)
            .field("case_type", &self.case_type)
            .field("custom_filter", &self.custom_filter)
            .field("title", &self.title)
            .field("close_run", &self.close_run)
            .field("run_id", &self.run_id)
            .field("case_prefix", &self.case_prefix)
            .field("paginate", &self.paginate)
            .field("restrict_to_run", &self.restrict_to_run)
            .field("empty_filter", &self.empty_filter)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
