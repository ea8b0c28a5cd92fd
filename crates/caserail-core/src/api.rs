//! TestRail API seam
//!
//! [`TestRailApi`] is the boundary between the synchronizer and the remote
//! service. [`crate::client::HttpTestRail`] talks to a real instance; tests
//! plug in an in-memory implementation.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CustomFieldFilter;
use crate::error::Result;
use crate::results::CaseResult;

/// Project or suite metadata, used for the default run title
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectInfo {
    /// Entity id
    #[serde(default)]
    pub id: Option<u64>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
}

/// Test case definition
#[derive(Debug, Clone, Deserialize)]
pub struct Case {
    /// Case id
    pub id: u64,

    /// Case type id
    #[serde(default)]
    pub type_id: Option<u64>,

    /// Every other field, including `custom_*` fields
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

impl Case {
    /// Whether the case passes a custom field filter.
    ///
    /// Strings compare directly; numbers and booleans compare by their
    /// display form; arrays compare as their comma-joined elements. Missing
    /// fields and nulls never match.
    pub fn matches_field(&self, filter: &CustomFieldFilter) -> bool {
        let value = match filter.key.as_str() {
            "id" => return self.id.to_string() == filter.value,
            "type_id" => return self.type_id.map(|t| t.to_string()) == Some(filter.value.clone()),
            key => self.fields.get(key),
        };
        value
            .and_then(display_value)
            .is_some_and(|shown| shown == filter.value)
    }
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Option<Vec<String>> = items.iter().map(display_value).collect();
            parts.map(|p| p.join(","))
        }
        Value::Null | Value::Object(_) => None,
    }
}

/// Case type (e.g. "Automated", "Functionality")
#[derive(Debug, Clone, Deserialize)]
pub struct CaseType {
    /// Type id
    pub id: u64,
    /// Type name
    pub name: String,
}

impl CaseType {
    /// Decode a `get_case_types` response.
    ///
    /// Anything other than an array (an `{"error": ..}` body for a user
    /// without access, say) yields no types, so the type filter is skipped.
    pub fn list_from_value(value: Value) -> serde_json::Result<Vec<Self>> {
        match value {
            Value::Array(_) => serde_json::from_value(value),
            other => {
                tracing::debug!("Case types unavailable, skipping type filter: {}", other);
                Ok(Vec::new())
            }
        }
    }
}

/// A case instantiated inside a run
#[derive(Debug, Clone, Deserialize)]
pub struct Test {
    /// Test id
    #[serde(default)]
    pub id: Option<u64>,
    /// Case the test was created from
    pub case_id: u64,
}

/// A test run
#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    /// Run id
    pub id: u64,
    /// Browser URL, when the API reports one
    #[serde(default)]
    pub url: Option<String>,
}

/// Body of `add_run`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRun {
    /// Run title
    pub name: String,

    /// Suite the run belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite_id: Option<u64>,

    /// Include every case of the suite/project
    pub include_all: bool,

    /// Explicit case selection when `include_all` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_ids: Option<Vec<u64>>,
}

impl NewRun {
    /// Run limited to the given cases
    pub fn with_cases(name: impl Into<String>, suite_id: Option<u64>, case_ids: Vec<u64>) -> Self {
        Self {
            name: name.into(),
            suite_id,
            include_all: false,
            case_ids: Some(case_ids),
        }
    }

    /// Run containing every case
    pub fn include_all(name: impl Into<String>, suite_id: Option<u64>) -> Self {
        Self {
            name: name.into(),
            suite_id,
            include_all: true,
            case_ids: None,
        }
    }
}

/// One page of a list endpoint
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Opaque link to the next page (`_links.next`)
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// A last page
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

impl<T: DeserializeOwned> Page<T> {
    /// Decode a list response.
    ///
    /// Newer API versions wrap items in an object under `key` with
    /// `_links.next`; older ones return a bare array, which is treated as a
    /// single page.
    pub fn from_value(value: Value, key: &str) -> serde_json::Result<Self> {
        match value {
            Value::Array(_) => Ok(Self::last(serde_json::from_value(value)?)),
            Value::Object(mut map) => {
                let next = map
                    .get("_links")
                    .and_then(|links| links.get("next"))
                    .and_then(Value::as_str)
                    .filter(|link| !link.is_empty())
                    .map(str::to_string);
                let items = map.remove(key).unwrap_or(Value::Array(Vec::new()));
                Ok(Self {
                    items: serde_json::from_value(items)?,
                    next,
                })
            }
            other => Ok(Self::last(serde_json::from_value(other)?)),
        }
    }
}

/// Operations the synchronizer needs from TestRail
#[async_trait]
pub trait TestRailApi: Send + Sync {
    /// `get_project/{project_id}`
    async fn get_project(&self, project_id: u64) -> Result<ProjectInfo>;

    /// `get_suite/{suite_id}`
    async fn get_suite(&self, suite_id: u64) -> Result<ProjectInfo>;

    /// `get_cases/{project_id}[&suite_id=..]`, or the page behind `next`
    async fn get_cases(
        &self,
        project_id: u64,
        suite_id: Option<u64>,
        next: Option<&str>,
    ) -> Result<Page<Case>>;

    /// `get_case_types`
    async fn get_case_types(&self) -> Result<Vec<CaseType>>;

    /// `add_run/{project_id}`
    async fn add_run(&self, project_id: u64, run: &NewRun) -> Result<Run>;

    /// `get_tests/{run_id}`, or the page behind `next`
    async fn get_tests(&self, run_id: u64, next: Option<&str>) -> Result<Page<Test>>;

    /// `add_results_for_cases/{run_id}`
    async fn add_results_for_cases(&self, run_id: u64, results: &[CaseResult]) -> Result<()>;

    /// `close_run/{run_id}`
    async fn close_run(&self, run_id: u64) -> Result<()>;
}
