//! Case result collection
//!
//! Assertion text is scanned for case identifiers (`C123` by default) and each
//! hit becomes a [`CaseResult`]. Results are unique per case id; a failure is
//! sticky, so a later pass for the same case never hides an earlier failure.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

static DEFAULT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bC(\d+)\b").expect("default case pattern is valid"));

/// Outcome of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStatus {
    /// Every assertion referencing the case passed
    Passed,
    /// At least one assertion referencing the case failed
    Failed,
}

impl CaseStatus {
    /// TestRail status id (`1` passed, `5` failed)
    pub fn status_id(self) -> u8 {
        match self {
            CaseStatus::Passed => 1,
            CaseStatus::Failed => 5,
        }
    }

    /// Whether this is a failure
    pub fn is_failed(self) -> bool {
        self == CaseStatus::Failed
    }
}

impl Serialize for CaseStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.status_id())
    }
}

/// Result for a single case, serialized in the shape `add_results_for_cases`
/// expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseResult {
    /// Numeric case id (the digits after the prefix)
    pub case_id: u64,

    /// Outcome
    #[serde(rename = "status_id")]
    pub status: CaseStatus,

    /// Failure summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl CaseResult {
    /// A passed result
    pub fn passed(case_id: u64) -> Self {
        Self {
            case_id,
            status: CaseStatus::Passed,
            comment: None,
        }
    }

    /// A failed result with a comment
    pub fn failed(case_id: u64, comment: impl Into<String>) -> Self {
        Self {
            case_id,
            status: CaseStatus::Failed,
            comment: Some(comment.into()),
        }
    }
}

/// Finds case identifiers in free text
#[derive(Debug, Clone)]
pub struct CaseMatcher {
    pattern: Regex,
}

impl Default for CaseMatcher {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

impl CaseMatcher {
    /// Build a matcher for identifiers of the form `<prefix><digits>`
    pub fn new(prefix: &str) -> Result<Self> {
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::ConfigInvalid {
                message: format!("case prefix '{}' must be one or more ASCII letters", prefix),
            });
        }
        let pattern = format!(r"\b{}(\d+)\b", regex::escape(prefix));
        let pattern = Regex::new(&pattern).map_err(|e| Error::ConfigInvalid {
            message: format!("invalid case prefix '{}': {}", prefix, e),
        })?;
        Ok(Self { pattern })
    }

    /// Case ids referenced by `text`, in order of appearance.
    ///
    /// Text is split on whitespace and only the first identifier in each
    /// token counts. Matches are whole words: `(C12)` yields 12, `ABC12`
    /// yields nothing.
    pub fn case_ids<'a>(&'a self, text: &'a str) -> impl Iterator<Item = u64> + 'a {
        text.split_whitespace().filter_map(move |token| {
            let digits = self.pattern.captures(token)?.get(1)?.as_str();
            match digits.parse::<u64>() {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!("Ignoring case reference '{}': {}", token, e);
                    None
                }
            }
        })
    }
}

/// Accumulates case results over a run
#[derive(Debug, Default)]
pub struct ResultCollector {
    matcher: CaseMatcher,
    results: Vec<CaseResult>,
}

impl ResultCollector {
    /// Create a collector using the given matcher
    pub fn new(matcher: CaseMatcher) -> Self {
        Self {
            matcher,
            results: Vec::new(),
        }
    }

    /// Record one assertion.
    ///
    /// Identifiers are taken from the assertion text first, then from the
    /// enclosing item name. `error` is the failure message, if the assertion
    /// failed. Returns how many identifier hits were merged.
    pub fn record_assertion(&mut self, assertion: &str, item: &str, error: Option<&str>) -> usize {
        let mut ids: Vec<u64> = self.matcher.case_ids(assertion).collect();
        ids.extend(self.matcher.case_ids(item));

        for &case_id in &ids {
            let result = match error {
                Some(message) => CaseResult::failed(
                    case_id,
                    format!("Test failed: {} => {}", assertion, message),
                ),
                None => CaseResult::passed(case_id),
            };
            self.merge(result);
        }
        ids.len()
    }

    /// Merge a result: new ids are appended, a failure replaces a stored
    /// non-failure, anything else is dropped.
    pub fn merge(&mut self, result: CaseResult) {
        match self.results.iter_mut().find(|r| r.case_id == result.case_id) {
            Some(existing) => {
                if result.status.is_failed() && !existing.status.is_failed() {
                    *existing = result;
                }
            }
            None => self.results.push(result),
        }
    }

    /// Results collected so far, in first-seen order
    pub fn results(&self) -> &[CaseResult] {
        &self.results
    }

    /// Number of distinct cases seen
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no case was referenced yet
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Drain the collected results, leaving the collector empty
    pub fn take(&mut self) -> Vec<CaseResult> {
        std::mem::take(&mut self.results)
    }
}
