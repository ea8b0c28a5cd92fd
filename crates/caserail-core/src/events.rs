//! Test runner events
//!
//! The reporter reacts to two events: an assertion finished, and the run is
//! done. They can be produced in-process, read from a JSON Lines stream, or
//! replayed from a Newman JSON report.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lifecycle event from the host test runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunnerEvent {
    /// An assertion was evaluated
    Assertion(AssertionEvent),
    /// No more assertions will arrive
    Done,
}

impl RunnerEvent {
    /// Shorthand for an assertion event
    pub fn assertion(
        assertion: impl Into<String>,
        item: impl Into<String>,
        error: Option<&str>,
    ) -> Self {
        RunnerEvent::Assertion(AssertionEvent {
            assertion: assertion.into(),
            item: item.into(),
            error: error.map(|message| AssertionError {
                message: message.to_string(),
            }),
        })
    }
}

/// A single evaluated assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionEvent {
    /// Assertion description, e.g. `Status code is 200 (C12)`
    pub assertion: String,

    /// Name of the enclosing test item (request)
    #[serde(default)]
    pub item: String,

    /// Present when the assertion failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AssertionError>,
}

/// Failure details of an assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionError {
    /// Human readable failure message
    #[serde(default)]
    pub message: String,
}

/// Parse a JSON Lines event stream. Blank lines are skipped.
pub fn parse_event_lines(input: &str) -> Result<Vec<RunnerEvent>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line.trim()).map_err(|e| Error::InvalidEvent {
                line: index + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

#[derive(Deserialize)]
struct NewmanReport {
    run: NewmanRun,
}

#[derive(Deserialize)]
struct NewmanRun {
    #[serde(default)]
    executions: Vec<NewmanExecution>,
}

#[derive(Deserialize)]
struct NewmanExecution {
    #[serde(default)]
    item: NewmanItem,
    #[serde(default)]
    assertions: Vec<NewmanAssertion>,
}

#[derive(Deserialize, Default)]
struct NewmanItem {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct NewmanAssertion {
    assertion: String,
    #[serde(default)]
    error: Option<AssertionError>,
}

/// Replay a Newman JSON report (`newman run --reporters json`) as runner
/// events, ending with [`RunnerEvent::Done`]
pub fn parse_newman_report(input: &str) -> Result<Vec<RunnerEvent>> {
    let report: NewmanReport = serde_json::from_str(input)?;

    let mut events: Vec<RunnerEvent> = report
        .run
        .executions
        .into_iter()
        .flat_map(|execution| {
            let item = execution.item.name;
            execution.assertions.into_iter().map(move |a| {
                RunnerEvent::Assertion(AssertionEvent {
                    assertion: a.assertion,
                    item: item.clone(),
                    error: a.error,
                })
            })
        })
        .collect();
    events.push(RunnerEvent::Done);
    Ok(events)
}
