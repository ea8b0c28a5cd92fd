//! Print case results found in runner events

use anyhow::{Context, Result};
use caserail_core::results::CaseMatcher;
use caserail_core::{CaseResult, ResultCollector, RunnerEvent};

use super::input::InputArgs;

/// Run the scan command
pub async fn run(input: &InputArgs, case_prefix: &str) -> Result<()> {
    let collector = collect_results(input.read_events()?, case_prefix)?;

    if collector.is_empty() {
        tracing::warn!("No case identifiers found");
    }
    print_results(collector.results())
}

/// Collect results from events up to the first done event
pub fn collect_results(events: Vec<RunnerEvent>, case_prefix: &str) -> Result<ResultCollector> {
    let matcher = CaseMatcher::new(case_prefix).context("Invalid case prefix")?;
    let mut collector = ResultCollector::new(matcher);

    for event in events {
        match event {
            RunnerEvent::Assertion(a) => {
                let error = a.error.as_ref().map(|e| e.message.as_str());
                collector.record_assertion(&a.assertion, &a.item, error);
            }
            RunnerEvent::Done => break,
        }
    }
    Ok(collector)
}

/// Print results as JSON Lines in the `add_results_for_cases` shape
pub fn print_results(results: &[CaseResult]) -> Result<()> {
    for result in results {
        println!("{}", serde_json::to_string(result)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use caserail_core::CaseStatus;

    #[test]
    fn test_collect_results_stops_at_done() {
        let events = vec![
            RunnerEvent::assertion("C1 ok", "", None),
            RunnerEvent::assertion("C1 body", "", Some("boom")),
            RunnerEvent::Done,
            RunnerEvent::assertion("C2 late", "", None),
        ];

        let collector = collect_results(events, "C").unwrap();

        assert_eq!(collector.len(), 1);
        assert_eq!(collector.results()[0].status, CaseStatus::Failed);
    }

    #[test]
    fn test_collect_results_rejects_bad_prefix() {
        assert!(collect_results(Vec::new(), "9").is_err());
    }
}
