//! Run synchronization
//!
//! Takes the results collected during a test run and reconciles them with
//! TestRail:
//!
//! ```text
//! title ─▶ cases ─▶ type/custom filter ─▶ add_run ─▶ run tests ─▶ add_results ─▶ close_run
//! └──────────── skipped when a run id is configured ───────────┘
//! ```
//!
//! Steps run strictly in order and nothing is retried. Non-2xx responses are
//! logged by the client and do not stop the sequence.

use std::collections::HashSet;

use crate::api::{Case, CaseType, NewRun, TestRailApi};
use crate::config::{EmptyFilterPolicy, ReporterConfig};
use crate::error::{Error, Result};
use crate::results::CaseResult;

/// Suffix of the default run title
pub const DEFAULT_TITLE_SUFFIX: &str = "Automated Test Run";

/// What a synchronization did
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Run the results went into
    pub run_id: u64,

    /// Browser URL of the run
    pub run_url: String,

    /// Whether the run was created by this synchronization
    pub created: bool,

    /// Results sent to `add_results_for_cases`
    pub submitted: Vec<CaseResult>,

    /// Results dropped because their case is not part of the run
    pub excluded: Vec<CaseResult>,

    /// Whether the run was closed
    pub closed: bool,
}

/// Keep cases matching the configured case type and custom field filter.
///
/// An unknown type name or a malformed custom filter leaves the list as is.
pub fn filter_cases(
    mut cases: Vec<Case>,
    case_types: &[CaseType],
    config: &ReporterConfig,
) -> Vec<Case> {
    if let Some(type_name) = config.case_type.as_deref() {
        match case_types.iter().find(|t| t.name == type_name) {
            Some(case_type) => cases.retain(|c| c.type_id == Some(case_type.id)),
            None => tracing::debug!("Case type '{}' not found, not filtering by type", type_name),
        }
    }

    if let Some(filter) = config.custom_field_filter() {
        cases.retain(|c| c.matches_field(&filter));
    }

    cases
}

/// Split results into those whose case is in the run and those that are not
pub fn partition_by_run(
    results: Vec<CaseResult>,
    run_case_ids: &HashSet<u64>,
) -> (Vec<CaseResult>, Vec<CaseResult>) {
    results
        .into_iter()
        .partition(|r| run_case_ids.contains(&r.case_id))
}

/// Pushes collected results into a TestRail run
pub struct RunSynchronizer<A> {
    api: A,
    config: ReporterConfig,
}

impl<A: TestRailApi> RunSynchronizer<A> {
    /// Create a synchronizer
    pub fn new(api: A, config: ReporterConfig) -> Self {
        Self { api, config }
    }

    /// The API backend
    pub fn api(&self) -> &A {
        &self.api
    }

    /// The configuration in use
    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    /// Reconcile `results` with TestRail.
    ///
    /// Returns `None` without touching the network when there is nothing to
    /// report.
    pub async fn synchronize(&self, results: Vec<CaseResult>) -> Result<Option<SyncReport>> {
        if results.is_empty() {
            tracing::error!("No test cases were found.");
            return Ok(None);
        }

        let (run_id, reported_url, created) = match self.config.run_id {
            Some(run_id) => {
                tracing::info!("Using existing run {}", run_id);
                (run_id, None, false)
            }
            None => {
                let run = self.create_run().await?;
                (run.id, run.url, true)
            }
        };
        let run_url = reported_url.unwrap_or_else(|| self.config.run_url(run_id));

        let (submitted, excluded) = if self.config.restrict_to_run {
            let run_case_ids = self.run_case_ids(run_id).await?;
            let executed = results.len();
            let (kept, dropped) = partition_by_run(results, &run_case_ids);
            if !dropped.is_empty() {
                tracing::warn!(
                    "Posting results only for test cases present in run. Executed: {}, Available: {}",
                    executed,
                    kept.len()
                );
                let ids: Vec<u64> = dropped.iter().map(|r| r.case_id).collect();
                tracing::warn!("Tests not in run {}: {:?}", run_id, ids);
            }
            (kept, dropped)
        } else {
            (results, Vec::new())
        };

        if submitted.is_empty() {
            tracing::warn!("No results left to submit to run {}", run_id);
        } else {
            self.api.add_results_for_cases(run_id, &submitted).await?;
            tracing::info!("Submitted {} result(s) to run {}", submitted.len(), run_id);
        }
        tracing::info!("{}", run_url);

        let has_failures = submitted.iter().any(|r| r.status.is_failed());
        let closed = if self.config.close_run && !has_failures {
            tracing::info!("Closing run since all tests are passed.");
            self.api.close_run(run_id).await?;
            true
        } else {
            tracing::info!("Leaving the test run open.");
            false
        };

        Ok(Some(SyncReport {
            run_id,
            run_url,
            created,
            submitted,
            excluded,
            closed,
        }))
    }

    /// Run title: the override, or `"<name>: Automated Test Run"` where name
    /// comes from the suite when one is configured, else the project
    pub async fn resolve_title(&self) -> Result<String> {
        if let Some(title) = &self.config.title {
            return Ok(title.clone());
        }

        let info = match self.config.suite_id {
            Some(suite_id) => self.api.get_suite(suite_id).await?,
            None => self.api.get_project(self.config.project_id).await?,
        };
        Ok(match info.name {
            Some(name) => format!("{}: {}", name, DEFAULT_TITLE_SUFFIX),
            None => DEFAULT_TITLE_SUFFIX.to_string(),
        })
    }

    /// Every case of the project (or suite), following pagination links
    pub async fn fetch_cases(&self) -> Result<Vec<Case>> {
        let mut cases = Vec::new();
        let mut seen = HashSet::new();
        let mut next: Option<String> = None;

        loop {
            let page = self
                .api
                .get_cases(self.config.project_id, self.config.suite_id, next.as_deref())
                .await?;
            cases.extend(page.items);

            match page.next {
                Some(link) if self.config.paginate => {
                    if !seen.insert(link.clone()) {
                        tracing::warn!("Pagination link repeated, stopping: {}", link);
                        break;
                    }
                    next = Some(link);
                }
                _ => break,
            }
        }

        tracing::debug!("Fetched {} case(s)", cases.len());
        Ok(cases)
    }

    /// Case ids of every test in the run, following pagination links
    pub async fn run_case_ids(&self, run_id: u64) -> Result<HashSet<u64>> {
        let mut ids = HashSet::new();
        let mut seen = HashSet::new();
        let mut next: Option<String> = None;

        loop {
            let page = self.api.get_tests(run_id, next.as_deref()).await?;
            ids.extend(page.items.iter().map(|t| t.case_id));

            match page.next {
                Some(link) if self.config.paginate => {
                    if !seen.insert(link.clone()) {
                        tracing::warn!("Pagination link repeated, stopping: {}", link);
                        break;
                    }
                    next = Some(link);
                }
                _ => break,
            }
        }

        Ok(ids)
    }

    async fn create_run(&self) -> Result<crate::api::Run> {
        let title = self.resolve_title().await?;
        let cases = self.fetch_cases().await?;
        let case_types = self.api.get_case_types().await?;
        let cases = filter_cases(cases, &case_types, &self.config);

        let request = if !cases.is_empty() {
            let case_ids = cases.iter().map(|c| c.id).collect();
            NewRun::with_cases(title, self.config.suite_id, case_ids)
        } else {
            match self.config.empty_filter {
                EmptyFilterPolicy::IncludeAll => {
                    tracing::info!("No cases matched the filters, including all cases in the run");
                    NewRun::include_all(title, self.config.suite_id)
                }
                EmptyFilterPolicy::Fail => {
                    return Err(Error::EmptyCaseFilter {
                        project_id: self.config.project_id,
                    });
                }
            }
        };

        let run = self.api.add_run(self.config.project_id, &request).await?;
        tracing::info!("Created run {} '{}'", run.id, request.name);
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Page, ProjectInfo, Run, Test};
    use async_trait::async_trait;
    use serde_json::json;
    use tracing_test::traced_test;

    /// Backend that must never be reached
    struct OfflineApi;

    #[async_trait]
    impl TestRailApi for OfflineApi {
        async fn get_project(&self, _: u64) -> Result<ProjectInfo> {
            unreachable!("get_project")
        }
        async fn get_suite(&self, _: u64) -> Result<ProjectInfo> {
            unreachable!("get_suite")
        }
        async fn get_cases(&self, _: u64, _: Option<u64>, _: Option<&str>) -> Result<Page<Case>> {
            unreachable!("get_cases")
        }
        async fn get_case_types(&self) -> Result<Vec<CaseType>> {
            unreachable!("get_case_types")
        }
        async fn add_run(&self, _: u64, _: &NewRun) -> Result<Run> {
            unreachable!("add_run")
        }
        async fn get_tests(&self, _: u64, _: Option<&str>) -> Result<Page<Test>> {
            unreachable!("get_tests")
        }
        async fn add_results_for_cases(&self, _: u64, _: &[CaseResult]) -> Result<()> {
            unreachable!("add_results_for_cases")
        }
        async fn close_run(&self, _: u64) -> Result<()> {
            unreachable!("close_run")
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_empty_results_skip_network() {
        let sync = RunSynchronizer::new(OfflineApi, ReporterConfig::new("d", "u", "k", 1));

        let report = sync.synchronize(Vec::new()).await.unwrap();

        assert!(report.is_none());
        assert!(logs_contain("ERROR"));
        assert!(logs_contain("No test cases were found."));
    }

    fn cases() -> Vec<Case> {
        serde_json::from_value(json!([
            {"id": 1, "type_id": 3, "custom_platform": "api"},
            {"id": 2, "type_id": 3, "custom_platform": "web"},
            {"id": 3, "type_id": 7, "custom_platform": "api"},
        ]))
        .unwrap()
    }

    fn case_types() -> Vec<CaseType> {
        serde_json::from_value(json!([
            {"id": 3, "name": "Automated"},
            {"id": 7, "name": "Functionality"},
        ]))
        .unwrap()
    }

    fn ids(cases: &[Case]) -> Vec<u64> {
        cases.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_filter_cases_without_filters() {
        let config = ReporterConfig::new("d", "u", "k", 1);
        assert_eq!(ids(&filter_cases(cases(), &case_types(), &config)), vec![1, 2, 3]);
    }

    #[test]
    fn test_filter_cases_by_type() {
        let mut config = ReporterConfig::new("d", "u", "k", 1);
        config.case_type = Some("Automated".to_string());
        assert_eq!(ids(&filter_cases(cases(), &case_types(), &config)), vec![1, 2]);
    }

    #[test]
    fn test_filter_cases_unknown_type_is_ignored() {
        let mut config = ReporterConfig::new("d", "u", "k", 1);
        config.case_type = Some("Exploratory".to_string());
        assert_eq!(ids(&filter_cases(cases(), &case_types(), &config)), vec![1, 2, 3]);
    }

    #[test]
    fn test_filter_cases_by_type_and_custom_field() {
        let mut config = ReporterConfig::new("d", "u", "k", 1);
        config.case_type = Some("Automated".to_string());
        config.custom_filter = Some("custom_platform:api".to_string());
        assert_eq!(ids(&filter_cases(cases(), &case_types(), &config)), vec![1]);
    }

    #[test]
    fn test_filter_cases_malformed_custom_filter_is_ignored() {
        let mut config = ReporterConfig::new("d", "u", "k", 1);
        config.custom_filter = Some("custom_platform".to_string());
        assert_eq!(ids(&filter_cases(cases(), &case_types(), &config)), vec![1, 2, 3]);
    }

    #[test]
    fn test_partition_by_run() {
        let run_ids: HashSet<u64> = [10, 20].into_iter().collect();
        let results = vec![
            CaseResult::passed(10),
            CaseResult::failed(30, "x"),
            CaseResult::passed(20),
        ];

        let (kept, dropped) = partition_by_run(results, &run_ids);
        assert_eq!(kept, vec![CaseResult::passed(10), CaseResult::passed(20)]);
        assert_eq!(dropped, vec![CaseResult::failed(30, "x")]);
    }
}
