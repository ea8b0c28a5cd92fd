//! HTTP client for the TestRail API v2
//!
//! Requests are sent one at a time. A non-2xx response is logged with its body
//! and the body is still decoded, so a step continues with whatever the server
//! returned. Only transport failures and undecodable bodies become errors.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::RequestBuilder;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::api::{Case, CaseType, NewRun, Page, ProjectInfo, Run, TestRailApi, Test};
use crate::config::ReporterConfig;
use crate::error::{Error, Result};
use crate::results::CaseResult;

const API_PREFIX: &str = "/api/v2/";

/// `Authorization` header value for Basic auth
pub fn basic_auth(username: &str, api_key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, api_key)))
}

/// TestRail client over `reqwest`
pub struct HttpTestRail {
    base_url: String,
    auth_header: String,
    client: reqwest::Client,
}

impl HttpTestRail {
    /// Create a client for the instance and credentials in `config`
    pub fn new(config: &ReporterConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| Error::Transport {
                endpoint: config.base_url(),
                source,
            })?;

        Ok(Self {
            base_url: config.base_url(),
            auth_header: basic_auth(&config.username, &config.api_key),
            client,
        })
    }

    /// Full URL of an API endpoint such as `get_case_types`
    pub fn api_url(&self, endpoint: &str) -> String {
        format!("{}/index.php?{}{}", self.base_url, API_PREFIX, endpoint)
    }

    /// Endpoint named by a `_links.next` value
    fn next_endpoint(link: &str) -> &str {
        link.strip_prefix(API_PREFIX)
            .unwrap_or_else(|| link.trim_start_matches('/'))
    }

    fn cases_endpoint(project_id: u64, suite_id: Option<u64>) -> String {
        match suite_id {
            Some(suite_id) => format!("get_cases/{}&suite_id={}", project_id, suite_id),
            None => format!("get_cases/{}", project_id),
        }
    }

    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<String> {
        let response = request
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, &self.auth_header)
            .send()
            .await
            .map_err(|source| Error::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| Error::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

        if !status.is_success() {
            tracing::error!(%status, endpoint, "TestRail request failed: {}", body);
        }
        Ok(body)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.api_url(endpoint);
        tracing::debug!("GET {}", url);
        let body = self.send(self.client.get(&url), endpoint).await?;
        decode(endpoint, &body)
    }

    async fn get_page<T: DeserializeOwned>(&self, endpoint: &str, key: &str) -> Result<Page<T>> {
        let value: Value = self.get(endpoint).await?;
        Page::from_value(value, key).map_err(|source| Error::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    async fn post(&self, endpoint: &str, body: Option<&Value>) -> Result<String> {
        let url = self.api_url(endpoint);
        tracing::debug!("POST {}", url);
        let mut request = self.client.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request, endpoint).await
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| Error::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[async_trait]
impl TestRailApi for HttpTestRail {
    async fn get_project(&self, project_id: u64) -> Result<ProjectInfo> {
        self.get(&format!("get_project/{}", project_id)).await
    }

    async fn get_suite(&self, suite_id: u64) -> Result<ProjectInfo> {
        self.get(&format!("get_suite/{}", suite_id)).await
    }

    async fn get_cases(
        &self,
        project_id: u64,
        suite_id: Option<u64>,
        next: Option<&str>,
    ) -> Result<Page<Case>> {
        let endpoint = match next {
            Some(link) => Self::next_endpoint(link).to_string(),
            None => Self::cases_endpoint(project_id, suite_id),
        };
        self.get_page(&endpoint, "cases").await
    }

    async fn get_case_types(&self) -> Result<Vec<CaseType>> {
        let endpoint = "get_case_types";
        let value: Value = self.get(endpoint).await?;
        CaseType::list_from_value(value).map_err(|source| Error::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    async fn add_run(&self, project_id: u64, run: &NewRun) -> Result<Run> {
        let endpoint = format!("add_run/{}", project_id);
        let body = serde_json::to_value(run)?;
        let response = self.post(&endpoint, Some(&body)).await?;
        decode(&endpoint, &response)
    }

    async fn get_tests(&self, run_id: u64, next: Option<&str>) -> Result<Page<Test>> {
        let endpoint = match next {
            Some(link) => Self::next_endpoint(link).to_string(),
            None => format!("get_tests/{}", run_id),
        };
        self.get_page(&endpoint, "tests").await
    }

    async fn add_results_for_cases(&self, run_id: u64, results: &[CaseResult]) -> Result<()> {
        let body = serde_json::json!({ "results": results });
        self.post(&format!("add_results_for_cases/{}", run_id), Some(&body))
            .await?;
        Ok(())
    }

    async fn close_run(&self, run_id: u64) -> Result<()> {
        self.post(&format!("close_run/{}", run_id), None).await?;
        Ok(())
    }
}
