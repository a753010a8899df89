//! Reader for Allure and ReportPortal result exports.
//!
//! Three payload shapes are understood:
//!
//! * a bare array of records (Allure `behaviors.json`),
//! * an object with a `children` array (Allure summary),
//! * an object with a `testCases` array (ReportPortal).
//!
//! Anything else comes back as [`ParsedResults::Unrecognized`].

use crate::config::AllureConfig;
use crate::provider::{map_http_error, status_error, ClientError, ClientResult, ResultSource};
use crate::types::{ParsedResults, TestResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, warn};

pub struct AllureReportFetcher {
    client: reqwest::Client,
    config: AllureConfig,
}

impl AllureReportFetcher {
    pub fn new(config: AllureConfig) -> ClientResult<Self> {
        config
            .validate()
            .map_err(|msg| ClientError::InvalidConfig { message: msg })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    pub fn parse_results(value: Value) -> ParsedResults {
        let records = match &value {
            Value::Array(items) => Some(items),
            Value::Object(map) => map
                .get("children")
                .and_then(Value::as_array)
                .or_else(|| map.get("testCases").and_then(Value::as_array)),
            _ => None,
        }
        .map(|items| Self::normalize(items));

        match records {
            Some(results) => ParsedResults::Recognized(results),
            None => {
                warn!("Unrecognized result payload: {}", value);
                ParsedResults::Unrecognized(value)
            }
        }
    }

    fn normalize(items: &[Value]) -> Vec<TestResult> {
        items
            .iter()
            .filter_map(|item| {
                let name = item.get("name").and_then(Value::as_str)?;
                let status = item.get("status").and_then(Value::as_str)?;
                debug!("Allure test case: name={}, status={}", name, status);
                Some(TestResult::new(name, status))
            })
            .collect()
    }
}

#[async_trait]
impl ResultSource for AllureReportFetcher {
    async fn fetch_results(&self) -> ClientResult<ParsedResults> {
        debug!("Fetching results from {}", self.config.results_url);

        let response = self
            .client
            .get(&self.config.results_url)
            .send()
            .await
            .map_err(|e| map_http_error(e, "result source"))?;

        if response.status() != StatusCode::OK {
            return Err(status_error(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| map_http_error(e, "result source"))?;

        let value: Value = serde_json::from_str(&body).map_err(|e| ClientError::Parse {
            message: format!("Failed to parse Allure/ReportPortal results: {}", e),
        })?;

        let parsed = Self::parse_results(value);
        if let ParsedResults::Recognized(results) = &parsed {
            info!("Fetched {} test results", results.len());
        }

        Ok(parsed)
    }

    fn source_name(&self) -> &'static str {
        "allure"
    }
}
