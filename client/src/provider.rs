use crate::types::{Outcome, ParsedResults, TestCase, TestSuite};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Failed to parse response: {message}")]
    Parse { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("Authentication failed")]
    Authentication,
}

pub type ClientResult<T> = Result<T, ClientError>;

/// A place test execution results can be read from.
#[async_trait]
pub trait ResultSource: Send + Sync {
    async fn fetch_results(&self) -> ClientResult<ParsedResults>;

    fn source_name(&self) -> &'static str;
}

/// The test-management side: plans, suites, points and runs.
#[async_trait]
pub trait TestPlanService: Send + Sync {
    async fn list_suites(&self, plan_id: i64) -> ClientResult<Vec<TestSuite>>;

    async fn get_test_cases_from_suite(
        &self,
        plan_id: i64,
        suite_id: i64,
    ) -> ClientResult<Vec<TestCase>>;

    /// Every test case of every suite in the plan. A suite that fails to load
    /// is logged and skipped; failing to list the suites is an error.
    async fn get_all_test_cases_from_plan(&self, plan_id: i64) -> ClientResult<Vec<TestCase>>;

    async fn create_test_run(
        &self,
        plan_id: i64,
        suite_id: i64,
        point_ids: &[i64],
        run_name: &str,
    ) -> ClientResult<i64>;

    #[allow(clippy::too_many_arguments)]
    async fn add_test_result_to_run(
        &self,
        run_id: i64,
        test_case_id: i64,
        test_point_id: i64,
        test_case_revision: i64,
        test_case_title: &str,
        outcome: Outcome,
        comment: &str,
    ) -> ClientResult<()>;

    fn service_name(&self) -> &'static str;
}

/// Map transport-level reqwest failures onto the client error taxonomy.
pub(crate) fn map_http_error(err: reqwest::Error, service: &str) -> ClientError {
    if err.is_timeout() {
        ClientError::ServiceUnavailable {
            message: "Request timeout".to_string(),
        }
    } else if err.is_connect() {
        ClientError::ServiceUnavailable {
            message: format!("Cannot connect to {}", service),
        }
    } else if let Some(status) = err.status() {
        match status.as_u16() {
            401 | 403 => ClientError::Authentication,
            _ => ClientError::Network(err),
        }
    } else {
        ClientError::Network(err)
    }
}

/// Turn a non-success response into an error, consuming the body for context.
pub(crate) async fn status_error(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    if status == 401 || status == 403 {
        return ClientError::Authentication;
    }
    let body = response.text().await.unwrap_or_default();
    ClientError::UnexpectedStatus { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TestResult;

    struct MockSource;

    #[async_trait]
    impl ResultSource for MockSource {
        async fn fetch_results(&self) -> ClientResult<ParsedResults> {
            Ok(ParsedResults::Recognized(vec![TestResult::new(
                "TC-1 smoke",
                "passed",
            )]))
        }

        fn source_name(&self) -> &'static str {
            "mock"
        }
    }

    #[tokio::test]
    async fn test_mock_source() {
        let source = MockSource;
        let results = source.fetch_results().await.unwrap();
        assert_eq!(results.recognized().map(|r| r.len()), Some(1));
        assert_eq!(source.source_name(), "mock");
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::UnexpectedStatus {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected HTTP status 500: boom");
        assert_eq!(
            ClientError::Authentication.to_string(),
            "Authentication failed"
        );
    }

    #[test]
    fn test_serde_error_conversion() {
        let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
        let err: ClientError = json_err.into();
        assert!(matches!(err, ClientError::Serialization(_)));
    }
}
