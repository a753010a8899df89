use crate::config::AdoConfig;
use crate::provider::{map_http_error, status_error, ClientError, ClientResult, TestPlanService};
use crate::types::{Outcome, TestCase, TestSuite};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

const API_VERSION: &str = "5.0";
const RUN_COMMENT: &str = "Created by automation script";

/// Work item and point ids arrive either as JSON numbers or numeric strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FlexibleId {
    Number(i64),
    Text(String),
}

impl FlexibleId {
    fn to_i64(&self, field: &str) -> ClientResult<i64> {
        match self {
            FlexibleId::Number(n) => Ok(*n),
            FlexibleId::Text(s) => s.trim().parse().map_err(|_| ClientError::Parse {
                message: format!("{} is not an integer: {:?}", field, s),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AdoList<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct AdoSuite {
    id: FlexibleId,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdoTestPoint {
    id: FlexibleId,
    test_case: Option<AdoWorkItemRef>,
}

#[derive(Debug, Deserialize)]
struct AdoWorkItemRef {
    id: FlexibleId,
    name: Option<String>,
    revision: Option<FlexibleId>,
}

#[derive(Debug, Serialize)]
struct ShallowRef {
    id: String,
}

impl ShallowRef {
    fn new(id: i64) -> Self {
        Self { id: id.to_string() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRunRequest<'a> {
    name: &'a str,
    plan: ShallowRef,
    automated: bool,
    point_ids: &'a [i64],
    state: &'static str,
    is_automated: bool,
    comment: &'static str,
    owner: Option<ShallowRef>,
}

#[derive(Debug, Deserialize)]
struct CreateRunResponse {
    id: FlexibleId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunResultRequest<'a> {
    test_case: ShallowRef,
    test_point: ShallowRef,
    test_case_revision: i64,
    test_case_title: &'a str,
    outcome: Outcome,
    state: &'static str,
    comment: &'a str,
}

/// REST client for Azure DevOps test plans and runs.
pub struct AdoTestPlanClient {
    client: reqwest::Client,
    base_url: String,
    config: AdoConfig,
}

impl AdoTestPlanClient {
    pub fn new(config: AdoConfig) -> ClientResult<Self> {
        config
            .validate()
            .map_err(|msg| ClientError::InvalidConfig { message: msg })?;

        let base_url = format!(
            "{}/{}",
            config.organization_url.trim_end_matches('/'),
            config.project
        );

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/_apis/test/{}?api-version={}",
            self.base_url, path, API_VERSION
        )
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .basic_auth("", Some(&self.config.personal_access_token))
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .basic_auth("", Some(&self.config.personal_access_token))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> ClientResult<reqwest::Response> {
        request
            .send()
            .await
            .map_err(|e| map_http_error(e, "Azure DevOps"))
    }

    /// Read the whole body, then deserialize it. A body that is not the
    /// expected JSON is a parse failure, not a transport one.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let body = response
            .text()
            .await
            .map_err(|e| map_http_error(e, "Azure DevOps"))?;

        serde_json::from_str(&body).map_err(|e| ClientError::Parse {
            message: format!("Unexpected Azure DevOps response: {}", e),
        })
    }

    fn is_created(status: StatusCode) -> bool {
        status == StatusCode::OK || status == StatusCode::CREATED
    }

    fn convert_point(point: AdoTestPoint) -> ClientResult<Option<TestCase>> {
        let Some(work_item) = point.test_case else {
            debug!("Skipping test point without a test case");
            return Ok(None);
        };

        let id = work_item.id.to_i64("testCase.id")?;
        let mut case = TestCase::new(id, point.id.to_i64("point id")?);
        if let Some(name) = work_item.name {
            case = case.with_title(name);
        }
        if let Some(revision) = &work_item.revision {
            case = case.with_revision(revision.to_i64("testCase.revision")?);
        }

        Ok(Some(case))
    }
}

#[async_trait]
impl TestPlanService for AdoTestPlanClient {
    async fn list_suites(&self, plan_id: i64) -> ClientResult<Vec<TestSuite>> {
        let url = self.api_url(&format!("Plans/{}/suites", plan_id));
        debug!("Fetching all suites from URL: {}", url);

        let response = self.send(self.get(&url)).await?;
        if response.status() != StatusCode::OK {
            return Err(status_error(response).await);
        }

        let suites: AdoList<AdoSuite> = Self::decode(response).await?;

        suites
            .value
            .into_iter()
            .map(|suite| {
                Ok(TestSuite {
                    id: suite.id.to_i64("suite id")?,
                    name: suite.name,
                })
            })
            .collect()
    }

    async fn get_test_cases_from_suite(
        &self,
        plan_id: i64,
        suite_id: i64,
    ) -> ClientResult<Vec<TestCase>> {
        let url = self.api_url(&format!("Plans/{}/suites/{}/points", plan_id, suite_id));
        debug!("Fetching test points from URL: {}", url);

        let response = self.send(self.get(&url)).await?;
        if response.status() != StatusCode::OK {
            return Err(status_error(response).await);
        }

        let points: AdoList<AdoTestPoint> = Self::decode(response).await?;

        let mut test_cases = Vec::with_capacity(points.value.len());
        for point in points.value {
            if let Some(case) = Self::convert_point(point)? {
                debug!(
                    "ADO test case: id={}, title={}, point_id={}, revision={}",
                    case.id, case.test_case_title, case.test_point_id, case.test_case_revision
                );
                test_cases.push(case);
            }
        }

        Ok(test_cases)
    }

    async fn get_all_test_cases_from_plan(&self, plan_id: i64) -> ClientResult<Vec<TestCase>> {
        let suites = self.list_suites(plan_id).await?;

        let mut all_test_cases = Vec::new();
        for suite in suites {
            debug!(
                "Fetching test cases from suite {} ({})",
                suite.id,
                suite.name.as_deref().unwrap_or("unnamed")
            );
            match self.get_test_cases_from_suite(plan_id, suite.id).await {
                Ok(cases) => all_test_cases.extend(cases),
                Err(e) => error!("Failed to fetch test cases from suite {}: {}", suite.id, e),
            }
        }

        info!(
            "Fetched {} test cases from plan {}",
            all_test_cases.len(),
            plan_id
        );
        Ok(all_test_cases)
    }

    async fn create_test_run(
        &self,
        plan_id: i64,
        suite_id: i64,
        point_ids: &[i64],
        run_name: &str,
    ) -> ClientResult<i64> {
        let url = self.api_url("runs");
        let payload = CreateRunRequest {
            name: run_name,
            plan: ShallowRef::new(plan_id),
            automated: true,
            point_ids,
            state: "InProgress",
            is_automated: true,
            comment: RUN_COMMENT,
            owner: None,
        };
        debug!(
            "Creating test run for plan {} (suite {}) with {} points",
            plan_id,
            suite_id,
            point_ids.len()
        );

        let response = self.send(self.post(&url).json(&payload)).await?;
        if !Self::is_created(response.status()) {
            return Err(status_error(response).await);
        }

        let run: CreateRunResponse = Self::decode(response).await?;
        let run_id = run.id.to_i64("run id")?;

        info!("Created test run with ID: {}", run_id);
        Ok(run_id)
    }

    async fn add_test_result_to_run(
        &self,
        run_id: i64,
        test_case_id: i64,
        test_point_id: i64,
        test_case_revision: i64,
        test_case_title: &str,
        outcome: Outcome,
        comment: &str,
    ) -> ClientResult<()> {
        let url = self.api_url(&format!("runs/{}/results", run_id));
        let payload = [RunResultRequest {
            test_case: ShallowRef::new(test_case_id),
            test_point: ShallowRef::new(test_point_id),
            test_case_revision,
            test_case_title,
            outcome,
            state: "Completed",
            comment,
        }];
        debug!("Posting test result for test case {}", test_case_id);

        let response = match self.send(self.post(&url).json(&payload)).await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    "Failed to update test case {} in run {}: {}",
                    test_case_id, run_id, e
                );
                return Err(e);
            }
        };

        if Self::is_created(response.status()) {
            info!(
                "Updated test case {} in run {} with outcome {}",
                test_case_id, run_id, outcome
            );
            Ok(())
        } else {
            let err = status_error(response).await;
            error!(
                "Failed to update test case {} in run {}: {}",
                test_case_id, run_id, err
            );
            Err(err)
        }
    }

    fn service_name(&self) -> &'static str {
        "azure-devops"
    }
}
