use crate::matcher::{find_match, StatusFilter};
use crate::settings::SettingsError;
use client::provider::{ClientError, ResultSource, TestPlanService};
use client::types::Outcome;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_RUN_NAME: &str = "Automated Run";

const RAW_PREVIEW_LEN: usize = 200;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Result source returned an unrecognized payload: {preview}")]
    UnrecognizedResults { preview: String },

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub plan_id: i64,
    pub suite_id: i64,
    pub run_name: String,
    pub statuses: StatusFilter,
}

impl SyncOptions {
    pub fn new(plan_id: i64, suite_id: i64) -> Self {
        Self {
            plan_id,
            suite_id,
            run_name: DEFAULT_RUN_NAME.to_string(),
            statuses: StatusFilter::default(),
        }
    }

    pub fn with_run_name(mut self, run_name: impl Into<String>) -> Self {
        self.run_name = run_name.into();
        self
    }

    pub fn with_statuses(mut self, statuses: StatusFilter) -> Self {
        self.statuses = statuses;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub test_case_id: i64,
    pub result_name: String,
    pub status: String,
    pub outcome: Outcome,
}

/// What a single pass did, case by case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub run_id: i64,
    pub results_fetched: usize,
    pub test_cases: usize,
    pub matched: Vec<MatchRecord>,
    pub unmatched: Vec<i64>,
    pub failed_posts: Vec<i64>,
}

impl SyncReport {
    fn new(run_id: i64, results_fetched: usize, test_cases: usize) -> Self {
        Self {
            run_id,
            results_fetched,
            test_cases,
            matched: Vec::new(),
            unmatched: Vec::new(),
            failed_posts: Vec::new(),
        }
    }

    pub fn outcome_count(&self, outcome: Outcome) -> usize {
        self.matched.iter().filter(|m| m.outcome == outcome).count()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test run {}", self.run_id)?;
        writeln!(
            f,
            "  {} results fetched, {} test cases in plan",
            self.results_fetched, self.test_cases
        )?;
        writeln!(
            f,
            "  updated: {} (passed {}, failed {}, not executed {})",
            self.matched.len(),
            self.outcome_count(Outcome::Passed),
            self.outcome_count(Outcome::Failed),
            self.outcome_count(Outcome::NotExecuted)
        )?;
        writeln!(f, "  unmatched: {}", self.unmatched.len())?;
        write!(f, "  failed updates: {}", self.failed_posts.len())
    }
}

/// Fetches results and test cases, opens a run, and posts one outcome per
/// matched test case.
pub struct SyncDriver<'a> {
    source: &'a dyn ResultSource,
    plans: &'a dyn TestPlanService,
    options: SyncOptions,
}

impl<'a> SyncDriver<'a> {
    pub fn new(
        source: &'a dyn ResultSource,
        plans: &'a dyn TestPlanService,
        options: SyncOptions,
    ) -> Self {
        Self {
            source,
            plans,
            options,
        }
    }

    pub async fn run(&self) -> SyncResult<SyncReport> {
        info!("Fetching results from {}", self.source.source_name());
        let results = self
            .source
            .fetch_results()
            .await?
            .into_recognized()
            .map_err(|raw| SyncError::UnrecognizedResults {
                preview: raw.to_string().chars().take(RAW_PREVIEW_LEN).collect(),
            })?;
        info!(
            "Fetched {} test results from {}",
            results.len(),
            self.source.source_name()
        );

        let test_cases = self
            .plans
            .get_all_test_cases_from_plan(self.options.plan_id)
            .await?;
        info!(
            "Fetched {} test cases from all suites of plan {}",
            test_cases.len(),
            self.options.plan_id
        );

        let point_ids: Vec<i64> = test_cases.iter().map(|tc| tc.test_point_id).collect();
        let run_id = self
            .plans
            .create_test_run(
                self.options.plan_id,
                self.options.suite_id,
                &point_ids,
                &self.options.run_name,
            )
            .await?;

        let mut report = SyncReport::new(run_id, results.len(), test_cases.len());

        for test_case in &test_cases {
            let Some(result) = find_match(test_case, &results, &self.options.statuses) else {
                info!(
                    "No result found for test case: TestCase-{} (ID: {})",
                    test_case.id, test_case.id
                );
                report.unmatched.push(test_case.id);
                continue;
            };

            let status = result.status.to_lowercase();
            let outcome = Outcome::from_status(&status);
            let comment = format!("Updated by automation. Allure status: {}", status);
            debug!(
                "Test case {} matched '{}' -> {}",
                test_case.id, result.name, outcome
            );

            match self
                .plans
                .add_test_result_to_run(
                    run_id,
                    test_case.id,
                    test_case.test_point_id,
                    test_case.test_case_revision,
                    &test_case.test_case_title,
                    outcome,
                    &comment,
                )
                .await
            {
                Ok(()) => {
                    info!(
                        "Matched ADO test case {} with result '{}' and status '{}'",
                        test_case.id, result.name, status
                    );
                    report.matched.push(MatchRecord {
                        test_case_id: test_case.id,
                        result_name: result.name.clone(),
                        status,
                        outcome,
                    });
                }
                Err(e) => {
                    debug!("Recording failed post for test case {}: {}", test_case.id, e);
                    report.failed_posts.push(test_case.id);
                }
            }
        }

        Ok(report)
    }
}
