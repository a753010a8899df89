//! Startup configuration, loaded once from a file or from interactive prompts.
//!
//! File layout (JSON, or TOML when the path ends in `.toml`):
//!
//! ```json
//! {
//!   "ado": {
//!     "organization": "https://dev.azure.com/acme",
//!     "project": "shop",
//!     "pat": "...",
//!     "test_plan_id": 7,
//!     "test_suite_id": 3
//!   },
//!   "allure": {
//!     "results_url": "https://reports.acme.dev/data/behaviors.json",
//!     "update_statuses": ["passed", "failed"]
//!   },
//!   "run_name": "Nightly",
//!   "timeout_secs": 30
//! }
//! ```

use crate::driver::{SyncOptions, DEFAULT_RUN_NAME};
use crate::matcher::StatusFilter;
use client::config::{AdoConfig, AllureConfig, DEFAULT_TIMEOUT};
use serde::Deserialize;
use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid settings: {message}")]
    Invalid { message: String },

    #[error("Prompt failed: {message}")]
    Prompt { message: String },
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    ado: AdoSection,
    allure: AllureSection,
    run_name: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Deserialize)]
struct AdoSection {
    organization: String,
    project: String,
    pat: String,
    test_plan_id: i64,
    test_suite_id: i64,
}

impl fmt::Debug for AdoSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdoSection")
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("test_plan_id", &self.test_plan_id)
            .field("test_suite_id", &self.test_suite_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct AllureSection {
    results_url: String,
    #[serde(default)]
    update_statuses: Option<Vec<String>>,
}

/// Everything one sync pass needs. Built once, validated, then only read.
#[derive(Clone)]
pub struct Settings {
    pub organization_url: String,
    pub project: String,
    pub personal_access_token: String,
    pub test_plan_id: i64,
    pub test_suite_id: i64,
    pub results_url: String,
    pub statuses: StatusFilter,
    pub run_name: String,
    pub timeout: Duration,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("organization_url", &self.organization_url)
            .field("project", &self.project)
            .field("personal_access_token", &"<redacted>")
            .field("test_plan_id", &self.test_plan_id)
            .field("test_suite_id", &self.test_suite_id)
            .field("results_url", &self.results_url)
            .field("statuses", &self.statuses)
            .field("run_name", &self.run_name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Settings {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let file: SettingsFile = if is_toml {
            toml::from_str(&contents)?
        } else {
            serde_json::from_str(&contents)?
        };

        Ok(Self::from(file))
    }

    /// Ask for every value on `output`, reading answers line by line from `input`.
    pub fn prompt<R: BufRead, W: Write>(
        input: &mut R,
        output: &mut W,
    ) -> Result<Self, SettingsError> {
        let results_url = ask(input, output, "Enter the Allure results JSON URL")?;

        writeln!(output, "Which test results do you want to update in ADO?")?;
        writeln!(output, "1. Passed only")?;
        writeln!(output, "2. Passed and Failed")?;
        writeln!(output, "3. All (Passed, Failed, NotExecuted/Skipped)")?;
        let choice = ask(input, output, "Enter 1, 2, or 3")?;

        let organization_url = ask(input, output, "Enter Azure DevOps organization URL")?;
        let project = ask(input, output, "Enter Azure DevOps project name")?;
        let test_plan_id = ask_id(input, output, "Enter Azure DevOps Test Plan ID")?;
        let test_suite_id = ask_id(input, output, "Enter Azure DevOps Test Suite ID")?;
        let personal_access_token = ask(
            input,
            output,
            "Enter your Azure DevOps Personal Access Token (PAT)",
        )?;

        Ok(Self {
            organization_url,
            project,
            personal_access_token,
            test_plan_id,
            test_suite_id,
            results_url,
            statuses: StatusFilter::from_choice(&choice),
            run_name: DEFAULT_RUN_NAME.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_run_name(mut self, run_name: impl Into<String>) -> Self {
        self.run_name = run_name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn ado_config(&self) -> AdoConfig {
        AdoConfig::new(
            &self.organization_url,
            &self.project,
            &self.personal_access_token,
        )
        .with_timeout(self.timeout)
    }

    pub fn allure_config(&self) -> AllureConfig {
        AllureConfig::new(&self.results_url).with_timeout(self.timeout)
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions::new(self.test_plan_id, self.test_suite_id)
            .with_run_name(&self.run_name)
            .with_statuses(self.statuses.clone())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |message: String| SettingsError::Invalid { message };

        self.ado_config().validate().map_err(invalid)?;
        self.allure_config().validate().map_err(invalid)?;

        if self.test_plan_id <= 0 {
            return Err(invalid("Test plan ID must be positive".to_string()));
        }

        if self.test_suite_id <= 0 {
            return Err(invalid("Test suite ID must be positive".to_string()));
        }

        if self.statuses.is_empty() {
            return Err(invalid("At least one status must be selected".to_string()));
        }

        if self.run_name.trim().is_empty() {
            return Err(invalid("Run name cannot be empty".to_string()));
        }

        Ok(())
    }
}

impl From<SettingsFile> for Settings {
    fn from(file: SettingsFile) -> Self {
        let statuses = file
            .allure
            .update_statuses
            .map(StatusFilter::from_statuses)
            .unwrap_or_default();

        Self {
            organization_url: file.ado.organization,
            project: file.ado.project,
            personal_access_token: file.ado.pat,
            test_plan_id: file.ado.test_plan_id,
            test_suite_id: file.ado.test_suite_id,
            results_url: file.allure.results_url,
            statuses,
            run_name: file
                .run_name
                .unwrap_or_else(|| DEFAULT_RUN_NAME.to_string()),
            timeout: file
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> Result<String, SettingsError> {
    write!(output, "{}: ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(SettingsError::Prompt {
            message: format!("input closed before '{}' was answered", prompt),
        });
    }

    Ok(line.trim().to_string())
}

fn ask_id<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> Result<i64, SettingsError> {
    let answer = ask(input, output, prompt)?;
    answer.parse().map_err(|_| SettingsError::Prompt {
        message: format!("'{}' is not a valid ID", answer),
    })
}
