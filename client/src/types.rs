use serde::{Deserialize, Serialize};
use std::fmt;

/// One executed test as reported by the result source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestResult {
    pub name: String,
    pub status: String,
}

impl TestResult {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
        }
    }
}

/// Outcome of normalizing a result-source payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResults {
    /// One of the known shapes; records without `name`/`status` already dropped.
    Recognized(Vec<TestResult>),
    /// Any other JSON value, handed back untouched.
    Unrecognized(serde_json::Value),
}

impl ParsedResults {
    pub fn recognized(&self) -> Option<&[TestResult]> {
        match self {
            ParsedResults::Recognized(results) => Some(results),
            ParsedResults::Unrecognized(_) => None,
        }
    }

    pub fn into_recognized(self) -> Result<Vec<TestResult>, serde_json::Value> {
        match self {
            ParsedResults::Recognized(results) => Ok(results),
            ParsedResults::Unrecognized(raw) => Err(raw),
        }
    }
}

/// A test case as seen through one of its test points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestCase {
    pub id: i64,
    /// Decimal form of `id`, used as the substring key when matching results.
    pub id_str: String,
    pub test_point_id: i64,
    pub test_case_revision: i64,
    pub test_case_title: String,
}

impl TestCase {
    pub fn new(id: i64, test_point_id: i64) -> Self {
        Self {
            id,
            id_str: id.to_string(),
            test_point_id,
            test_case_revision: 1,
            test_case_title: format!("TestCase-{}", id),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.test_case_title = title.into();
        self
    }

    pub fn with_revision(mut self, revision: i64) -> Self {
        self.test_case_revision = revision;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestSuite {
    pub id: i64,
    pub name: Option<String>,
}

/// Test outcome as understood by Azure DevOps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Outcome {
    Passed,
    Failed,
    NotExecuted,
}

impl Outcome {
    /// Case-insensitive; anything other than `passed`/`failed` is `NotExecuted`.
    pub fn from_status(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "passed" => Outcome::Passed,
            "failed" => Outcome::Failed,
            _ => Outcome::NotExecuted,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Passed => "Passed",
            Outcome::Failed => "Failed",
            Outcome::NotExecuted => "NotExecuted",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
