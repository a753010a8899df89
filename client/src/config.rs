use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn validate_url(url: &str, what: &str) -> Result<(), String> {
    if url.is_empty() {
        return Err(format!("{} cannot be empty", what));
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(format!("{} must start with http:// or https://", what));
    }

    Ok(())
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AdoConfig {
    pub organization_url: String,
    pub project: String,
    pub personal_access_token: String,
    pub timeout: Duration,
}

impl AdoConfig {
    pub fn new(
        organization_url: impl Into<String>,
        project: impl Into<String>,
        personal_access_token: impl Into<String>,
    ) -> Self {
        Self {
            organization_url: organization_url.into(),
            project: project.into(),
            personal_access_token: personal_access_token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_url(&self.organization_url, "Organization URL")?;

        if self.project.trim().is_empty() {
            return Err("Project cannot be empty".to_string());
        }

        if self.personal_access_token.trim().is_empty() {
            return Err("Personal access token cannot be empty".to_string());
        }

        if self.timeout.is_zero() {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl fmt::Debug for AdoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdoConfig")
            .field("organization_url", &self.organization_url)
            .field("project", &self.project)
            .field("personal_access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllureConfig {
    pub results_url: String,
    pub timeout: Duration,
}

impl AllureConfig {
    pub fn new(results_url: impl Into<String>) -> Self {
        Self {
            results_url: results_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_url(&self.results_url, "Results URL")?;

        if self.timeout.is_zero() {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}
