pub mod ado;
pub mod allure;
pub mod config;
pub mod provider;
pub mod types;

pub use ado::AdoTestPlanClient;
pub use allure::AllureReportFetcher;
pub use config::{AdoConfig, AllureConfig};
pub use provider::{ClientError, ClientResult, ResultSource, TestPlanService};
pub use types::{Outcome, ParsedResults, TestCase, TestResult, TestSuite};

pub mod prelude {
    pub use crate::ado::*;
    pub use crate::allure::*;
    pub use crate::config::*;
    pub use crate::provider::*;
    pub use crate::types::*;
}
