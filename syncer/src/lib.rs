pub mod driver;
pub mod matcher;
pub mod settings;

pub use driver::{
    MatchRecord, SyncDriver, SyncError, SyncOptions, SyncReport, SyncResult, DEFAULT_RUN_NAME,
};
pub use matcher::{find_match, StatusFilter};
pub use settings::{Settings, SettingsError};
