pub mod app_config;
pub mod config;
pub mod listing;
pub mod window;

use thiserror::Error;

pub use app_config::{AppConfig, SheetsConfig, SheetsCredentials};
pub use config::{
    load_app_config, load_app_config_from_env, load_log_level, load_sheets_config,
    DEFAULT_LOG_LEVEL,
};
pub use listing::{
    DailyViews, Listing, ListingDetails, ReportRow, RowKey, SortOrder, TransactionKind,
    PUBLISH_DATE_FORMAT, REPORT_DATE_FORMAT,
};
pub use window::{parse_cli_datetime, ReportWindow, WindowError, MAX_WINDOW_DAYS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
