use std::path::PathBuf;

use crate::SortOrder;

/// Settings for the Cian collection run. The report sheet is configured
/// separately in [`SheetsConfig`] so a dry run never needs Google credentials.
#[derive(Clone)]
pub struct AppConfig {
    pub cian_access_token: String,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub feed_page_size: u32,
    pub employee_id: Option<i64>,
    pub sort_order: SortOrder,
    pub fallback_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("cian_access_token", &"[redacted]")
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("feed_page_size", &self.feed_page_size)
            .field("employee_id", &self.employee_id)
            .field("sort_order", &self.sort_order)
            .field("fallback_dir", &self.fallback_dir)
            .finish()
    }
}

/// How the report sink authenticates against Google.
#[derive(Clone)]
pub enum SheetsCredentials {
    /// Path to a service-account JSON key. Access tokens are minted from it.
    ServiceAccountFile(PathBuf),
    /// A ready-made OAuth access token.
    AccessToken(String),
}

impl std::fmt::Debug for SheetsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ServiceAccountFile(path) => {
                f.debug_tuple("ServiceAccountFile").field(path).finish()
            }
            Self::AccessToken(_) => f.debug_tuple("AccessToken").field(&"[redacted]").finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub credentials: SheetsCredentials,
    pub spreadsheet_id: String,
    pub worksheet_id: i64,
    pub base_url: String,
}
