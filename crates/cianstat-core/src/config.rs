use std::path::PathBuf;

use crate::app_config::{AppConfig, SheetsConfig, SheetsCredentials};
use crate::{ConfigError, SortOrder};

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can pass a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        match lookup(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingEnvVar(var.to_string())),
        }
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let cian_access_token = require("CIAN_ACCESS_TOKEN")?;

    let api_base_url = or_default("CIANSTAT_API_BASE_URL", "https://public-api.cian.ru");
    let request_timeout_secs = parse_u64("CIANSTAT_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("CIANSTAT_USER_AGENT", "cianstat/0.1 (listing-statistics)");
    let inter_request_delay_ms = parse_u64("CIANSTAT_INTER_REQUEST_DELAY_MS", "200")?;
    let max_retries = parse_u32("CIANSTAT_MAX_RETRIES", "1")?;
    let retry_backoff_base_ms = parse_u64("CIANSTAT_RETRY_BACKOFF_BASE_MS", "1000")?;

    let feed_page_size = parse_u32("CIANSTAT_FEED_PAGE_SIZE", "50")?;
    if feed_page_size == 0 {
        return Err(invalid(
            "CIANSTAT_FEED_PAGE_SIZE",
            "must be greater than zero".to_string(),
        ));
    }

    let employee_id = match lookup("CIANSTAT_EMPLOYEE_ID") {
        Ok(raw) if !raw.trim().is_empty() => Some(
            raw.trim()
                .parse::<i64>()
                .map_err(|e| invalid("CIANSTAT_EMPLOYEE_ID", e.to_string()))?,
        ),
        _ => None,
    };

    let sort_order = or_default("CIANSTAT_SORT_ORDER", "chronological")
        .parse::<SortOrder>()
        .map_err(|reason| invalid("CIANSTAT_SORT_ORDER", reason))?;

    let fallback_dir = PathBuf::from(or_default("CIANSTAT_FALLBACK_DIR", "."));

    Ok(AppConfig {
        cian_access_token,
        api_base_url,
        request_timeout_secs,
        user_agent,
        inter_request_delay_ms,
        max_retries,
        retry_backoff_base_ms,
        feed_page_size,
        employee_id,
        sort_order,
        fallback_dir,
    })
}

/// Load the report sheet settings from environment variables.
///
/// `GOOGLE_CREDENTIALS_PATH` (a service-account key file) takes precedence
/// over `GOOGLE_SHEETS_ACCESS_TOKEN`; one of the two is required.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_sheets_config() -> Result<SheetsConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_sheets_config(|key| std::env::var(key))
}

fn build_sheets_config<F>(lookup: F) -> Result<SheetsConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let present = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let credentials = if let Some(path) = present("GOOGLE_CREDENTIALS_PATH") {
        SheetsCredentials::ServiceAccountFile(PathBuf::from(path))
    } else if let Some(token) = present("GOOGLE_SHEETS_ACCESS_TOKEN") {
        SheetsCredentials::AccessToken(token)
    } else {
        return Err(ConfigError::MissingEnvVar(
            "GOOGLE_CREDENTIALS_PATH".to_string(),
        ));
    };

    let spreadsheet_id = present("GOOGLE_SPREADSHEET_ID")
        .ok_or_else(|| ConfigError::MissingEnvVar("GOOGLE_SPREADSHEET_ID".to_string()))?;
    let worksheet_id = present("GOOGLE_WORKSHEET_ID")
        .ok_or_else(|| ConfigError::MissingEnvVar("GOOGLE_WORKSHEET_ID".to_string()))?
        .parse::<i64>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "GOOGLE_WORKSHEET_ID".to_string(),
            reason: e.to_string(),
        })?;
    let base_url = present("GOOGLE_SHEETS_BASE_URL")
        .unwrap_or_else(|| "https://sheets.googleapis.com".to_string());

    Ok(SheetsConfig {
        credentials,
        spreadsheet_id,
        worksheet_id,
        base_url,
    })
}

/// Log filter directive from `CIANSTAT_LOG_LEVEL`, readable before the rest
/// of the configuration so configuration errors are logged too.
#[must_use]
pub fn load_log_level() -> String {
    log_level_with(|key| std::env::var(key))
}

fn log_level_with<F>(lookup: F) -> String
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    lookup("CIANSTAT_LOG_LEVEL")
        .ok()
        .filter(|level| !level.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
