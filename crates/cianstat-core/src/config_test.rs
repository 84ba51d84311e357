use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid values.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("CIAN_ACCESS_TOKEN", "cian-token");
    m
}

/// Returns a map with the report sheet settings populated.
fn sheets_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("GOOGLE_CREDENTIALS_PATH", "/etc/cianstat/service-account.json");
    m.insert("GOOGLE_SPREADSHEET_ID", "1AbCdEf");
    m.insert("GOOGLE_WORKSHEET_ID", "123456");
    m
}

#[test]
fn build_app_config_fails_without_cian_token() {
    let mut map = full_env();
    map.remove("CIAN_ACCESS_TOKEN");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "CIAN_ACCESS_TOKEN"),
        "expected MissingEnvVar(CIAN_ACCESS_TOKEN), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_token_as_missing() {
    let mut map = full_env();
    map.insert("CIAN_ACCESS_TOKEN", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "CIAN_ACCESS_TOKEN"),
        "expected MissingEnvVar(CIAN_ACCESS_TOKEN), got: {result:?}"
    );
}

#[test]
fn build_app_config_ignores_missing_sheet_settings() {
    let result = build_app_config(lookup_from_map(&full_env()));
    assert!(result.is_ok(), "expected Ok without Google vars, got: {result:?}");
}

#[test]
fn build_sheets_config_prefers_service_account_file() {
    let mut map = sheets_env();
    map.insert("GOOGLE_SHEETS_ACCESS_TOKEN", "ya29.sheets-token");
    let cfg = build_sheets_config(lookup_from_map(&map)).unwrap();
    assert!(
        matches!(cfg.credentials, SheetsCredentials::ServiceAccountFile(ref p)
            if p == std::path::Path::new("/etc/cianstat/service-account.json")),
        "got: {cfg:?}"
    );
    assert_eq!(cfg.spreadsheet_id, "1AbCdEf");
    assert_eq!(cfg.worksheet_id, 123_456);
    assert_eq!(cfg.base_url, "https://sheets.googleapis.com");
}

#[test]
fn build_sheets_config_falls_back_to_access_token() {
    let mut map = sheets_env();
    map.remove("GOOGLE_CREDENTIALS_PATH");
    map.insert("GOOGLE_SHEETS_ACCESS_TOKEN", "ya29.sheets-token");
    let cfg = build_sheets_config(lookup_from_map(&map)).unwrap();
    assert!(matches!(
        cfg.credentials,
        SheetsCredentials::AccessToken(ref t) if t == "ya29.sheets-token"
    ));
    assert!(!format!("{cfg:?}").contains("ya29.sheets-token"));
}

#[test]
fn build_sheets_config_requires_credentials() {
    let mut map = sheets_env();
    map.remove("GOOGLE_CREDENTIALS_PATH");
    let result = build_sheets_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "GOOGLE_CREDENTIALS_PATH"),
        "expected MissingEnvVar(GOOGLE_CREDENTIALS_PATH), got: {result:?}"
    );
}

#[test]
fn build_sheets_config_fails_without_spreadsheet_id() {
    let mut map = sheets_env();
    map.remove("GOOGLE_SPREADSHEET_ID");
    let result = build_sheets_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "GOOGLE_SPREADSHEET_ID"),
        "expected MissingEnvVar(GOOGLE_SPREADSHEET_ID), got: {result:?}"
    );
}

#[test]
fn build_sheets_config_rejects_non_numeric_worksheet_id() {
    let mut map = sheets_env();
    map.insert("GOOGLE_WORKSHEET_ID", "Sheet1");
    let result = build_sheets_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GOOGLE_WORKSHEET_ID"),
        "expected InvalidEnvVar(GOOGLE_WORKSHEET_ID), got: {result:?}"
    );
}

#[test]
fn log_level_defaults_to_info() {
    let empty = HashMap::new();
    assert_eq!(log_level_with(lookup_from_map(&empty)), "info");

    let mut map = HashMap::new();
    map.insert("CIANSTAT_LOG_LEVEL", "debug,reqwest=warn");
    assert_eq!(log_level_with(lookup_from_map(&map)), "debug,reqwest=warn");
}

#[test]
fn build_app_config_succeeds_with_all_required_vars() {
    let map = full_env();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.cian_access_token, "cian-token");
    assert_eq!(cfg.api_base_url, "https://public-api.cian.ru");
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "cianstat/0.1 (listing-statistics)");
    assert_eq!(cfg.inter_request_delay_ms, 200);
    assert_eq!(cfg.max_retries, 1);
    assert_eq!(cfg.retry_backoff_base_ms, 1000);
    assert_eq!(cfg.feed_page_size, 50);
    assert!(cfg.employee_id.is_none());
    assert_eq!(cfg.sort_order, SortOrder::Chronological);
    assert_eq!(cfg.fallback_dir, std::path::PathBuf::from("."));
}

#[test]
fn debug_output_redacts_tokens() {
    let cfg = build_app_config(lookup_from_map(&full_env())).unwrap();
    let debug = format!("{cfg:?}");
    assert!(!debug.contains("cian-token"), "token leaked: {debug}");
    assert!(debug.contains("[redacted]"));
}

#[test]
fn inter_request_delay_override() {
    let mut map = full_env();
    map.insert("CIANSTAT_INTER_REQUEST_DELAY_MS", "500");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.inter_request_delay_ms, 500);
}

#[test]
fn inter_request_delay_invalid() {
    let mut map = full_env();
    map.insert("CIANSTAT_INTER_REQUEST_DELAY_MS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CIANSTAT_INTER_REQUEST_DELAY_MS"),
        "expected InvalidEnvVar(CIANSTAT_INTER_REQUEST_DELAY_MS), got: {result:?}"
    );
}

#[test]
fn max_retries_override() {
    let mut map = full_env();
    map.insert("CIANSTAT_MAX_RETRIES", "3");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.max_retries, 3);
}

#[test]
fn feed_page_size_must_be_positive() {
    let mut map = full_env();
    map.insert("CIANSTAT_FEED_PAGE_SIZE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CIANSTAT_FEED_PAGE_SIZE"),
        "expected InvalidEnvVar(CIANSTAT_FEED_PAGE_SIZE), got: {result:?}"
    );
}

#[test]
fn employee_id_is_parsed_when_present() {
    let mut map = full_env();
    map.insert("CIANSTAT_EMPLOYEE_ID", "777");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.employee_id, Some(777));
}

#[test]
fn employee_id_invalid() {
    let mut map = full_env();
    map.insert("CIANSTAT_EMPLOYEE_ID", "abc");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CIANSTAT_EMPLOYEE_ID"),
        "expected InvalidEnvVar(CIANSTAT_EMPLOYEE_ID), got: {result:?}"
    );
}

#[test]
fn sort_order_lexicographic_override() {
    let mut map = full_env();
    map.insert("CIANSTAT_SORT_ORDER", "lexicographic");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.sort_order, SortOrder::Lexicographic);
}

#[test]
fn sort_order_invalid() {
    let mut map = full_env();
    map.insert("CIANSTAT_SORT_ORDER", "by-views");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CIANSTAT_SORT_ORDER"),
        "expected InvalidEnvVar(CIANSTAT_SORT_ORDER), got: {result:?}"
    );
}
