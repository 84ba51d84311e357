//! Google Sheets v4 REST sink for the daily report.

use std::time::Duration;

use cianstat_core::ReportRow;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{SheetsAuth, TokenSource};
use crate::error::SheetsError;
use crate::values::{header_values, row_values, LAST_COLUMN};

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

/// Destination of a finished report.
#[allow(async_fn_in_trait)]
pub trait ReportSink {
    /// Appends `rows` after the last used row. Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Implementations return a [`SheetsError`] when the write is rejected.
    async fn append(&mut self, rows: &[ReportRow]) -> Result<usize, SheetsError>;
}

/// Where and how to reach the report worksheet.
#[derive(Clone)]
pub struct SheetsTarget {
    pub auth: SheetsAuth,
    pub spreadsheet_id: String,
    pub worksheet_id: i64,
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl std::fmt::Debug for SheetsTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsTarget")
            .field("auth", &self.auth)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("worksheet_id", &self.worksheet_id)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Serialize)]
struct ValuesBody {
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct AppendResponse {
    #[serde(default)]
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_rows: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
}

/// A worksheet resolved by id and ready to receive rows.
pub struct SheetsSink {
    client: Client,
    tokens: TokenSource,
    base_url: Url,
    spreadsheet_id: String,
    worksheet_title: String,
}

impl std::fmt::Debug for SheetsSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsSink")
            .field("base_url", &self.base_url.as_str())
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("worksheet_title", &self.worksheet_title)
            .finish_non_exhaustive()
    }
}

impl SheetsSink {
    /// Opens the spreadsheet and resolves the worksheet title from its id.
    ///
    /// # Errors
    ///
    /// - [`SheetsError::SpreadsheetNotFound`] when the spreadsheet returns 404.
    /// - [`SheetsError::WorksheetNotFound`] when no sheet has `worksheet_id`.
    /// - [`SheetsError::Status`] for any other non-2xx response.
    /// - [`SheetsError::TokenExchange`] or [`SheetsError::Signing`] when a
    ///   service-account token cannot be minted.
    pub async fn connect(target: &SheetsTarget) -> Result<Self, SheetsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(target.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(target.user_agent.as_str())
            .build()?;

        let normalised = format!("{}/", target.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| SheetsError::InvalidBaseUrl {
            url: target.base_url.clone(),
            reason: e.to_string(),
        })?;

        let mut sink = Self {
            client,
            tokens: TokenSource::new(target.auth.clone()),
            base_url,
            spreadsheet_id: target.spreadsheet_id.clone(),
            worksheet_title: String::new(),
        };

        let mut url = sink.spreadsheet_url(&[])?;
        url.query_pairs_mut().append_pair("fields", "sheets.properties");
        let token = sink.tokens.bearer(&sink.client).await?;
        let response = sink
            .client
            .get(url)
            .bearer_auth(&token)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SheetsError::SpreadsheetNotFound(target.spreadsheet_id.clone()));
        }
        let meta: SpreadsheetMeta = decode(response, "reading spreadsheet metadata").await?;

        let title = meta
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties)
            .find(|properties| properties.sheet_id == target.worksheet_id)
            .map(|properties| properties.title)
            .ok_or_else(|| SheetsError::WorksheetNotFound {
                spreadsheet_id: target.spreadsheet_id.clone(),
                worksheet_id: target.worksheet_id,
            })?;

        tracing::info!(
            spreadsheet_id = %target.spreadsheet_id,
            worksheet_id = target.worksheet_id,
            worksheet = %title,
            "connected to report worksheet"
        );
        sink.worksheet_title = title;
        Ok(sink)
    }

    #[must_use]
    pub fn worksheet_title(&self) -> &str {
        &self.worksheet_title
    }

    /// Writes the header row when the worksheet holds no values at all.
    ///
    /// Returns `true` if headers were written.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Status`] or [`SheetsError::Http`] when either the
    /// read or the write fails.
    pub async fn ensure_headers(&mut self) -> Result<bool, SheetsError> {
        let used = self.quoted_title();
        let url = self.spreadsheet_url(&["values", &used])?;
        let token = self.tokens.bearer(&self.client).await?;
        let response = self.client.get(url).bearer_auth(&token).send().await?;
        let existing: ValueRange = decode(response, "reading worksheet values").await?;
        if existing.values.iter().any(|row| !row.is_empty()) {
            tracing::debug!(worksheet = %self.worksheet_title, "worksheet not empty, headers kept");
            return Ok(false);
        }

        let range = self.a1_range(&format!("A1:{LAST_COLUMN}1"));
        let mut url = self.spreadsheet_url(&["values", &range])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = ValuesBody {
            values: vec![header_values()],
        };
        let response = self
            .client
            .put(url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;
        let _: Value = decode(response, "writing header row").await?;
        tracing::info!(worksheet = %self.worksheet_title, "wrote header row to empty worksheet");
        Ok(true)
    }

    /// Builds `{base}/v4/spreadsheets/{id}/...`, encoding each segment.
    fn spreadsheet_url(&self, tail: &[&str]) -> Result<Url, SheetsError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SheetsError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "base URL cannot carry a path".to_owned(),
            })?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str()])
            .extend(tail);
        Ok(url)
    }

    /// The worksheet title quoted for A1 notation. On its own it addresses
    /// the whole used range.
    fn quoted_title(&self) -> String {
        format!("'{}'", self.worksheet_title.replace('\'', "''"))
    }

    /// A1 notation scoped to the worksheet.
    fn a1_range(&self, cells: &str) -> String {
        format!("{}!{cells}", self.quoted_title())
    }
}

impl ReportSink for SheetsSink {
    async fn append(&mut self, rows: &[ReportRow]) -> Result<usize, SheetsError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let target = format!("{}:append", self.a1_range("A1"));
        let mut url = self.spreadsheet_url(&["values", &target])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = ValuesBody {
            values: rows.iter().map(row_values).collect(),
        };
        let token = self.tokens.bearer(&self.client).await?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(SheetsError::Write {
                status: status.as_u16(),
                detail: error_detail(&text),
            });
        }

        let parsed: AppendResponse =
            serde_json::from_str(&text).map_err(|source| SheetsError::Deserialize {
                context: "append response".to_owned(),
                source,
            })?;
        let written = parsed
            .updates
            .and_then(|u| u.updated_rows)
            .unwrap_or(rows.len());
        tracing::info!(
            worksheet = %self.worksheet_title,
            rows = written,
            "appended rows to worksheet"
        );
        Ok(written)
    }
}

async fn decode<T: DeserializeOwned>(
    response: Response,
    action: &'static str,
) -> Result<T, SheetsError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(SheetsError::Status {
            status: status.as_u16(),
            action,
            detail: error_detail(&text),
        });
    }
    serde_json::from_str(&text).map_err(|source| SheetsError::Deserialize {
        context: action.to_owned(),
        source,
    })
}

/// Pulls `error.message` out of a Google error body, falling back to the raw
/// text.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<GoogleErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
        _ if body.trim().is_empty() => "empty response body".to_owned(),
        _ => body.chars().take(300).collect(),
    }
}
