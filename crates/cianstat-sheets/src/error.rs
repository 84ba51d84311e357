use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("spreadsheet {0} not found")]
    SpreadsheetNotFound(String),

    #[error("worksheet with id {worksheet_id} not found in spreadsheet {spreadsheet_id}")]
    WorksheetNotFound {
        spreadsheet_id: String,
        worksheet_id: i64,
    },

    #[error("Sheets API returned {status} while {action}: {detail}")]
    Status {
        status: u16,
        action: &'static str,
        detail: String,
    },

    #[error("failed to write rows to worksheet (status {status}): {detail}")]
    Write { status: u16, detail: String },

    #[error("failed to deserialize Sheets response for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unusable service-account key {path}: {reason}")]
    Credentials { path: String, reason: String },

    #[error("failed to sign token assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("token endpoint returned {status}: {detail}")]
    TokenExchange { status: u16, detail: String },

    #[error("invalid Sheets base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
