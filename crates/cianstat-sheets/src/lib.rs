pub mod auth;
pub mod error;
pub mod sink;
pub mod values;

pub use auth::{exchange_token, AccessToken, ServiceAccountKey, SheetsAuth, SHEETS_SCOPE};
pub use error::SheetsError;
pub use sink::{ReportSink, SheetsSink, SheetsTarget, DEFAULT_BASE_URL};
pub use values::{header_values, row_values, HEADERS};
