//! Conversion of report rows into worksheet cells.

use cianstat_core::ReportRow;
use serde_json::Value;

/// Column headers of the report worksheet, in column order.
pub const HEADERS: [&str; 13] = [
    "Дата ( за какое число собирался отчет)",
    "Ссылка на объявление",
    "id объявление",
    "Просмотры",
    "Звонки",
    "Чаты",
    "Лайки",
    "Баллы на аукцион",
    "Дата публикации объявления",
    "Тип недвижимости",
    "Предложения",
    "Адрес",
    "Площадь",
];

/// Last column of the report, matching `HEADERS.len()`.
pub const LAST_COLUMN: char = 'M';

fn text(value: Option<&str>) -> Value {
    Value::String(value.unwrap_or_default().to_owned())
}

/// Cells for one row. Unset fields become empty strings so the column
/// positions never shift.
#[must_use]
pub fn row_values(row: &ReportRow) -> Vec<Value> {
    vec![
        Value::String(row.report_date_label()),
        text(row.listing_url.as_deref()),
        Value::from(row.listing_id),
        Value::from(row.views),
        Value::from(row.calls),
        Value::from(row.chats),
        row.likes.map_or_else(|| text(None), Value::from),
        Value::from(row.auction_points),
        Value::String(row.publish_date_label()),
        text(row.property_type.as_deref()),
        text(row.transaction_kind.map(|kind| kind.label())),
        text(row.address.as_deref()),
        text(row.area.as_deref()),
    ]
}

#[must_use]
pub fn header_values() -> Vec<Value> {
    HEADERS.iter().map(|h| Value::String((*h).to_owned())).collect()
}
