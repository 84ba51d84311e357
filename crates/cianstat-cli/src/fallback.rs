//! JSON dump of the report rows, written when the sheet rejects them.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDateTime;
use cianstat_core::ReportRow;
use serde::Serialize;

/// `<DD-MM-YYYYTHH-MM-SS>_alarm_record.json` for the given local time.
pub(crate) fn fallback_file_name(at: NaiveDateTime) -> String {
    format!("{}_alarm_record.json", at.format("%d-%m-%YT%H-%M-%S"))
}

/// Rows as a JSON array with four-space indentation. Non-ASCII text is kept
/// as-is.
pub(crate) fn render_rows(rows: &[ReportRow]) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    rows.serialize(&mut serializer)?;
    Ok(out)
}

/// Writes the dump into `dir` and returns the file's path.
pub(crate) fn write_fallback(
    dir: &Path,
    rows: &[ReportRow],
    at: NaiveDateTime,
) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create fallback directory {}", dir.display()))?;
    let path = dir.join(fallback_file_name(at));
    let body = render_rows(rows).context("failed to serialize report rows")?;
    std::fs::write(&path, body)
        .with_context(|| format!("failed to write fallback file {}", path.display()))?;
    Ok(std::path::absolute(&path).unwrap_or(path))
}
