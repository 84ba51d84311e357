//! The `cianstat` run: collect statistics from Cian and deliver them to the
//! report sheet, falling back to a JSON dump when the sheet write fails.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use cianstat_api::CianClient;
use cianstat_core::{AppConfig, ReportRow, ReportWindow, SheetsConfig, SheetsCredentials};
use cianstat_pipeline::{run_pipeline, PipelineOptions};
use cianstat_sheets::{ReportSink, ServiceAccountKey, SheetsAuth, SheetsSink, SheetsTarget};

use crate::fallback::write_fallback;

pub(crate) fn pipeline_options(config: &AppConfig) -> PipelineOptions {
    PipelineOptions {
        inter_request_delay: Duration::from_millis(config.inter_request_delay_ms),
        feed_page_size: config.feed_page_size,
        employee_id: config.employee_id,
        sort_order: config.sort_order,
    }
}

/// Resolves the sink target, reading the service-account key when one is
/// configured.
pub(crate) fn sheets_target(
    config: &AppConfig,
    sheets: &SheetsConfig,
) -> anyhow::Result<SheetsTarget> {
    let auth = match &sheets.credentials {
        SheetsCredentials::ServiceAccountFile(path) => SheetsAuth::ServiceAccount(
            ServiceAccountKey::from_file(path).context("failed to load Google credentials")?,
        ),
        SheetsCredentials::AccessToken(token) => SheetsAuth::AccessToken(token.clone()),
    };
    Ok(SheetsTarget {
        auth,
        spreadsheet_id: sheets.spreadsheet_id.clone(),
        worksheet_id: sheets.worksheet_id,
        base_url: sheets.base_url.clone(),
        timeout_secs: config.request_timeout_secs,
        user_agent: config.user_agent.clone(),
    })
}

/// Runs the full collection for `window`.
///
/// The worksheet is opened before any Cian request so a misconfigured sheet
/// fails fast. Without `sheets` (a dry run) the sheet is never touched.
///
/// # Errors
///
/// Returns an error if the sheet cannot be opened, the pipeline fails, or the
/// rows cannot be delivered (after writing the fallback dump).
pub(crate) async fn run_report(
    config: &AppConfig,
    sheets: Option<&SheetsConfig>,
    window: &ReportWindow,
) -> anyhow::Result<()> {
    let client = CianClient::with_base_url(
        &config.cian_access_token,
        config.request_timeout_secs,
        &config.user_agent,
        &config.api_base_url,
    )
    .context("failed to build Cian API client")?
    .with_retry_policy(config.max_retries, config.retry_backoff_base_ms);

    let mut sink = match sheets {
        None => None,
        Some(sheets) => {
            let mut sink = SheetsSink::connect(&sheets_target(config, sheets)?)
                .await
                .context("failed to open report worksheet")?;
            sink.ensure_headers()
                .await
                .context("failed to prepare worksheet headers")?;
            Some(sink)
        }
    };

    let output = run_pipeline(&client, window, &pipeline_options(config))
        .await
        .context("statistics collection failed")?;

    let Some(sink) = sink.as_mut() else {
        println!(
            "dry run: {} rows for {} listings; nothing written",
            output.rows.len(),
            output.stats.listings
        );
        return Ok(());
    };

    let written = deliver(sink, &output.rows, &config.fallback_dir).await?;
    tracing::info!(rows = written, "report delivered");
    Ok(())
}

/// Appends `rows` to `sink`. When the sink fails, the rows are dumped to a
/// JSON file in `fallback_dir` and the sink error is returned.
pub(crate) async fn deliver<S: ReportSink>(
    sink: &mut S,
    rows: &[ReportRow],
    fallback_dir: &Path,
) -> anyhow::Result<usize> {
    match sink.append(rows).await {
        Ok(written) => Ok(written),
        Err(e) => {
            tracing::error!(
                error = %e,
                rows = rows.len(),
                "failed to write rows to sheet, dumping to JSON"
            );
            let path = write_fallback(fallback_dir, rows, Local::now().naive_local())?;
            tracing::error!(path = %path.display(), "report rows saved to fallback file");
            Err(anyhow::Error::new(e)
                .context(format!("sheet write failed, rows saved to {}", path.display())))
        }
    }
}
