//! End-to-end orchestration of one statistics run.

use std::time::Duration;

use cianstat_api::StatsApi;
use cianstat_core::{ReportRow, ReportWindow, SortOrder};

use crate::aggregate::{aggregate, AggregateStats};
use crate::counters::{collect_chat_events, collect_successful_calls};
use crate::enrich::{attach_auction_bids, attach_details, EnrichmentStats};
use crate::expand::expand_listing;
use crate::resolver::resolve_listings;
use crate::PipelineError;

/// Knobs for a run. Tests use `Duration::ZERO` pacing.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub inter_request_delay: Duration,
    pub feed_page_size: u32,
    pub employee_id: Option<i64>,
    pub sort_order: SortOrder,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            inter_request_delay: Duration::from_millis(200),
            feed_page_size: 50,
            employee_id: None,
            sort_order: SortOrder::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub listings: usize,
    pub rows: usize,
    pub chat_events: usize,
    pub successful_calls: usize,
    pub enrichment: EnrichmentStats,
    pub aggregate: AggregateStats,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub rows: Vec<ReportRow>,
    pub stats: RunStats,
}

/// Runs discovery, enrichment, expansion, counting, and aggregation in order.
///
/// Requests are issued one at a time with `inter_request_delay` between them.
///
/// # Errors
///
/// Any [`PipelineError`] from the enrichment, expansion, or counting phases.
/// Discovery failures are logged and truncate their source instead.
pub async fn run_pipeline<A: StatsApi>(
    api: &A,
    window: &ReportWindow,
    options: &PipelineOptions,
) -> Result<PipelineOutput, PipelineError> {
    let delay = options.inter_request_delay;
    let user_ids = options.employee_id.map(|id| vec![id]);
    let mut stats = RunStats::default();

    tracing::info!(window = %window, "starting statistics run");

    let mut listings = resolve_listings(api, delay, user_ids.as_deref()).await;
    stats.listings = listings.len();
    tracing::info!(listings = listings.len(), "listings discovered");

    attach_details(api, &mut listings, delay, &mut stats.enrichment).await?;
    attach_auction_bids(api, &mut listings, delay, &mut stats.enrichment).await?;
    tracing::info!(
        details = stats.enrichment.details_applied,
        unclassified_urls = stats.enrichment.unclassified_urls,
        unparsed_titles = stats.enrichment.unparsed_titles,
        auction_bids = stats.enrichment.auction_bids_applied,
        "listings enriched"
    );

    let mut rows = Vec::new();
    for listing in &listings {
        let expanded = expand_listing(api, listing, window, delay).await?;
        tracing::debug!(listing_id = listing.listing_id, days = expanded.len(), "listing expanded");
        rows.extend(expanded);
    }
    tracing::info!(rows = rows.len(), "daily rows expanded");

    let chats = collect_chat_events(
        api,
        window,
        options.feed_page_size,
        options.employee_id,
        delay,
    )
    .await?;
    let calls = collect_successful_calls(
        api,
        window,
        options.feed_page_size,
        options.employee_id,
        delay,
    )
    .await?;
    stats.chat_events = chats.len();
    stats.successful_calls = calls.total();

    stats.aggregate = aggregate(&mut rows, &chats, &calls, options.sort_order);
    stats.rows = rows.len();
    tracing::info!(
        rows = stats.rows,
        chat_events_matched = stats.aggregate.chat_events_matched,
        call_rows_updated = stats.aggregate.call_rows_updated,
        "statistics run complete"
    );

    Ok(PipelineOutput { rows, stats })
}
