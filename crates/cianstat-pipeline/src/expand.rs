//! Fan-out of each listing into one report row per day of view data.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use cianstat_api::{StatsApi, ViewsStatistics};
use cianstat_core::{DailyViews, Listing, ReportRow, ReportWindow};

use crate::enrich::pause;
use crate::timestamps::require_day;
use crate::PipelineError;

/// Fetches the views series for `listing` and expands it into daily rows.
///
/// # Errors
///
/// - [`PipelineError::Api`] if the statistics request fails.
/// - [`PipelineError::InvalidTimestamp`] if a day in either series is not a date.
pub async fn expand_listing<A: StatsApi>(
    api: &A,
    listing: &Listing,
    window: &ReportWindow,
    delay: Duration,
) -> Result<Vec<ReportRow>, PipelineError> {
    let statistics = api
        .get_views_statistics_by_days(
            &window.api_date_from(),
            &window.api_date_to(),
            listing.listing_id,
        )
        .await?;
    let rows = expand_with_statistics(listing, &statistics)?;
    pause(delay).await;
    Ok(rows)
}

/// Builds one row per entry of `viewsByDays`.
///
/// `likes` comes from the favorites series for the same day and stays `None`
/// when that series has no entry. A day repeated in the views series keeps its
/// first entry.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidTimestamp`] for an unparseable day.
pub fn expand_with_statistics(
    listing: &Listing,
    statistics: &ViewsStatistics,
) -> Result<Vec<ReportRow>, PipelineError> {
    let context = format!("views statistics of listing {}", listing.listing_id);

    let mut favorites: HashMap<NaiveDate, i64> = HashMap::new();
    for entry in &statistics.add_to_favorites_by_days {
        let day = require_day(&entry.date, &context)?;
        favorites.entry(day).or_insert(entry.add_to_favorites);
    }

    let mut rows: Vec<ReportRow> = Vec::with_capacity(statistics.views_by_days.len());
    for entry in &statistics.views_by_days {
        let date = require_day(&entry.date, &context)?;
        if rows.iter().any(|row| row.report_date == date) {
            tracing::warn!(
                listing_id = listing.listing_id,
                date = %date,
                "duplicate day in views series, keeping first entry"
            );
            continue;
        }
        rows.push(ReportRow::for_day(
            listing,
            DailyViews {
                date,
                views: entry.views,
                likes: favorites.get(&date).copied(),
            },
        ));
    }
    Ok(rows)
}
