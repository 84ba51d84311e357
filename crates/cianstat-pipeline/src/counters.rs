//! Chat and call counts joined onto the expanded daily rows.
//!
//! Chats accumulate: each inbound chat adds one to its (listing, day) row.
//! Calls overwrite: the row's `calls` becomes the number of successful calls
//! recorded for that listing on that day. Events for days the expansion did
//! not produce are dropped.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::NaiveDate;
use cianstat_api::{ChatId, StatsApi};
use cianstat_core::{ReportRow, ReportWindow, RowKey};

use crate::paginator::Paginator;
use crate::timestamps::{require_day, require_timestamp, to_utc};
use crate::PipelineError;

const CHAT_ORDER_BY: &str = "updatedAt";
const CHAT_ORDER_DIR: &str = "desc";

/// Maps each row's `(listing_id, report_date)` to its position.
#[derive(Debug, Default)]
pub struct RowIndex {
    positions: HashMap<RowKey, usize>,
}

impl RowIndex {
    #[must_use]
    pub fn build(rows: &[ReportRow]) -> Self {
        let positions = rows
            .iter()
            .enumerate()
            .map(|(position, row)| (row.key(), position))
            .collect();
        Self { positions }
    }

    #[must_use]
    pub fn position(&self, listing_id: i64, report_date: NaiveDate) -> Option<usize> {
        self.positions
            .get(&RowKey {
                listing_id,
                report_date,
            })
            .copied()
    }
}

/// An inbound chat updated inside the report window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub chat_id: ChatId,
    pub updated_on: NaiveDate,
    pub listing_id: i64,
}

/// Walks the chat feed newest-first and collects inbound chats.
///
/// Paging stops for good at the first chat updated at or before the window
/// start, even mid-page.
///
/// # Errors
///
/// - [`PipelineError::Api`] if a page request fails.
/// - [`PipelineError::InvalidTimestamp`] for an unparseable `updatedAt`.
/// - [`PipelineError::PaginationLimit`] if the feed never ends.
pub async fn collect_chat_events<A: StatsApi>(
    api: &A,
    window: &ReportWindow,
    page_size: u32,
    employee_id: Option<i64>,
    delay: Duration,
) -> Result<Vec<ChatEvent>, PipelineError> {
    let since = window.start_instant();
    let mut events = Vec::new();
    let mut pages = Paginator::new("get-chats", delay, move |page| {
        api.get_chats(page, page_size, CHAT_ORDER_BY, CHAT_ORDER_DIR, employee_id)
    });

    'feed: while let Some(chats) = pages.next_page().await? {
        for chat in chats {
            let updated_at = require_timestamp(
                &chat.updated_at,
                &format!("updatedAt of chat {}", chat.chat_id),
            )?;
            if to_utc(updated_at) <= since {
                tracing::debug!(
                    chat_id = %chat.chat_id,
                    updated_at = %updated_at,
                    "reached chats older than the window, stopping"
                );
                break 'feed;
            }
            if !chat.is_inbound() {
                continue;
            }
            let Some(listing_id) = chat.offer_id() else {
                tracing::debug!(chat_id = %chat.chat_id, "inbound chat without listing, skipping");
                continue;
            };
            events.push(ChatEvent {
                chat_id: chat.chat_id,
                updated_on: updated_at.date_naive(),
                listing_id,
            });
        }
    }

    tracing::info!(
        events = events.len(),
        pages = pages.pages_requested(),
        "chat events collected"
    );
    Ok(events)
}

/// Adds one to `chats` on the matching row for every event.
///
/// Returns the number of events that matched a row.
pub fn apply_chat_counts(rows: &mut [ReportRow], events: &[ChatEvent]) -> usize {
    let index = RowIndex::build(rows);
    let mut matched = 0;
    for event in events {
        match index.position(event.listing_id, event.updated_on) {
            Some(position) => {
                rows[position].chats += 1;
                matched += 1;
            }
            None => tracing::debug!(
                listing_id = event.listing_id,
                date = %event.updated_on,
                "chat event has no matching row"
            ),
        }
    }
    matched
}

/// Successful call dates grouped by listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallLog {
    calls: BTreeMap<i64, Vec<NaiveDate>>,
}

impl CallLog {
    pub fn record(&mut self, listing_id: i64, date: NaiveDate) {
        self.calls.entry(listing_id).or_default().push(date);
    }

    /// Number of recorded calls per day for one listing.
    #[must_use]
    pub fn counts_for(&self, listing_id: i64) -> HashMap<NaiveDate, u32> {
        let mut counts = HashMap::new();
        for date in self.calls.get(&listing_id).into_iter().flatten() {
            *counts.entry(*date).or_insert(0) += 1;
        }
        counts
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.calls.values().map(Vec::len).sum()
    }

    pub fn listings(&self) -> impl Iterator<Item = i64> + '_ {
        self.calls.keys().copied()
    }
}

/// Walks the calls report and keeps successful calls tied to a listing.
///
/// # Errors
///
/// - [`PipelineError::Api`] if a page request fails.
/// - [`PipelineError::InvalidTimestamp`] for an unparseable call date.
/// - [`PipelineError::PaginationLimit`] if the feed never ends.
pub async fn collect_successful_calls<A: StatsApi>(
    api: &A,
    window: &ReportWindow,
    page_size: u32,
    employee_id: Option<i64>,
    delay: Duration,
) -> Result<CallLog, PipelineError> {
    let date_from = window.api_date_from();
    let date_to = window.api_date_to();
    let (date_from, date_to) = (date_from.as_str(), date_to.as_str());
    let mut log = CallLog::default();
    let mut pages = Paginator::new("get-calls-report", delay, move |page| {
        api.get_calls_report(page, page_size, date_from, date_to, employee_id)
    });

    while let Some(calls) = pages.next_page().await? {
        for call in calls {
            if !call.is_success() {
                continue;
            }
            let Some(listing_id) = call.offer_id() else {
                continue;
            };
            let date = require_day(&call.date, &format!("call date for listing {listing_id}"))?;
            log.record(listing_id, date);
        }
    }

    tracing::info!(
        calls = log.total(),
        pages = pages.pages_requested(),
        "successful calls collected"
    );
    Ok(log)
}

/// Sets `calls` on every row that has recorded calls for its day.
///
/// Returns the number of rows updated.
pub fn apply_call_counts(rows: &mut [ReportRow], log: &CallLog) -> usize {
    let index = RowIndex::build(rows);
    let mut updated = 0;
    for listing_id in log.listings() {
        for (date, count) in log.counts_for(listing_id) {
            if let Some(position) = index.position(listing_id, date) {
                rows[position].calls = count;
                updated += 1;
            }
        }
    }
    updated
}
