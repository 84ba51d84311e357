//! Final fold of the counters into the expanded rows.

use cianstat_core::{ReportRow, SortOrder};

use crate::counters::{apply_call_counts, apply_chat_counts, CallLog, ChatEvent};

/// Totals reported by [`aggregate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub chat_events_matched: usize,
    pub call_rows_updated: usize,
}

/// Sorts rows by report date. The sort is stable, so rows of the same day
/// keep expansion order.
pub fn sort_rows(rows: &mut [ReportRow], order: SortOrder) {
    match order {
        SortOrder::Chronological => rows.sort_by_key(|row| row.report_date),
        SortOrder::Lexicographic => rows.sort_by_cached_key(ReportRow::report_date_label),
    }
}

/// Applies chat counts, then call counts, then sorts.
pub fn aggregate(
    rows: &mut [ReportRow],
    chats: &[ChatEvent],
    calls: &CallLog,
    order: SortOrder,
) -> AggregateStats {
    let chat_events_matched = apply_chat_counts(rows, chats);
    let call_rows_updated = apply_call_counts(rows, calls);
    sort_rows(rows, order);
    AggregateStats {
        chat_events_matched,
        call_rows_updated,
    }
}
