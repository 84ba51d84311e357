//! The statistics run: discover listings, enrich them, expand them into
//! daily rows, and fold chat and call counts into those rows.
//!
//! Every phase talks to Cian through [`cianstat_api::StatsApi`], one request
//! at a time with a fixed pause between requests.

pub mod aggregate;
pub mod counters;
pub mod enrich;
pub mod error;
pub mod expand;
pub mod paginator;
pub mod resolver;
pub mod run;
pub mod timestamps;

#[cfg(test)]
pub(crate) mod fake;

pub use aggregate::{aggregate, sort_rows, AggregateStats};
pub use counters::{
    apply_call_counts, apply_chat_counts, collect_chat_events, collect_successful_calls, CallLog,
    ChatEvent, RowIndex,
};
pub use enrich::{
    apply_offer_detail, attach_auction_bids, attach_details, parse_title, EnrichmentStats,
    ListingIndex,
};
pub use error::PipelineError;
pub use expand::{expand_listing, expand_with_statistics};
pub use paginator::{Paginator, MAX_PAGES};
pub use resolver::{resolve_listings, LISTING_SOURCES, OFFERS_PAGE_SIZE};
pub use run::{run_pipeline, PipelineOptions, PipelineOutput, RunStats};
