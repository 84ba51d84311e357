//! Detail and auction enrichment of discovered listings.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use cianstat_api::{OfferDetail, StatsApi, MAX_AUCTION_BATCH, MAX_DETAIL_BATCH};
use cianstat_core::{Listing, TransactionKind};
use regex::Regex;

use crate::PipelineError;

static TITLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?),\s(.+?\s(?:м²|сот\.))").expect("valid regex"));

/// Maps `listing_id` to the listing's position in the run's listing list.
#[derive(Debug, Default)]
pub struct ListingIndex {
    positions: HashMap<i64, usize>,
}

impl ListingIndex {
    #[must_use]
    pub fn build(listings: &[Listing]) -> Self {
        let positions = listings
            .iter()
            .enumerate()
            .map(|(position, listing)| (listing.listing_id, position))
            .collect();
        Self { positions }
    }

    #[must_use]
    pub fn position(&self, listing_id: i64) -> Option<usize> {
        self.positions.get(&listing_id).copied()
    }
}

/// Counters for the non-fatal mismatches seen while enriching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub details_applied: usize,
    pub unclassified_urls: usize,
    pub unparsed_titles: usize,
    pub unknown_ids: usize,
    pub auction_bids_applied: usize,
}

/// Splits a listing title into `(property_type, area)`.
///
/// `"2-комн. квартира, 54.2 м²"` yields `("2-комн. квартира", "54.2 м²")`.
/// Non-breaking spaces inside the area become plain spaces.
#[must_use]
pub fn parse_title(title: &str) -> Option<(String, String)> {
    let captures = TITLE_PATTERN.captures(title)?;
    let property_type = captures.get(1)?.as_str().trim().to_owned();
    let area = captures
        .get(2)?
        .as_str()
        .trim()
        .replace('\u{a0}', " ");
    Some((property_type, area))
}

/// Copies one detail record onto its listing.
///
/// Fields that cannot be derived are left untouched so a later record for the
/// same listing never erases known values.
pub fn apply_offer_detail(
    listing: &mut Listing,
    detail: &OfferDetail,
    stats: &mut EnrichmentStats,
) {
    let url = detail.url.as_deref().unwrap_or_default();
    match TransactionKind::from_listing_url(url) {
        Some(kind) => listing.details.transaction_kind = Some(kind),
        None => {
            stats.unclassified_urls += 1;
            tracing::warn!(
                listing_id = listing.listing_id,
                url,
                "could not derive transaction kind from listing url"
            );
        }
    }

    let title = detail.title.as_deref().unwrap_or_default();
    match parse_title(title) {
        Some((property_type, area)) => {
            listing.details.property_type = Some(property_type);
            listing.details.area = Some(area);
        }
        None => {
            stats.unparsed_titles += 1;
            tracing::warn!(
                listing_id = listing.listing_id,
                title,
                "could not parse property type and area from title"
            );
        }
    }

    if detail.url.is_some() {
        listing.details.listing_url.clone_from(&detail.url);
    }
    if detail.address.is_some() {
        listing.details.address.clone_from(&detail.address);
    }
    stats.details_applied += 1;
}

/// Fetches detail records in batches of [`MAX_DETAIL_BATCH`] and applies them.
///
/// # Errors
///
/// Returns [`PipelineError::Api`] if any batch request fails.
pub async fn attach_details<A: StatsApi>(
    api: &A,
    listings: &mut [Listing],
    delay: Duration,
    stats: &mut EnrichmentStats,
) -> Result<(), PipelineError> {
    let index = ListingIndex::build(listings);
    let ids: Vec<i64> = listings.iter().map(|l| l.listing_id).collect();

    for batch in ids.chunks(MAX_DETAIL_BATCH) {
        let details = api.get_my_offers_detail(batch).await?;
        tracing::debug!(requested = batch.len(), returned = details.len(), "detail batch");
        for detail in &details {
            let Some(position) = index.position(detail.id) else {
                stats.unknown_ids += 1;
                tracing::warn!(listing_id = detail.id, "detail record for unknown listing");
                continue;
            };
            apply_offer_detail(&mut listings[position], detail, stats);
        }
        pause(delay).await;
    }
    Ok(())
}

/// Fetches auction bids in batches of [`MAX_AUCTION_BATCH`] and stores them
/// as `auction_points`.
///
/// # Errors
///
/// Returns [`PipelineError::Api`] if any batch request fails.
pub async fn attach_auction_bids<A: StatsApi>(
    api: &A,
    listings: &mut [Listing],
    delay: Duration,
    stats: &mut EnrichmentStats,
) -> Result<(), PipelineError> {
    let index = ListingIndex::build(listings);
    let ids: Vec<i64> = listings.iter().map(|l| l.listing_id).collect();

    for batch in ids.chunks(MAX_AUCTION_BATCH) {
        let items = api.get_auction(batch).await?;
        for item in items {
            let Some(position) = index.position(item.offer_id) else {
                stats.unknown_ids += 1;
                tracing::warn!(listing_id = item.offer_id, "auction item for unknown listing");
                continue;
            };
            if let Some(bet) = item.current_bet {
                listings[position].auction_points = bet;
                stats.auction_bids_applied += 1;
            }
        }
        pause(delay).await;
    }
    Ok(())
}

pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
