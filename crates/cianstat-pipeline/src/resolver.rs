//! Discovery of the agency's published listings.
//!
//! Both listing sources are walked page by page. A failing source is logged
//! and cut short; whatever it produced before the failure is kept and the
//! other source still runs.

use std::collections::HashSet;
use std::time::Duration;

use cianstat_api::{OfferSource, StatsApi};
use cianstat_core::Listing;

use crate::paginator::Paginator;
use crate::timestamps::require_timestamp;
use crate::PipelineError;

/// Sources walked during discovery, in order.
pub const LISTING_SOURCES: [OfferSource; 2] = [OfferSource::Upload, OfferSource::Manual];

pub const OFFERS_PAGE_SIZE: u32 = 100;

const PUBLISHED: &str = "published";

/// Collects every published listing across [`LISTING_SOURCES`].
///
/// Listings keep discovery order; an id seen in both sources is kept once,
/// at its first position.
pub async fn resolve_listings<A: StatsApi>(
    api: &A,
    delay: Duration,
    user_ids: Option<&[i64]>,
) -> Vec<Listing> {
    let mut listings = Vec::new();
    let mut seen = HashSet::new();

    for source in LISTING_SOURCES {
        let before = listings.len();
        if let Err(e) = resolve_source(api, source, delay, user_ids, &mut listings, &mut seen).await
        {
            tracing::error!(
                source = %source,
                kept = listings.len() - before,
                error = %e,
                "listing discovery failed, keeping listings found so far"
            );
        }
        tracing::info!(
            source = %source,
            found = listings.len() - before,
            "listing source resolved"
        );
    }

    listings
}

async fn resolve_source<A: StatsApi>(
    api: &A,
    source: OfferSource,
    delay: Duration,
    user_ids: Option<&[i64]>,
    listings: &mut Vec<Listing>,
    seen: &mut HashSet<i64>,
) -> Result<(), PipelineError> {
    let statuses = [PUBLISHED];
    let statuses = statuses.as_slice();
    let mut pages = Paginator::new("get-my-offers", delay, move |page| {
        api.get_my_offers(page, OFFERS_PAGE_SIZE, source, statuses, user_ids)
    });

    while let Some(batch) = pages.next_page().await? {
        for announcement in batch {
            let created = require_timestamp(
                &announcement.creation_date,
                &format!("creationDate of listing {}", announcement.id),
            )?;
            if !seen.insert(announcement.id) {
                tracing::debug!(
                    listing_id = announcement.id,
                    source = %source,
                    "listing already discovered, skipping duplicate"
                );
                continue;
            }
            listings.push(Listing::discovered(
                announcement.id,
                created.naive_local(),
            ));
        }
    }
    Ok(())
}
