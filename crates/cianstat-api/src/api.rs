//! The endpoint surface the statistics pipeline consumes.
//!
//! [`CianClient`](crate::CianClient) is the production implementation; tests
//! implement [`StatsApi`] with in-memory fakes so pipeline stages run without
//! a network.

use crate::error::ApiError;
use crate::types::{
    Announcement, AuctionItem, Call, Chat, OfferDetail, OfferSource, ViewsStatistics,
};

/// Upper bound on ids per `get-my-offers-detail` request.
pub const MAX_DETAIL_BATCH: usize = 100;

/// Upper bound on ids per `get-auction` request.
pub const MAX_AUCTION_BATCH: usize = 20;

#[allow(async_fn_in_trait)]
pub trait StatsApi {
    /// One page of the agency's listings from `source`.
    async fn get_my_offers(
        &self,
        page: u32,
        page_size: u32,
        source: OfferSource,
        statuses: &[&str],
        user_ids: Option<&[i64]>,
    ) -> Result<Vec<Announcement>, ApiError>;

    /// Descriptive details for up to [`MAX_DETAIL_BATCH`] listings.
    async fn get_my_offers_detail(&self, offer_ids: &[i64]) -> Result<Vec<OfferDetail>, ApiError>;

    /// Current auction bets for up to [`MAX_AUCTION_BATCH`] listings.
    async fn get_auction(&self, offer_ids: &[i64]) -> Result<Vec<AuctionItem>, ApiError>;

    /// Views and favorites per day for one listing; dates are `YYYY-MM-DD`.
    async fn get_views_statistics_by_days(
        &self,
        date_from: &str,
        date_to: &str,
        offer_id: i64,
    ) -> Result<ViewsStatistics, ApiError>;

    /// One page of agency chats.
    async fn get_chats(
        &self,
        page: u32,
        page_size: u32,
        order_by: &str,
        order_dir: &str,
        employee_id: Option<i64>,
    ) -> Result<Vec<Chat>, ApiError>;

    /// One page of the call report between `date_from` and `date_to`.
    async fn get_calls_report(
        &self,
        page: u32,
        page_size: u32,
        date_from: &str,
        date_to: &str,
        employee_id: Option<i64>,
    ) -> Result<Vec<Call>, ApiError>;
}
