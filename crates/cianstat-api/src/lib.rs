pub mod api;
pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use api::{StatsApi, MAX_AUCTION_BATCH, MAX_DETAIL_BATCH};
pub use client::CianClient;
pub use error::ApiError;
pub use types::{
    Announcement, AuctionItem, Call, Chat, ChatId, DayFavorites, DayViews, LastMessage,
    OfferDetail, OfferRef, OfferSource, ViewsStatistics,
};
