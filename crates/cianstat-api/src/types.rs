//! Cian public API response types.
//!
//! Every endpoint wraps its payload in a `{"result": { ... }}` envelope;
//! [`ApiResponse`] captures that pattern generically. Only the fields the
//! statistics run reads are modelled; everything else is ignored.

use serde::Deserialize;

/// Top-level envelope for all Cian API responses.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub result: T,
}

/// Where a listing was created, as the `source` filter of `get-my-offers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferSource {
    /// Bulk upload through an XML feed.
    Upload,
    /// Created by hand in the agency cabinet.
    Manual,
}

impl OfferSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Manual => "manual",
        }
    }
}

impl std::fmt::Display for OfferSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// get-my-offers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct MyOffersResult {
    #[serde(default)]
    pub announcements: Vec<Announcement>,
}

/// One listing as returned by `get-my-offers`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    /// ISO 8601 timestamp, with or without an offset.
    pub creation_date: String,
}

// ---------------------------------------------------------------------------
// get-my-offers-detail
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct OffersDetailResult {
    #[serde(default)]
    pub offers: Vec<OfferDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OfferDetail {
    pub id: i64,
    #[serde(default)]
    pub url: Option<String>,
    /// Free text such as `"2-комн. квартира, 54.2 м²"`.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

// ---------------------------------------------------------------------------
// get-auction
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct AuctionResult {
    #[serde(default)]
    pub items: Vec<AuctionItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionItem {
    pub offer_id: i64,
    #[serde(default)]
    pub current_bet: Option<f64>,
}

// ---------------------------------------------------------------------------
// get-views-statistics-by-days
// ---------------------------------------------------------------------------

/// Two parallel day-indexed series for one listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewsStatistics {
    #[serde(default)]
    pub views_by_days: Vec<DayViews>,
    #[serde(default)]
    pub add_to_favorites_by_days: Vec<DayFavorites>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DayViews {
    /// `YYYY-MM-DD`, sometimes with a time component.
    pub date: String,
    #[serde(default)]
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayFavorites {
    pub date: String,
    #[serde(default)]
    pub add_to_favorites: i64,
}

// ---------------------------------------------------------------------------
// get-chats
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ChatsResult {
    #[serde(default)]
    pub chats: Vec<Chat>,
}

/// Chat identifiers come back as numbers or strings depending on the chat kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Numeric(i64),
    Text(String),
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub chat_id: ChatId,
    pub updated_at: String,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    #[serde(default)]
    pub offer: Option<OfferRef>,
}

impl Chat {
    /// `true` when the last message was sent by the client to the agency.
    #[must_use]
    pub fn is_inbound(&self) -> bool {
        self.last_message
            .as_ref()
            .and_then(|m| m.direction.as_deref())
            == Some("in")
    }

    #[must_use]
    pub fn offer_id(&self) -> Option<i64> {
        self.offer.as_ref().and_then(|o| o.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LastMessage {
    /// `"in"` or `"out"`.
    #[serde(default)]
    pub direction: Option<String>,
}

/// Reference to a listing embedded in chat and call payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OfferRef {
    #[serde(default)]
    pub id: Option<i64>,
}

// ---------------------------------------------------------------------------
// get-calls-report
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct CallsResult {
    #[serde(default)]
    pub calls: Vec<Call>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Call {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub offer: Option<OfferRef>,
    pub date: String,
}

impl Call {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }

    #[must_use]
    pub fn offer_id(&self) -> Option<i64> {
        self.offer.as_ref().and_then(|o| o.id)
    }
}
