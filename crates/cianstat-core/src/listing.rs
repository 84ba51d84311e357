//! Listing and report-row types shared by every stage of a statistics run.
//!
//! A [`Listing`] is discovered once per advertisement and enriched in place.
//! The daily expansion then turns each listing into one [`ReportRow`] per day
//! of view data; rows are keyed by [`RowKey`] for the chat and call joins.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

/// Output format of `report_date`, e.g. `01.06.2024`.
pub const REPORT_DATE_FORMAT: &str = "%d.%m.%Y";

/// Output format of `publish_date`, e.g. `01.06.2024 10:15:00`.
pub const PUBLISH_DATE_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Deal type of a listing, derived from its public URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionKind {
    #[serde(rename = "Аренда")]
    Rental,
    #[serde(rename = "Продажа")]
    Sale,
}

impl TransactionKind {
    /// Classifies a listing URL: `rent` wins over `sale` when both appear.
    #[must_use]
    pub fn from_listing_url(url: &str) -> Option<Self> {
        if url.contains("rent") {
            Some(Self::Rental)
        } else if url.contains("sale") {
            Some(Self::Sale)
        } else {
            None
        }
    }

    /// Label written to the report.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Rental => "Аренда",
            Self::Sale => "Продажа",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Descriptive fields attached by the detail enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingDetails {
    pub listing_url: Option<String>,
    pub property_type: Option<String>,
    pub area: Option<String>,
    pub address: Option<String>,
    pub transaction_kind: Option<TransactionKind>,
}

/// One advertisement before daily expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub listing_id: i64,
    pub publish_date: NaiveDateTime,
    pub details: ListingDetails,
    pub auction_points: f64,
}

impl Listing {
    /// A freshly discovered listing: only the id and publish date are known.
    #[must_use]
    pub fn discovered(listing_id: i64, publish_date: NaiveDateTime) -> Self {
        Self {
            listing_id,
            publish_date,
            details: ListingDetails::default(),
            auction_points: 0.0,
        }
    }
}

/// Day-scoped metrics for one listing from the views-by-day series.
///
/// `likes` is `None` when the favorites series has no entry for the day,
/// which is different from a reported zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyViews {
    pub date: NaiveDate,
    pub views: i64,
    pub likes: Option<i64>,
}

/// Join key of an expanded row. Unique across a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey {
    pub listing_id: i64,
    pub report_date: NaiveDate,
}

/// One (listing, day) line of the final report.
///
/// Field order is the column order of the report sheet and the key order of
/// the JSON fallback dump.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(serialize_with = "serialize_report_date")]
    pub report_date: NaiveDate,
    pub listing_url: Option<String>,
    pub listing_id: i64,
    pub views: i64,
    pub calls: u32,
    pub chats: u32,
    pub likes: Option<i64>,
    pub auction_points: f64,
    #[serde(serialize_with = "serialize_publish_date")]
    pub publish_date: NaiveDateTime,
    pub property_type: Option<String>,
    #[serde(rename = "offers")]
    pub transaction_kind: Option<TransactionKind>,
    pub address: Option<String>,
    pub area: Option<String>,
}

impl ReportRow {
    /// Builds the row for `day` from the listing's immutable fields.
    ///
    /// Chat and call counts start at zero; the counters fill them in later.
    #[must_use]
    pub fn for_day(listing: &Listing, day: DailyViews) -> Self {
        let details = &listing.details;
        Self {
            report_date: day.date,
            listing_url: details.listing_url.clone(),
            listing_id: listing.listing_id,
            views: day.views,
            calls: 0,
            chats: 0,
            likes: day.likes,
            auction_points: listing.auction_points,
            publish_date: listing.publish_date,
            property_type: details.property_type.clone(),
            transaction_kind: details.transaction_kind,
            address: details.address.clone(),
            area: details.area.clone(),
        }
    }

    #[must_use]
    pub fn key(&self) -> RowKey {
        RowKey {
            listing_id: self.listing_id,
            report_date: self.report_date,
        }
    }

    /// `report_date` in report format.
    #[must_use]
    pub fn report_date_label(&self) -> String {
        self.report_date.format(REPORT_DATE_FORMAT).to_string()
    }

    /// `publish_date` in report format.
    #[must_use]
    pub fn publish_date_label(&self) -> String {
        self.publish_date.format(PUBLISH_DATE_FORMAT).to_string()
    }
}

/// Ordering applied to the final rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Calendar order of `report_date`.
    #[default]
    Chronological,
    /// Byte order of the `DD.MM.YYYY` label, as older reports were sorted.
    Lexicographic,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chronological" => Ok(Self::Chronological),
            "lexicographic" => Ok(Self::Lexicographic),
            other => Err(format!(
                "unknown sort order '{other}' (expected 'chronological' or 'lexicographic')"
            )),
        }
    }
}

fn serialize_report_date<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&date.format(REPORT_DATE_FORMAT))
}

fn serialize_publish_date<S: Serializer>(at: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&at.format(PUBLISH_DATE_FORMAT))
}
