//! In-memory [`StatsApi`] used by the pipeline unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use cianstat_api::{
    Announcement, ApiError, AuctionItem, Call, Chat, ChatId, LastMessage, OfferDetail, OfferRef,
    OfferSource, StatsApi, ViewsStatistics,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Request {
    Offers { source: OfferSource, page: u32 },
    Detail(Vec<i64>),
    Auction(Vec<i64>),
    Views(i64),
    Chats(u32),
    Calls(u32),
}

#[derive(Default)]
pub(crate) struct FakeApi {
    pub upload_pages: Vec<Vec<Announcement>>,
    pub manual_pages: Vec<Vec<Announcement>>,
    /// `(source, page)` that answers with a 500.
    pub failing_offer_page: Option<(OfferSource, u32)>,
    pub details: HashMap<i64, OfferDetail>,
    pub auction: HashMap<i64, f64>,
    pub views: HashMap<i64, ViewsStatistics>,
    pub chat_pages: Vec<Vec<Chat>>,
    pub call_pages: Vec<Vec<Call>>,
    pub fail_views: bool,
    pub requests: Mutex<Vec<Request>>,
}

impl FakeApi {
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: Request) {
        self.requests.lock().unwrap().push(request);
    }
}

pub(crate) fn server_error(endpoint: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        url: format!("http://fake/{endpoint}"),
        detail: "fake failure".to_owned(),
    }
}

fn page_of<T: Clone>(pages: &[Vec<T>], page: u32) -> Vec<T> {
    pages
        .get(page as usize - 1)
        .cloned()
        .unwrap_or_default()
}

impl StatsApi for FakeApi {
    async fn get_my_offers(
        &self,
        page: u32,
        _page_size: u32,
        source: OfferSource,
        _statuses: &[&str],
        _user_ids: Option<&[i64]>,
    ) -> Result<Vec<Announcement>, ApiError> {
        self.record(Request::Offers { source, page });
        if self.failing_offer_page == Some((source, page)) {
            return Err(server_error("get-my-offers"));
        }
        let pages = match source {
            OfferSource::Upload => &self.upload_pages,
            OfferSource::Manual => &self.manual_pages,
        };
        Ok(page_of(pages, page))
    }

    async fn get_my_offers_detail(&self, offer_ids: &[i64]) -> Result<Vec<OfferDetail>, ApiError> {
        self.record(Request::Detail(offer_ids.to_vec()));
        Ok(offer_ids
            .iter()
            .filter_map(|id| self.details.get(id).cloned())
            .collect())
    }

    async fn get_auction(&self, offer_ids: &[i64]) -> Result<Vec<AuctionItem>, ApiError> {
        self.record(Request::Auction(offer_ids.to_vec()));
        Ok(offer_ids
            .iter()
            .filter_map(|id| {
                self.auction.get(id).map(|bet| AuctionItem {
                    offer_id: *id,
                    current_bet: Some(*bet),
                })
            })
            .collect())
    }

    async fn get_views_statistics_by_days(
        &self,
        _date_from: &str,
        _date_to: &str,
        offer_id: i64,
    ) -> Result<ViewsStatistics, ApiError> {
        self.record(Request::Views(offer_id));
        if self.fail_views {
            return Err(server_error("get-views-statistics-by-days"));
        }
        Ok(self.views.get(&offer_id).cloned().unwrap_or_default())
    }

    async fn get_chats(
        &self,
        page: u32,
        _page_size: u32,
        _order_by: &str,
        _order_dir: &str,
        _employee_id: Option<i64>,
    ) -> Result<Vec<Chat>, ApiError> {
        self.record(Request::Chats(page));
        Ok(page_of(&self.chat_pages, page))
    }

    async fn get_calls_report(
        &self,
        page: u32,
        _page_size: u32,
        _date_from: &str,
        _date_to: &str,
        _employee_id: Option<i64>,
    ) -> Result<Vec<Call>, ApiError> {
        self.record(Request::Calls(page));
        Ok(page_of(&self.call_pages, page))
    }
}

pub(crate) fn announcement(id: i64, created: &str) -> Announcement {
    Announcement {
        id,
        creation_date: created.to_owned(),
    }
}

pub(crate) fn detail(id: i64, url: &str, title: &str) -> OfferDetail {
    OfferDetail {
        id,
        url: Some(url.to_owned()),
        title: Some(title.to_owned()),
        address: Some(format!("Москва, дом {id}")),
    }
}

pub(crate) fn chat(id: i64, updated_at: &str, direction: &str, listing_id: i64) -> Chat {
    Chat {
        chat_id: ChatId::Numeric(id),
        updated_at: updated_at.to_owned(),
        last_message: Some(LastMessage {
            direction: Some(direction.to_owned()),
        }),
        offer: Some(OfferRef {
            id: Some(listing_id),
        }),
    }
}

pub(crate) fn call(status: &str, listing_id: Option<i64>, date: &str) -> Call {
    Call {
        status: Some(status.to_owned()),
        offer: listing_id.map(|id| OfferRef { id: Some(id) }),
        date: date.to_owned(),
    }
}
