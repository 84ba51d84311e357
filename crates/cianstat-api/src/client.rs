//! HTTP client for the Cian public REST API.
//!
//! Wraps `reqwest` with bearer-token auth, server-error retry, and typed
//! response deserialization. Non-2xx responses surface as
//! [`ApiError::Status`] after the `result.errors` entries have been logged.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::api::StatsApi;
use crate::error::ApiError;
use crate::retry::retry_with_backoff;
use crate::types::{
    Announcement, ApiResponse, AuctionItem, AuctionResult, Call, CallsResult, Chat, ChatsResult,
    MyOffersResult, OfferDetail, OfferSource, OffersDetailResult, ViewsStatistics,
};

const DEFAULT_BASE_URL: &str = "https://public-api.cian.ru/";
const DEFAULT_USER_AGENT: &str = "cianstat/0.1 (listing-statistics)";

const MY_OFFERS: &str = "v2/get-my-offers";
const MY_OFFERS_DETAIL: &str = "v1/get-my-offers-detail";
const AUCTION: &str = "v1/get-auction";
const VIEWS_BY_DAYS: &str = "v1/get-views-statistics-by-days";
const CHATS: &str = "v1/get-chats";
const CALLS_REPORT: &str = "v2/get-calls-report";

/// Client for the Cian public API.
///
/// Use [`CianClient::new`] for production or [`CianClient::with_base_url`] to
/// point at a mock server in tests.
pub struct CianClient {
    client: Client,
    access_token: String,
    base_url: Url,
    /// Additional attempts after an upstream 5xx.
    max_retries: u32,
    backoff_base_ms: u64,
}

impl CianClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(access_token: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        Self::with_base_url(access_token, timeout_secs, DEFAULT_USER_AGENT, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`ApiError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn with_base_url(
        access_token: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so endpoint paths join under the base path.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            access_token: access_token.to_owned(),
            base_url,
            max_retries: 1,
            backoff_base_ms: 1_000,
        })
    }

    /// Overrides the server-error retry policy (default: one retry, 1 s base).
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Builds the endpoint URL with percent-encoded query parameters.
    ///
    /// Repeated keys encode list parameters (`offerIds=1&offerIds=2`).
    fn build_url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends a GET with retry on 5xx and decodes the `result` envelope.
    async fn get_result<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!(url = %url, "sending Cian API request");
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url.clone())
                    .bearer_auth(&self.access_token)
                    .send()
                    .await?;
                let status = response.status();
                let body = response.text().await?;

                if !status.is_success() {
                    return Err(Self::status_error(status.as_u16(), &url, &body));
                }

                let envelope: ApiResponse<T> =
                    serde_json::from_str(&body).map_err(|e| ApiError::Deserialize {
                        context: url.path().to_owned(),
                        source: e,
                    })?;
                Ok(envelope.result)
            }
        })
        .await
    }

    /// Logs every `result.errors` entry of a failed response and folds them
    /// into an [`ApiError::Status`].
    fn status_error(status: u16, url: &Url, body: &str) -> ApiError {
        let errors = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("result")?.get("errors")?.as_array().cloned())
            .unwrap_or_default();

        let mut messages = Vec::with_capacity(errors.len());
        for error in &errors {
            let field = |name: &str| {
                error
                    .get(name)
                    .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_owned))
                    .unwrap_or_default()
            };
            let (code, key, message) = (field("code"), field("key"), field("message"));
            tracing::error!(
                status,
                url = %url,
                code = %code,
                key = %key,
                message = %message,
                "Cian API rejected the request"
            );
            messages.push(if key.is_empty() {
                message
            } else {
                format!("{key}: {message}")
            });
        }
        if errors.is_empty() {
            tracing::error!(status, url = %url, "Cian API rejected the request");
        }

        ApiError::Status {
            status,
            url: url.to_string(),
            detail: if messages.is_empty() {
                "no error details in response".to_owned()
            } else {
                messages.join("; ")
            },
        }
    }
}

fn page_params(page: u32, page_size: u32, page_key: &'static str) -> Vec<(&'static str, String)> {
    vec![("page", page.to_string()), (page_key, page_size.to_string())]
}

impl StatsApi for CianClient {
    async fn get_my_offers(
        &self,
        page: u32,
        page_size: u32,
        source: OfferSource,
        statuses: &[&str],
        user_ids: Option<&[i64]>,
    ) -> Result<Vec<Announcement>, ApiError> {
        let mut params = page_params(page, page_size, "pageSize");
        params.push(("source", source.as_str().to_owned()));
        params.extend(statuses.iter().map(|s| ("statuses", (*s).to_owned())));
        if let Some(ids) = user_ids {
            params.extend(ids.iter().map(|id| ("userIds", id.to_string())));
        }
        let url = self.build_url(MY_OFFERS, &params)?;
        let result: MyOffersResult = self.get_result(url).await?;
        Ok(result.announcements)
    }

    async fn get_my_offers_detail(&self, offer_ids: &[i64]) -> Result<Vec<OfferDetail>, ApiError> {
        let params: Vec<_> = offer_ids
            .iter()
            .map(|id| ("offerIds", id.to_string()))
            .collect();
        let url = self.build_url(MY_OFFERS_DETAIL, &params)?;
        let result: OffersDetailResult = self.get_result(url).await?;
        Ok(result.offers)
    }

    async fn get_auction(&self, offer_ids: &[i64]) -> Result<Vec<AuctionItem>, ApiError> {
        let params: Vec<_> = offer_ids
            .iter()
            .map(|id| ("offerIds", id.to_string()))
            .collect();
        let url = self.build_url(AUCTION, &params)?;
        let result: AuctionResult = self.get_result(url).await?;
        Ok(result.items)
    }

    async fn get_views_statistics_by_days(
        &self,
        date_from: &str,
        date_to: &str,
        offer_id: i64,
    ) -> Result<ViewsStatistics, ApiError> {
        let params = [
            ("dateFrom", date_from.to_owned()),
            ("dateTo", date_to.to_owned()),
            ("offerId", offer_id.to_string()),
        ];
        let url = self.build_url(VIEWS_BY_DAYS, &params)?;
        self.get_result(url).await
    }

    async fn get_chats(
        &self,
        page: u32,
        page_size: u32,
        order_by: &str,
        order_dir: &str,
        employee_id: Option<i64>,
    ) -> Result<Vec<Chat>, ApiError> {
        let mut params = page_params(page, page_size, "page_size");
        params.push(("order_by", order_by.to_owned()));
        params.push(("order_dir", order_dir.to_owned()));
        if let Some(id) = employee_id {
            params.push(("employee_id", id.to_string()));
        }
        let url = self.build_url(CHATS, &params)?;
        let result: ChatsResult = self.get_result(url).await?;
        Ok(result.chats)
    }

    async fn get_calls_report(
        &self,
        page: u32,
        page_size: u32,
        date_from: &str,
        date_to: &str,
        employee_id: Option<i64>,
    ) -> Result<Vec<Call>, ApiError> {
        let mut params = vec![
            ("dateFrom", date_from.to_owned()),
            ("dateTo", date_to.to_owned()),
        ];
        if let Some(id) = employee_id {
            params.push(("employeeId", id.to_string()));
        }
        params.extend(page_params(page, page_size, "pageSize"));
        let url = self.build_url(CALLS_REPORT, &params)?;
        let result: CallsResult = self.get_result(url).await?;
        Ok(result.calls)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
