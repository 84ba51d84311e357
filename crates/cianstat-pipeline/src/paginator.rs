//! Page-number driven fetch loop shared by every paginated Cian endpoint.

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use cianstat_api::ApiError;

use crate::error::PipelineError;

/// Maximum number of pages pulled from one feed before giving up.
///
/// Cian signals the end of a feed with an empty page; this guards against a
/// feed that never sends one.
pub const MAX_PAGES: u32 = 500;

/// Lazily walks pages `1, 2, 3, …` of a feed until one comes back empty.
///
/// `fetch` receives the 1-based page number. `delay` is slept before every
/// page except the first to stay under the upstream rate limit. Errors from
/// `fetch` are returned as-is; retrying is the client's job. A paginator is
/// not restartable: once exhausted it keeps returning `Ok(None)`.
pub struct Paginator<T, F> {
    feed: &'static str,
    fetch: F,
    next_page: u32,
    delay: Duration,
    exhausted: bool,
    _items: PhantomData<fn() -> T>,
}

impl<T, F, Fut> Paginator<T, F>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ApiError>>,
{
    pub fn new(feed: &'static str, delay: Duration, fetch: F) -> Self {
        Self {
            feed,
            fetch,
            next_page: 1,
            delay,
            exhausted: false,
            _items: PhantomData,
        }
    }

    /// Fetches the next non-empty page, or `None` once the feed is exhausted.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Api`] when the page request fails; the paginator is
    ///   then exhausted.
    /// - [`PipelineError::PaginationLimit`] past [`MAX_PAGES`] pages.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>, PipelineError> {
        if self.exhausted {
            return Ok(None);
        }
        if self.next_page > MAX_PAGES {
            self.exhausted = true;
            return Err(PipelineError::PaginationLimit {
                feed: self.feed.to_owned(),
                max_pages: MAX_PAGES,
            });
        }

        let page = self.next_page;
        if page > 1 && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.next_page += 1;

        tracing::debug!(feed = self.feed, page, "fetching page");
        let items = match (self.fetch)(page).await {
            Ok(items) => items,
            Err(e) => {
                self.exhausted = true;
                return Err(e.into());
            }
        };

        if items.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }
        Ok(Some(items))
    }

    /// Number of page requests issued so far.
    #[must_use]
    pub fn pages_requested(&self) -> u32 {
        self.next_page - 1
    }
}
