use cianstat_api::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("pagination limit reached for {feed}: exceeded {max_pages} pages")]
    PaginationLimit { feed: String, max_pages: u32 },

    #[error("unparseable timestamp in {context}: '{value}'")]
    InvalidTimestamp { context: String, value: String },
}
