mod client;
mod error;
mod query;

pub use client::{ApiClient, DEFAULT_PER_PAGE, DEFAULT_SERVER_URL};
pub use error::{categorize_error, ApiError, ApiResult};
pub use query::GetPostsParams;
