//! The paginated post feed: filter selections, the list controller and the
//! backend seam it fetches through.

mod controller;
mod filters;
mod likes;

pub use controller::{Applied, FeedController, FeedStatus, FetchMode, FetchTicket};
pub use filters::FilterState;
pub use likes::{LikeOutcome, LikeOverlay, LikeTicket};

use async_trait::async_trait;
use prok_types::{LikeResponse, PostPage};

use crate::api::{ApiResult, GetPostsParams};

/// The backend calls the feed needs. Implemented by
/// [`ApiClient`](crate::api::ApiClient); tests substitute an in-memory one.
#[async_trait]
pub trait PostsApi: Send + Sync {
    async fn fetch_posts(&self, params: &GetPostsParams) -> ApiResult<PostPage>;

    async fn like_post(&self, post_id: i64) -> ApiResult<LikeResponse>;
}
