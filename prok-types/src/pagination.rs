use serde::{Deserialize, Serialize};

use crate::models::Post;

/// Pagination block of the current `/api/posts` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub has_more: bool,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub pages: Option<u32>,
}

/// Raw `/api/posts` body.
///
/// Two shapes exist in the wild: `{posts, pagination: {has_more, ..}}` and the
/// older `{posts, has_more, count}`. Both deserialize into this struct and are
/// flattened by [`PostsEnvelope::into_page`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostsEnvelope {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub pagination: Option<PaginationMeta>,
    #[serde(default)]
    pub has_more: Option<bool>,
    #[serde(default)]
    pub count: Option<u64>,
}

/// One page of posts with a single, normalized "more available" flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub has_more: bool,
    pub total: Option<u64>,
}

impl PostsEnvelope {
    /// Normalize either response shape. The nested block wins when both are
    /// present; with neither, a full page is taken to mean more may follow.
    pub fn into_page(self, per_page: u32) -> PostPage {
        let has_more = match (&self.pagination, self.has_more) {
            (Some(meta), _) => meta.has_more,
            (None, Some(flag)) => flag,
            (None, None) => per_page > 0 && self.posts.len() >= per_page as usize,
        };
        let total = self.pagination.as_ref().and_then(|meta| meta.total);

        PostPage {
            posts: self.posts,
            has_more,
            total,
        }
    }
}
