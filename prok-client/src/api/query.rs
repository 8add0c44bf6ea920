use prok_types::{SortDirection, SortField, Visibility};

/// Query parameters for `GET /api/posts`.
///
/// Only keys that are set end up on the wire; `tags` is sent as one
/// comma-joined value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetPostsParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub user_id: Option<i64>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub visibility: Option<Visibility>,
    pub tags: Vec<String>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortDirection>,
}

impl GetPostsParams {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();

        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            query.push(("per_page", per_page.to_string()));
        }
        if let Some(user_id) = self.user_id {
            query.push(("user_id", user_id.to_string()));
        }
        if let Some(search) = &self.search {
            query.push(("search", search.clone()));
        }
        if let Some(category) = &self.category {
            query.push(("category", category.clone()));
        }
        if let Some(visibility) = self.visibility {
            query.push(("visibility", visibility.as_str().to_string()));
        }
        if !self.tags.is_empty() {
            query.push(("tags", self.tags.join(",")));
        }
        if let Some(sort_by) = self.sort_by {
            query.push(("sort_by", sort_by.as_str().to_string()));
        }
        if let Some(sort_order) = self.sort_order {
            query.push(("sort_order", sort_order.as_str().to_string()));
        }

        query
    }

    /// Value of a single key as it would be sent.
    pub fn get(&self, key: &str) -> Option<String> {
        self.to_query()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}
