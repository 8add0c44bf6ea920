use prok_types::{SortDirection, SortField, Visibility};
use serde::{Deserialize, Serialize};

use crate::api::GetPostsParams;

/// Selections of the feed's filter bar.
///
/// Treated as a value: every edit produces a new `FilterState`, and a feed
/// whose filters change identity starts again from page one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub search: String,
    pub category: Option<String>,
    pub visibility: Option<Visibility>,
    pub tags: Vec<String>,
    pub sort_by: SortField,
    pub sort_order: SortDirection,
    /// Restrict the feed to one author (profile pages)
    pub user_id: Option<i64>,
}

impl FilterState {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn with_visibility(mut self, visibility: Option<Visibility>) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_sort(mut self, sort_by: SortField, sort_order: SortDirection) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    pub fn with_user(mut self, user_id: Option<i64>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Add the tag if absent, remove it if present.
    pub fn toggled_tag(mut self, tag: &str) -> Self {
        if let Some(pos) = self.tags.iter().position(|t| t == tag) {
            self.tags.remove(pos);
        } else {
            self.tags.push(tag.to_string());
        }
        self
    }

    /// Back to defaults, keeping the author scope.
    pub fn cleared(&self) -> Self {
        Self {
            user_id: self.user_id,
            ..Self::default()
        }
    }

    pub fn has_active_filters(&self) -> bool {
        !self.search.trim().is_empty()
            || self
                .category
                .as_deref()
                .is_some_and(|c| !c.trim().is_empty())
            || self.visibility.is_some()
            || !self.tags.is_empty()
    }

    /// Request parameters for one page. Empty selections are left out of the
    /// query entirely rather than sent as empty values.
    pub fn to_params(&self, page: u32, per_page: u32) -> GetPostsParams {
        let search = self.search.trim();
        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        GetPostsParams {
            page: Some(page),
            per_page: Some(per_page),
            user_id: self.user_id,
            search: (!search.is_empty()).then(|| search.to_string()),
            category: category.map(str::to_string),
            visibility: self.visibility,
            tags: self
                .tags
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            sort_by: Some(self.sort_by),
            sort_order: Some(self.sort_order),
        }
    }
}
