use std::collections::HashSet;

use prok_types::{LikeResponse, Post, PostPage};

use super::likes::{LikeOutcome, LikeOverlay, LikeTicket};
use super::{FilterState, PostsApi};
use crate::api::{ApiError, ApiResult, GetPostsParams, DEFAULT_PER_PAGE};
use crate::scroll::{InfiniteScroll, IntersectionEntry, LoadGate, SentinelHandle};

/// Whether a fetch starts the list over or extends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Reset,
    Append,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedStatus {
    /// Nothing requested yet
    Idle,
    Loading(FetchMode),
    Loaded,
    /// Last fetch failed; the list is left as it was
    Error(String),
}

/// One issued list fetch. Hand it back to [`FeedController::complete`]
/// together with the response.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub generation: u64,
    pub mode: FetchMode,
    pub params: GetPostsParams,
}

/// Effect of a fetch response on the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Replaced { count: usize },
    Appended { count: usize },
    Failed,
    /// Issued before the latest reset, dropped
    Stale,
}

/// Owns the visible post list for one set of filters.
///
/// Every filter change bumps a generation counter and restarts from page
/// one. Responses carry the generation they were issued under, so a slow
/// append that lands after a reset is discarded instead of overwriting the
/// fresh list.
#[derive(Debug)]
pub struct FeedController {
    filters: FilterState,
    per_page: u32,
    posts: Vec<Post>,
    /// Next page to request
    page: u32,
    has_more: bool,
    total: Option<u64>,
    status: FeedStatus,
    generation: u64,
    /// A reset was issued and has not landed; the list belongs to old filters
    awaiting_reset: bool,
    liked: HashSet<i64>,
    likes: LikeOverlay,
    notice: Option<String>,
}

impl Default for FeedController {
    fn default() -> Self {
        Self::new(FilterState::default(), DEFAULT_PER_PAGE)
    }
}

impl FeedController {
    pub fn new(filters: FilterState, per_page: u32) -> Self {
        Self {
            filters,
            per_page: per_page.max(1),
            posts: Vec::new(),
            page: 1,
            has_more: true,
            total: None,
            status: FeedStatus::Idle,
            generation: 0,
            awaiting_reset: false,
            liked: HashSet::new(),
            likes: LikeOverlay::default(),
            notice: None,
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Total matching posts, when the server reported it.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, FeedStatus::Loading(_))
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            FeedStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_liked(&self, post_id: i64) -> bool {
        self.liked.contains(&post_id)
    }

    pub fn like_pending(&self, post_id: i64) -> bool {
        self.likes.is_pending(post_id)
    }

    /// Flags the scroll trigger checks before loading another page.
    ///
    /// Stays closed after a failed reset until one succeeds, so a later page
    /// is never appended onto a list fetched under different filters.
    pub fn load_gate(&self) -> LoadGate {
        LoadGate {
            has_more: self.has_more && !self.awaiting_reset,
            loading: self.is_loading(),
        }
    }

    /// Take the last non-fatal message (a failed like), if any.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    // Fetching

    /// Start over from page one with `filters`. The current list stays
    /// visible until the response lands.
    pub fn begin_reset(&mut self, filters: FilterState) -> FetchTicket {
        self.filters = filters;
        self.generation += 1;
        self.page = 1;
        self.has_more = true;
        self.awaiting_reset = true;
        self.status = FeedStatus::Loading(FetchMode::Reset);

        log_feed!(
            "Reset feed (generation {}): {:?}",
            self.generation,
            self.filters
        );

        FetchTicket {
            generation: self.generation,
            mode: FetchMode::Reset,
            params: self.filters.to_params(1, self.per_page),
        }
    }

    /// Replace the filters. Returns `None` when nothing changed and the
    /// list has already been requested.
    pub fn set_filters(&mut self, filters: FilterState) -> Option<FetchTicket> {
        if filters == self.filters && self.status != FeedStatus::Idle {
            return None;
        }
        Some(self.begin_reset(filters))
    }

    /// Request the next page, unless a fetch is in flight or the feed is exhausted.
    pub fn begin_append(&mut self) -> Option<FetchTicket> {
        if !self.load_gate().is_open() {
            return None;
        }

        self.status = FeedStatus::Loading(FetchMode::Append);
        log_feed!("Append page {} (generation {})", self.page, self.generation);

        Some(FetchTicket {
            generation: self.generation,
            mode: FetchMode::Append,
            params: self.filters.to_params(self.page, self.per_page),
        })
    }

    /// Re-issue the first page with the current filters, e.g. after an error.
    pub fn retry(&mut self) -> FetchTicket {
        self.begin_reset(self.filters.clone())
    }

    /// Apply the response for `ticket`.
    pub fn complete(&mut self, ticket: FetchTicket, result: ApiResult<PostPage>) -> Applied {
        if ticket.generation != self.generation {
            log_feed!(
                "Dropping stale {:?} response (generation {}, current {})",
                ticket.mode,
                ticket.generation,
                self.generation
            );
            return Applied::Stale;
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                log::warn!(target: "feed", "Feed fetch failed: {}", e);
                self.status = FeedStatus::Error(e.user_message());
                return Applied::Failed;
            }
        };

        let count = page.posts.len();
        let requested = ticket.params.page.unwrap_or(self.page);

        let applied = match ticket.mode {
            FetchMode::Reset => {
                // Server truth replaces every optimistic like
                self.likes.clear();
                self.liked = liked_ids(&page.posts).collect();
                self.posts = page.posts;
                self.awaiting_reset = false;
                Applied::Replaced { count }
            }
            FetchMode::Append => {
                self.liked.extend(liked_ids(&page.posts));
                self.posts.extend(page.posts);
                Applied::Appended { count }
            }
        };

        self.page = requested + 1;
        self.has_more = page.has_more;
        if page.total.is_some() {
            self.total = page.total;
        }
        self.status = FeedStatus::Loaded;

        log_feed!(
            "{:?} applied: {} posts, next page {}, has_more={}",
            ticket.mode,
            count,
            self.page,
            self.has_more
        );

        applied
    }

    /// Feed a sentinel visibility event through the scroll trigger.
    pub fn on_sentinel(
        &mut self,
        scroll: &InfiniteScroll,
        handle: &SentinelHandle,
        entries: &[IntersectionEntry],
    ) -> Option<FetchTicket> {
        if scroll.observe(handle, entries, self.load_gate()) {
            self.begin_append()
        } else {
            None
        }
    }

    // Likes

    /// Optimistically flip the like on `post_id`. Returns `None` if the post
    /// is not in the list.
    pub fn toggle_like(&mut self, post_id: i64) -> Option<LikeTicket> {
        let previous_count = self.posts.iter().find(|p| p.id == post_id)?.likes_count;
        let was_liked = self.liked.contains(&post_id);

        let likes_count = match self.likes.pending(post_id) {
            // Clicking back before the server answers restores the exact count
            Some(pending) => pending.previous_count,
            None if was_liked => (previous_count - 1).max(0),
            None => previous_count + 1,
        };
        self.set_like_state(post_id, !was_liked, likes_count);

        log_feed!(
            "Like toggled on post {}: liked={}, count {} -> {}",
            post_id,
            !was_liked,
            previous_count,
            likes_count
        );

        Some(self.likes.record(post_id, was_liked, previous_count))
    }

    /// Reconcile the server's answer for a like click.
    pub fn complete_like(
        &mut self,
        ticket: LikeTicket,
        result: ApiResult<LikeResponse>,
    ) -> LikeOutcome {
        let Some(pending) = self.likes.settle(&ticket) else {
            log_feed!("Ignoring superseded like response for post {}", ticket.post_id);
            return LikeOutcome::Superseded;
        };

        match result {
            Ok(response) => {
                let liked = response.liked.unwrap_or(ticket.liked);
                self.set_like_state(ticket.post_id, liked, response.likes_count);
                LikeOutcome::Confirmed {
                    likes_count: response.likes_count,
                }
            }
            Err(e) => {
                // Revert optimistic update on error
                self.set_like_state(ticket.post_id, pending.was_liked, pending.previous_count);
                let message = like_failure_message(&e);
                log::warn!(target: "feed", "Like on post {} failed: {}", ticket.post_id, e);
                self.notice = Some(message.clone());
                LikeOutcome::RolledBack(message)
            }
        }
    }

    fn set_like_state(&mut self, post_id: i64, liked: bool, likes_count: i64) {
        if liked {
            self.liked.insert(post_id);
        } else {
            self.liked.remove(&post_id);
        }
        // The list is not de-duplicated, so a post may appear more than once
        for post in self.posts.iter_mut().filter(|p| p.id == post_id) {
            post.likes_count = likes_count;
            post.liked_by_me = Some(liked);
        }
    }

    // Async drivers

    /// Fetch the first page with the current filters.
    pub async fn reload<A>(&mut self, api: &A) -> Applied
    where
        A: PostsApi + ?Sized,
    {
        let ticket = self.retry();
        let result = api.fetch_posts(&ticket.params).await;
        self.complete(ticket, result)
    }

    /// Switch to `filters` and fetch their first page. `None` when unchanged.
    pub async fn apply_filters<A>(&mut self, api: &A, filters: FilterState) -> Option<Applied>
    where
        A: PostsApi + ?Sized,
    {
        let ticket = self.set_filters(filters)?;
        let result = api.fetch_posts(&ticket.params).await;
        Some(self.complete(ticket, result))
    }

    /// Fetch the next page if allowed.
    pub async fn load_more<A>(&mut self, api: &A) -> Option<Applied>
    where
        A: PostsApi + ?Sized,
    {
        let ticket = self.begin_append()?;
        let result = api.fetch_posts(&ticket.params).await;
        Some(self.complete(ticket, result))
    }

    /// Toggle the like on `post_id` and wait for the server.
    pub async fn like<A>(&mut self, api: &A, post_id: i64) -> Option<LikeOutcome>
    where
        A: PostsApi + ?Sized,
    {
        let ticket = self.toggle_like(post_id)?;
        let result = api.like_post(post_id).await;
        Some(self.complete_like(ticket, result))
    }
}

fn liked_ids(posts: &[Post]) -> impl Iterator<Item = i64> + '_ {
    posts
        .iter()
        .filter(|p| p.liked_by_me == Some(true))
        .map(|p| p.id)
}

fn like_failure_message(error: &ApiError) -> String {
    format!("Could not update like: {}", error.user_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::{Debouncer, SEARCH_DEBOUNCE};
    use async_trait::async_trait;
    use prok_types::{SortField, Visibility};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    fn post(id: i64, likes: i64) -> Post {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "user_id": 1,
            "content": format!("post {}", id),
            "likes_count": likes,
        }))
        .unwrap()
    }

    fn page(ids: std::ops::Range<i64>, has_more: bool) -> PostPage {
        PostPage {
            posts: ids.map(|id| post(id, 0)).collect(),
            has_more,
            total: None,
        }
    }

    /// Scripted backend: hands out queued results and records every request.
    #[derive(Default)]
    struct MockApi {
        pages: Mutex<VecDeque<ApiResult<PostPage>>>,
        likes: Mutex<VecDeque<ApiResult<LikeResponse>>>,
        requests: Mutex<Vec<GetPostsParams>>,
    }

    impl MockApi {
        fn with_pages(pages: Vec<ApiResult<PostPage>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                ..Default::default()
            }
        }

        fn push_like(&self, result: ApiResult<LikeResponse>) {
            self.likes.lock().unwrap().push_back(result);
        }

        fn requests(&self) -> Vec<GetPostsParams> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PostsApi for MockApi {
        async fn fetch_posts(&self, params: &GetPostsParams) -> ApiResult<PostPage> {
            self.requests.lock().unwrap().push(params.clone());
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(page(0..0, false)))
        }

        async fn like_post(&self, _post_id: i64) -> ApiResult<LikeResponse> {
            self.likes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::NotFound("no scripted like".to_string())))
        }
    }

    fn like_ok(likes_count: i64) -> ApiResult<LikeResponse> {
        Ok(LikeResponse {
            message: None,
            likes_count,
            liked: None,
        })
    }

    #[tokio::test]
    async fn test_initial_load_then_append() {
        let api = MockApi::with_pages(vec![Ok(page(1..11, true)), Ok(page(11..16, false))]);
        let mut feed = FeedController::default();

        assert_eq!(feed.reload(&api).await, Applied::Replaced { count: 10 });
        assert_eq!(feed.page(), 2);
        assert!(feed.has_more());

        assert_eq!(
            feed.load_more(&api).await,
            Some(Applied::Appended { count: 5 })
        );
        assert_eq!(feed.posts().len(), 15);
        assert_eq!(feed.page(), 3);
        assert!(!feed.has_more());

        // Exhausted: no further request goes out
        assert_eq!(feed.load_more(&api).await, None);
        let pages: Vec<_> = api.requests().iter().map(|p| p.page).collect();
        assert_eq!(pages, vec![Some(1), Some(2)]);
    }

    #[tokio::test]
    async fn test_filter_change_replaces_list() {
        let api = MockApi::with_pages(vec![
            Ok(page(1..11, true)),
            Ok(page(11..21, true)),
            Ok(page(100..103, false)),
        ]);
        let mut feed = FeedController::default();
        feed.reload(&api).await;
        feed.load_more(&api).await;
        assert_eq!(feed.page(), 3);

        let filters = FilterState::default().with_search("rust");
        let applied = feed.apply_filters(&api, filters).await;

        assert_eq!(applied, Some(Applied::Replaced { count: 3 }));
        let ids: Vec<_> = feed.posts().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![100, 101, 102]);
        assert_eq!(feed.page(), 2);
        assert_eq!(api.requests()[2].page, Some(1));
        assert_eq!(api.requests()[2].search.as_deref(), Some("rust"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_search_resets_once() {
        let api = MockApi::with_pages(vec![Ok(page(1..11, true)), Ok(page(40..42, false))]);
        let mut feed = FeedController::default();
        feed.reload(&api).await;

        let search = Debouncer::new(String::new(), SEARCH_DEBOUNCE);
        let mut settled = search.subscribe();
        for text in ["r", "ru", "rus", "rust"] {
            search.set(text.to_string());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        settled.changed().await.unwrap();
        let text = settled.borrow_and_update().clone();
        let filters = feed.filters().clone().with_search(text);
        assert_eq!(
            feed.apply_filters(&api, filters).await,
            Some(Applied::Replaced { count: 2 })
        );

        // Nothing else settles afterwards
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!settled.has_changed().unwrap());

        let requests = api.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].page, Some(1));
        assert_eq!(requests[1].search.as_deref(), Some("rust"));
        let ids: Vec<_> = feed.posts().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![40, 41]);
    }

    #[tokio::test]
    async fn test_unchanged_filters_do_not_refetch() {
        let api = MockApi::with_pages(vec![Ok(page(1..3, false))]);
        let mut feed = FeedController::default();
        feed.reload(&api).await;

        let same = feed.filters().clone();
        assert_eq!(feed.apply_filters(&api, same).await, None);
        assert_eq!(api.requests().len(), 1);
    }

    #[test]
    fn test_category_filter_request() {
        let mut feed = FeedController::default();
        let ticket = feed
            .set_filters(FilterState::default().with_category(Some("Technology".to_string())))
            .unwrap();

        assert_eq!(ticket.params.page, Some(1));
        assert_eq!(ticket.params.category.as_deref(), Some("Technology"));
        assert_eq!(ticket.params.search, None);
        assert!(ticket.params.tags.is_empty());
    }

    #[test]
    fn test_sentinel_does_not_fetch_while_loading() {
        let mut feed = FeedController::default();
        let ticket = feed.begin_reset(FilterState::default());
        feed.complete(ticket, Ok(page(1..11, true)));

        let mut scroll = InfiniteScroll::default();
        let handle = scroll.attach();
        let visible = [IntersectionEntry {
            is_intersecting: true,
            intersection_ratio: 1.0,
        }];

        let first = feed.on_sentinel(&scroll, &handle, &visible);
        assert!(first.is_some());
        assert!(feed.is_loading());

        for _ in 0..10 {
            assert!(feed.on_sentinel(&scroll, &handle, &visible).is_none());
        }

        if let Some(ticket) = first {
            feed.complete(ticket, Ok(page(11..21, true)));
        }
        assert!(feed.on_sentinel(&scroll, &handle, &visible).is_some());
    }

    #[test]
    fn test_stale_append_is_dropped_after_reset() {
        let mut feed = FeedController::default();
        let ticket = feed.begin_reset(FilterState::default());
        feed.complete(ticket, Ok(page(1..11, true)));

        let append = feed.begin_append().unwrap();
        let reset = feed.begin_reset(FilterState::default().with_visibility(Some(Visibility::Public)));

        assert_eq!(
            feed.complete(reset, Ok(page(50..52, false))),
            Applied::Replaced { count: 2 }
        );
        assert_eq!(feed.complete(append, Ok(page(11..21, true))), Applied::Stale);

        let ids: Vec<_> = feed.posts().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![50, 51]);
        assert!(!feed.has_more());
        assert_eq!(feed.status(), &FeedStatus::Loaded);
    }

    #[test]
    fn test_stale_reset_is_dropped() {
        let mut feed = FeedController::default();
        let older = feed.begin_reset(FilterState::default().with_search("a"));
        let newer = feed.begin_reset(FilterState::default().with_search("ab"));

        feed.complete(newer, Ok(page(1..3, false)));
        assert_eq!(feed.complete(older, Ok(page(90..99, true))), Applied::Stale);
        assert_eq!(feed.posts().len(), 2);
    }

    #[test]
    fn test_error_keeps_list_and_allows_retry() {
        let mut feed = FeedController::default();
        let ticket = feed.begin_reset(FilterState::default());
        feed.complete(ticket, Ok(page(1..11, true)));

        let append = feed.begin_append().unwrap();
        let applied = feed.complete(
            append,
            Err(ApiError::Api {
                status: 500,
                message: "Failed to fetch posts".to_string(),
            }),
        );

        assert_eq!(applied, Applied::Failed);
        assert_eq!(feed.error(), Some("Failed to fetch posts"));
        assert_eq!(feed.posts().len(), 10);
        assert_eq!(feed.page(), 2);

        let retry = feed.retry();
        assert_eq!(retry.params.page, Some(1));
        assert_eq!(retry.mode, FetchMode::Reset);
        assert!(feed.is_loading());

        feed.complete(retry, Ok(page(1..11, true)));
        assert_eq!(feed.error(), None);
    }

    #[test]
    fn test_failed_reset_blocks_append_until_reset_lands() {
        let mut feed = FeedController::default();
        let ticket = feed.begin_reset(FilterState::default());
        feed.complete(ticket, Ok(page(1..4, true)));

        let reset =
            feed.begin_reset(FilterState::default().with_category(Some("Technology".to_string())));
        let applied = feed.complete(
            reset,
            Err(ApiError::Api {
                status: 500,
                message: "Failed to fetch posts".to_string(),
            }),
        );
        assert_eq!(applied, Applied::Failed);
        assert!(!feed.load_gate().is_open());
        assert!(feed.begin_append().is_none());

        let mut scroll = InfiniteScroll::default();
        let handle = scroll.attach();
        let visible = [IntersectionEntry {
            is_intersecting: true,
            intersection_ratio: 1.0,
        }];
        assert!(feed.on_sentinel(&scroll, &handle, &visible).is_none());

        // Old list is still shown, untouched
        let ids: Vec<_> = feed.posts().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let retry = feed.retry();
        assert_eq!(retry.params.category.as_deref(), Some("Technology"));
        assert_eq!(
            feed.complete(retry, Ok(page(100..102, true))),
            Applied::Replaced { count: 2 }
        );
        let append = feed.begin_append().unwrap();
        assert_eq!(append.params.page, Some(2));
    }

    #[test]
    fn test_append_keeps_duplicates_in_server_order() {
        let mut feed = FeedController::default();
        let ticket = feed.begin_reset(FilterState::default());
        feed.complete(ticket, Ok(page(1..4, true)));

        let append = feed.begin_append().unwrap();
        feed.complete(append, Ok(page(3..6, false)));

        let ids: Vec<_> = feed.posts().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 3, 4, 5]);
    }

    #[test]
    fn test_double_like_restores_counter() {
        let mut feed = FeedController::default();
        let ticket = feed.begin_reset(FilterState::default());
        feed.complete(
            ticket,
            Ok(PostPage {
                posts: vec![post(1, 7)],
                has_more: false,
                total: Some(1),
            }),
        );

        feed.toggle_like(1).unwrap();
        assert_eq!(feed.posts()[0].likes_count, 8);
        assert!(feed.is_liked(1));

        feed.toggle_like(1).unwrap();
        assert_eq!(feed.posts()[0].likes_count, 7);
        assert!(!feed.is_liked(1));
    }

    #[test]
    fn test_double_unlike_at_zero_restores_counter() {
        let mut inconsistent = post(1, 0);
        inconsistent.liked_by_me = Some(true);

        let mut feed = FeedController::default();
        let ticket = feed.begin_reset(FilterState::default());
        feed.complete(
            ticket,
            Ok(PostPage {
                posts: vec![inconsistent],
                has_more: false,
                total: None,
            }),
        );

        feed.toggle_like(1).unwrap();
        assert_eq!(feed.posts()[0].likes_count, 0);
        assert!(!feed.is_liked(1));

        feed.toggle_like(1).unwrap();
        assert_eq!(feed.posts()[0].likes_count, 0);
        assert!(feed.is_liked(1));
    }

    #[test]
    fn test_superseded_like_response_is_ignored() {
        let mut feed = FeedController::default();
        let ticket = feed.begin_reset(FilterState::default());
        feed.complete(ticket, Ok(PostPage { posts: vec![post(1, 7)], has_more: false, total: None }));

        let first = feed.toggle_like(1).unwrap();
        let second = feed.toggle_like(1).unwrap();

        assert_eq!(feed.complete_like(first, like_ok(8)), LikeOutcome::Superseded);
        assert_eq!(feed.posts()[0].likes_count, 7);

        assert_eq!(
            feed.complete_like(second, like_ok(7)),
            LikeOutcome::Confirmed { likes_count: 7 }
        );
        assert!(!feed.like_pending(1));
    }

    #[tokio::test]
    async fn test_like_adopts_server_counter() {
        let api = MockApi::with_pages(vec![Ok(PostPage {
            posts: vec![post(1, 7)],
            has_more: false,
            total: None,
        })]);
        api.push_like(like_ok(12));

        let mut feed = FeedController::default();
        feed.reload(&api).await;

        let outcome = feed.like(&api, 1).await;
        assert_eq!(outcome, Some(LikeOutcome::Confirmed { likes_count: 12 }));
        assert_eq!(feed.posts()[0].likes_count, 12);
        assert!(feed.is_liked(1));
        assert_eq!(feed.posts()[0].liked_by_me, Some(true));
    }

    #[tokio::test]
    async fn test_like_failure_rolls_back() {
        let api = MockApi::with_pages(vec![Ok(PostPage {
            posts: vec![post(1, 7)],
            has_more: false,
            total: None,
        })]);
        api.push_like(Err(ApiError::Api {
            status: 500,
            message: "Failed to like post".to_string(),
        }));

        let mut feed = FeedController::default();
        feed.reload(&api).await;

        let outcome = feed.like(&api, 1).await;
        assert!(matches!(outcome, Some(LikeOutcome::RolledBack(_))));
        assert_eq!(feed.posts()[0].likes_count, 7);
        assert!(!feed.is_liked(1));
        assert_eq!(
            feed.take_notice().as_deref(),
            Some("Could not update like: Failed to like post")
        );
        assert_eq!(feed.take_notice(), None);
    }

    #[test]
    fn test_liked_state_comes_from_server() {
        let mut liked = post(2, 4);
        liked.liked_by_me = Some(true);

        let mut feed = FeedController::default();
        let ticket = feed.begin_reset(FilterState::default());
        feed.complete(
            ticket,
            Ok(PostPage {
                posts: vec![post(1, 0), liked],
                has_more: false,
                total: None,
            }),
        );

        assert!(!feed.is_liked(1));
        assert!(feed.is_liked(2));

        // Unliking a server-liked post decrements
        feed.toggle_like(2).unwrap();
        assert_eq!(feed.posts()[1].likes_count, 3);
    }

    #[test]
    fn test_like_unknown_post_is_ignored() {
        let mut feed = FeedController::default();
        assert!(feed.toggle_like(99).is_none());
    }

    #[test]
    fn test_reset_discards_pending_likes() {
        let mut feed = FeedController::default();
        let ticket = feed.begin_reset(FilterState::default());
        feed.complete(ticket, Ok(PostPage { posts: vec![post(1, 7)], has_more: false, total: None }));

        let like = feed.toggle_like(1).unwrap();
        let reset = feed.begin_reset(FilterState::default().with_sort(SortField::LikesCount, Default::default()));
        feed.complete(reset, Ok(PostPage { posts: vec![post(1, 9)], has_more: false, total: None }));

        assert_eq!(
            feed.complete_like(like, Err(ApiError::MissingToken)),
            LikeOutcome::Superseded
        );
        assert_eq!(feed.posts()[0].likes_count, 9);
        assert!(feed.take_notice().is_none());
    }
}
