use prok::api::ApiClient;
use prok::feed::{Applied, FeedController, FeedStatus, FilterState, LikeOutcome};
use prok::scroll::{InfiniteScroll, IntersectionEntry, ScrollOptions};
use prok::session::Session;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn posts(ids: std::ops::Range<i64>) -> Vec<serde_json::Value> {
    ids.map(|id| {
        json!({
            "id": id,
            "user_id": 1,
            "content": format!("Post {}", id),
            "likes_count": 3,
            "liked_by_me": id == 2
        })
    })
    .collect()
}

fn page_body(ids: std::ops::Range<i64>, has_more: bool) -> serde_json::Value {
    json!({"posts": posts(ids), "pagination": {"has_more": has_more}})
}

#[tokio::test]
async fn test_scroll_pages_through_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1..11, true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(11..14, false)))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::with_session(server.uri(), Session::with_token("token-abc"));
    let mut feed = FeedController::default();
    assert_eq!(feed.reload(&api).await, Applied::Replaced { count: 10 });
    assert!(feed.is_liked(2));

    let mut scroll = InfiniteScroll::new(ScrollOptions::default());
    let handle = scroll.attach();

    // Sentinel 40 rows below an 800-row viewport, inside the default margin
    let entry = IntersectionEntry::measure(800.0, 840.0, 1.0, scroll.options().root_margin);
    while let Some(ticket) = feed.on_sentinel(&scroll, &handle, &[entry]) {
        let result = api.get_posts(&ticket.params).await;
        feed.complete(ticket, result);
    }

    assert_eq!(feed.posts().len(), 13);
    assert!(!feed.has_more());
    assert_eq!(feed.status(), &FeedStatus::Loaded);
}

#[tokio::test]
async fn test_category_filter_scenario() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("category", "Technology"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(20..22, false)))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::with_session(server.uri(), Session::with_token("token-abc"));
    let mut feed = FeedController::default();
    let applied = feed
        .apply_filters(
            &api,
            FilterState::default().with_category(Some("Technology".to_string())),
        )
        .await;

    assert_eq!(applied, Some(Applied::Replaced { count: 2 }));

    let requests = server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default().to_string();
    assert!(!query.contains("search="));
    assert!(!query.contains("tags="));
}

#[tokio::test]
async fn test_fetch_error_then_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "Failed to fetch posts"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1..4, false)))
        .mount(&server)
        .await;

    let api = ApiClient::with_session(server.uri(), Session::with_token("token-abc"));
    let mut feed = FeedController::default();

    assert_eq!(feed.reload(&api).await, Applied::Failed);
    assert_eq!(feed.error(), Some("Failed to fetch posts"));

    assert_eq!(feed.reload(&api).await, Applied::Replaced { count: 3 });
    assert_eq!(feed.error(), None);
}

#[tokio::test]
async fn test_like_failure_rolls_back_against_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1..3, false)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/posts/1/like"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Post not found"})))
        .mount(&server)
        .await;

    let api = ApiClient::with_session(server.uri(), Session::with_token("token-abc"));
    let mut feed = FeedController::default();
    feed.reload(&api).await;

    let outcome = feed.like(&api, 1).await;
    assert_eq!(
        outcome,
        Some(LikeOutcome::RolledBack(
            "Could not update like: Post not found".to_string()
        ))
    );
    assert_eq!(feed.posts()[0].likes_count, 3);
    assert!(!feed.is_liked(1));
}
