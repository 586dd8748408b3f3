//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: WpClient → executor → reqwest → WordPress-shaped responses

use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wp_rest_client::http::{HeaderInjector, RequestHook, RequestState};
use wp_rest_client::schema::{JsonShape, JsonType};
use wp_rest_client::{ClientConfig, ErrorKind, RequestOptions, Schema, WpClient};

const API: &str = "/wp-json/wp/v2";

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .base_url(format!("{}{API}", server.uri()))
        .backoff(Duration::from_millis(10), 2.0, Duration::from_millis(100))
        .no_rate_limit()
        .build()
}

fn client(server: &MockServer) -> WpClient {
    WpClient::new(config(server)).unwrap()
}

/// Collects the delay of every scheduled retry
#[derive(Default)]
struct RetryDelays(Mutex<Vec<Duration>>);

impl RequestHook for RetryDelays {
    fn on_transition(&self, _request_id: Uuid, state: &RequestState) {
        if let RequestState::Retrying { delay, .. } = state {
            self.0.lock().unwrap().push(*delay);
        }
    }
}

#[derive(Debug, Deserialize)]
struct Post {
    id: u64,
    title: String,
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_list_posts_with_pagination_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/posts")))
        .and(query_param("per_page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([
                    {"id": 1, "title": "Hello"},
                    {"id": 2, "title": "World"}
                ]))
                .insert_header("X-WP-Total", "12")
                .insert_header("X-WP-TotalPages", "6"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .resource("posts")
        .list(RequestOptions::new().param("per_page", 2))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.headers.total_items, Some(12));
    assert_eq!(response.headers.total_pages, Some(6));

    let posts: Vec<Post> = response.json().unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[1].id, 2);
    assert_eq!(posts[0].title, "Hello");
}

#[tokio::test]
async fn test_repeated_get_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/categories")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let first = client.get("categories", RequestOptions::new()).await.unwrap();
    let second = client.get("categories", RequestOptions::new()).await.unwrap();

    assert_eq!(first.data, second.data);
    let stats = client.stats();
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache_misses, 1);
    assert_eq!(stats.successful_requests, 2);
}

#[tokio::test]
async fn test_list_all_walks_every_page() {
    let server = MockServer::start().await;
    for (page, body) in [("1", json!([{"id": 1}, {"id": 2}])), ("2", json!([{"id": 3}]))] {
        Mock::given(method("GET"))
            .and(path(format!("{API}/tags")))
            .and(query_param("page", page))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(body)
                    .insert_header("X-WP-TotalPages", "2"),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let tags = client(&server)
        .resource("tags")
        .list_all(RequestOptions::new().param("per_page", 2))
        .await
        .unwrap();
    assert_eq!(tags.len(), 3);
}

// ============================================================================
// Retries and failures
// ============================================================================

#[tokio::test]
async fn test_service_unavailable_twice_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/posts/1")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/posts/1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "title": "Hi"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig {
        retry_count: 2,
        retry_delay: Duration::from_millis(100),
        backoff_multiplier: 2.0,
        max_retry_delay: Duration::from_secs(30),
        ..config(&server)
    };
    let delays = Arc::new(RetryDelays::default());
    let client = WpClient::new(config).unwrap().with_hook(delays.clone());

    let started = Instant::now();
    let post: Post = client
        .resource("posts")
        .get(1, RequestOptions::new())
        .await
        .unwrap()
        .json()
        .unwrap();

    assert_eq!(post.id, 1);
    assert_eq!(
        *delays.0.lock().unwrap(),
        vec![Duration::from_millis(100), Duration::from_millis(200)]
    );
    assert!(started.elapsed() >= Duration::from_millis(300));
    let stats = client.stats();
    assert_eq!(stats.retry_count, 2);
    assert_eq!(stats.successful_requests, 1);
    assert_eq!(stats.failed_requests, 0);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/posts/999")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "rest_post_invalid_id",
            "message": "Invalid post ID.",
            "data": {"status": 404}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .get("posts/999", RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert_eq!(err.http_status(), Some(404));
    assert!(err.message().contains("Invalid post ID."));
    assert_eq!(err.details().unwrap()["body"]["code"], "rest_post_invalid_id");
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/users/me")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "rest_not_logged_in",
            "message": "You are not currently logged in."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .get("users/me", RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_rate_limited_response_keeps_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .expect(2)
        .mount(&server)
        .await;

    let err = client(&server)
        .get("posts", RequestOptions::new().retries(1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimit);
    assert_eq!(err.details().unwrap()["retry_after"], "7");
}

#[tokio::test]
async fn test_slow_response_times_out_per_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client
        .get(
            "posts",
            RequestOptions::new()
                .timeout(Duration::from_millis(100))
                .retries(1),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(client.stats().retry_count, 1);
    assert_eq!(client.stats().failed_requests, 1);
}

#[tokio::test]
async fn test_response_schema_rejects_unexpected_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "seven"})))
        .expect(1)
        .mount(&server)
        .await;

    let shape = JsonShape::object().field("id", JsonShape::of(JsonType::Integer));
    let err = client(&server)
        .get(
            "posts/7",
            RequestOptions::new().response_schema(Schema::new(shape)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn test_create_sends_auth_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/posts")))
        .and(header("Authorization", "Bearer secret"))
        .and(header("X-Client", "integration"))
        .and(body_json(json!({"title": "New", "status": "publish"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 42, "title": "New"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).with_hook(Arc::new(
        HeaderInjector::new().header("X-Client", "integration"),
    ));
    client.set_auth_token("secret").unwrap();

    let response = client
        .resource("posts")
        .create(json!({"title": "New", "status": "publish"}), RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(response.data["id"], 42);
}

#[tokio::test]
async fn test_invalid_body_never_leaves_the_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let schema = Schema::new(JsonShape::object().field("title", JsonShape::of(JsonType::String)));
    let err = client(&server)
        .post("posts", json!({"content": "untitled"}), RequestOptions::new().schema(schema))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_update_and_delete_paths() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{API}/pages/3")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{API}/pages/3")))
        .and(query_param("force", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"deleted": true, "previous": {"id": 3}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let pages = client.resource("pages");
    pages
        .update(3, json!({"title": "Renamed"}), RequestOptions::new())
        .await
        .unwrap();
    let deleted = pages.delete(3, RequestOptions::new()).await.unwrap();
    assert_eq!(deleted.data["deleted"], true);
}

// ============================================================================
// Dispatch
// ============================================================================

#[tokio::test]
async fn test_concurrency_limit_serializes_excess_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(6)
        .mount(&server)
        .await;

    let config = ClientConfig {
        request_concurrency: 2,
        enable_cache: false,
        ..config(&server)
    };
    let client = WpClient::new(config).unwrap();

    let started = Instant::now();
    let results = futures::future::join_all(
        (0..6).map(|i| client.get("posts", RequestOptions::new().param("page", i))),
    )
    .await;

    assert!(results.iter().all(Result::is_ok));
    // Six requests, two at a time, 100ms each
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(client.stats().total_requests, 6);
}
