//! Integration tests for `GraphClient` using wiremock HTTP mocks.

use igpull_graph::{GraphClient, GraphError, RetryPolicy};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> GraphClient {
    GraphClient::with_base_url(
        base_url,
        "v22.0",
        Some("test-token"),
        30,
        RetryPolicy::immediate(3),
    )
    .expect("client construction should not fail")
}

fn media_items(prefix: &str, count: usize) -> Vec<serde_json::Value> {
    (1..=count)
        .map(|i| json!({"id": format!("{prefix}{i}"), "media_type": "IMAGE"}))
        .collect()
}

#[tokio::test]
async fn profile_attaches_token_and_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v22.0/me"))
        .and(query_param("access_token", "test-token"))
        .and(query_param("fields", "id,username,account_type,media_count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "17841",
            "username": "jane",
            "account_type": "BUSINESS",
            "media_count": 42
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let profile = client.profile().await.expect("should parse profile");

    assert_eq!(profile.id, "17841");
    assert_eq!(profile.username.as_deref(), Some("jane"));
    assert_eq!(profile.media_count, Some(42));
}

#[tokio::test]
async fn user_media_truncates_to_limit_on_first_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v22.0/me/media"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": media_items("m", 5),
            "paging": {"next": format!("{}/v22.0/cursor/2", server.uri())}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v22.0/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": media_items("x", 5)})))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let media = client.user_media(3).await.expect("should list media");

    let ids: Vec<_> = media.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m2", "m3"]);
}

#[tokio::test]
async fn user_media_follows_next_cursor_until_limit() {
    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/v22.0/me/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": media_items("a", 2),
            "paging": {"next": format!("{uri}/v22.0/cursor/2")}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v22.0/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": media_items("b", 2),
            "paging": {"next": format!("{uri}/v22.0/cursor/3")}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v22.0/cursor/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": media_items("c", 2)
        })))
        .mount(&server)
        .await;

    let client = test_client(&uri);

    let five = client.user_media(5).await.expect("should list media");
    let ids: Vec<_> = five.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a2", "b1", "b2", "c1"]);

    // More requested than available: everything, in upstream order.
    let all = client.user_media(25).await.expect("should list media");
    assert_eq!(all.len(), 6);
    assert_eq!(all[5].id, "c2");
}

#[tokio::test]
async fn zero_limit_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let media = client.user_media(0).await.expect("empty listing");
    assert!(media.is_empty());
}

#[tokio::test]
async fn follow_up_pages_are_retried() {
    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/v22.0/me/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": media_items("a", 1),
            "paging": {"next": format!("{uri}/v22.0/cursor/2")}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v22.0/cursor/2"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v22.0/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": media_items("b", 1)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&uri);
    let media = client.user_media(10).await.expect("retry should recover");
    assert_eq!(media.len(), 2);
}

#[tokio::test]
async fn persistent_server_error_stops_after_three_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v22.0/me"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.profile().await.expect_err("should fail");

    assert!(
        matches!(err, GraphError::Upstream { status: 503, .. }),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v22.0/m2/insights"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"message": "Unsupported get request", "code": 100}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.media_insights("m2").await.expect_err("should fail");

    match err {
        GraphError::Upstream { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("Unsupported get request"));
        }
        other => panic!("expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn media_insights_parses_entries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v22.0/m1/insights"))
        .and(query_param("metric", "engagement,impressions,reach,saved"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"name": "reach", "period": "lifetime", "values": [{"value": 120}]},
                {"name": "saved", "period": "lifetime", "values": [{"value": 4}]}
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let entries = client.media_insights("m1").await.expect("should parse");

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "reach");
    assert_eq!(entries[0].values[0].value, Some(json!(120)));
}

#[tokio::test]
async fn hashtag_lookup_resolves_first_hit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v22.0/ig_hashtag_search"))
        .and(query_param("q", "travel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "1784"}, {"id": "9999"}]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let id = client.hashtag_id("#travel").await.expect("should resolve");
    assert_eq!(id, "1784");
}

#[tokio::test]
async fn hashtag_lookup_without_hits_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v22.0/ig_hashtag_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.hashtag_id("nosuchtag").await.expect_err("should fail");
    assert!(matches!(err, GraphError::NotFound(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn hashtag_media_lists_recent_media() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v22.0/1784/recent_media"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": media_items("h", 2)
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let media = client.hashtag_media("1784", 2).await.expect("should list");
    assert_eq!(media.len(), 2);
}

#[tokio::test]
async fn missing_token_fails_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
        .expect(0)
        .mount(&server)
        .await;

    let client =
        GraphClient::with_base_url(&server.uri(), "v22.0", None, 30, RetryPolicy::immediate(3))
            .expect("client construction should not fail");
    let err = client.profile().await.expect_err("should fail");
    assert!(matches!(err, GraphError::MissingCredentials));
}

#[tokio::test]
async fn malformed_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v22.0/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.profile().await.expect_err("should fail");
    assert!(matches!(err, GraphError::Deserialize { .. }), "unexpected error: {err:?}");
}
