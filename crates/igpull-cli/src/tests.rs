use std::sync::Arc;

use super::*;
use igpull_graph::RetryPolicy;
use igpull_store::MemoryStore;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn aggregator(server: &MockServer, store: MemoryStore) -> Aggregator<MemoryStore> {
    let graph = GraphClient::with_base_url(
        &server.uri(),
        "v22.0",
        Some("test-token"),
        5,
        RetryPolicy::immediate(1),
    )
    .expect("graph client");
    Aggregator::new(Arc::new(graph), store)
}

#[test]
fn parses_aggregate_with_repeated_hashtags() {
    let cli = Cli::try_parse_from([
        "igpull-cli",
        "aggregate",
        "--media-limit",
        "10",
        "--hashtag",
        "travel",
        "--hashtag",
        "food",
    ])
    .expect("expected valid cli args");

    assert_eq!(
        cli.command,
        Commands::Aggregate {
            media_limit: 10,
            hashtags: vec!["travel".to_owned(), "food".to_owned()],
        }
    );
}

#[test]
fn aggregate_defaults_to_25_media_and_no_hashtags() {
    let cli = Cli::try_parse_from(["igpull-cli", "aggregate"]).expect("expected valid cli args");
    assert_eq!(
        cli.command,
        Commands::Aggregate {
            media_limit: 25,
            hashtags: Vec::new(),
        }
    );
}

#[test]
fn limits_outside_range_are_rejected() {
    assert!(Cli::try_parse_from(["igpull-cli", "media", "--limit", "0"]).is_err());
    assert!(Cli::try_parse_from(["igpull-cli", "media", "--limit", "201"]).is_err());
    assert!(Cli::try_parse_from(["igpull-cli", "aggregate", "--media-limit", "500"]).is_err());
}

#[test]
fn parses_single_category_commands() {
    let cli = Cli::try_parse_from(["igpull-cli", "media-insights", "17900"]).expect("valid");
    assert_eq!(
        cli.command,
        Commands::MediaInsights {
            media_id: "17900".to_owned()
        }
    );

    let cli = Cli::try_parse_from(["igpull-cli", "hashtag-media", "travel", "--limit", "5"])
        .expect("valid");
    assert_eq!(
        cli.command,
        Commands::HashtagMedia {
            name: "travel".to_owned(),
            limit: 5
        }
    );

    let cli = Cli::try_parse_from(["igpull-cli", "user-insights"]).expect("valid");
    assert_eq!(cli.command, Commands::UserInsights);
}

#[test]
fn a_command_is_required() {
    assert!(Cli::try_parse_from(["igpull-cli"]).is_err());
}

#[tokio::test]
async fn profile_command_prints_the_stored_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v22.0/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "17841",
            "username": "jane"
        })))
        .mount(&server)
        .await;
    let store = MemoryStore::new();

    let output = run::execute(&aggregator(&server, store.clone()), &Commands::Profile)
        .await
        .expect("profile command");

    assert_eq!(output["id"], json!("17841"));
    assert_eq!(output["username"], json!("jane"));
    assert_eq!(store.len("instagram_data").await, 1);
}

#[tokio::test]
async fn hashtag_media_passes_the_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v22.0/ig_hashtag_search"))
        .and(query_param("q", "travel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "ht1"}]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v22.0/ht1/recent_media"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "t1"}, {"id": "t2"}, {"id": "t3"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run::execute(
        &aggregator(&server, MemoryStore::new()),
        &Commands::HashtagMedia {
            name: "travel".to_owned(),
            limit: 3,
        },
    )
    .await
    .expect("hashtag media command");

    let items = output.as_array().expect("array of records");
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["hashtag"], json!("travel"));
}

#[tokio::test]
async fn failed_step_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v22.0/me"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let result = run::execute(
        &aggregator(&server, MemoryStore::new()),
        &Commands::Aggregate {
            media_limit: 5,
            hashtags: Vec::new(),
        },
    )
    .await;

    assert!(result.is_err());
}
