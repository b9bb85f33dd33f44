use httpmock::{Method::GET, Method::POST, MockServer};
use openai_rate_limits::config::Config;
use openai_rate_limits::http::{encode_path_segment, map_status_to_error, HttpTransport};
use openai_rate_limits::ratelimit::{RateLimitError, RateLimitFields, RateLimitService};
use reqwest::StatusCode;

fn service(server: &MockServer, max_retries: u32) -> RateLimitService<HttpTransport> {
    let mut cfg = Config::new("sk-admin-test", server.url("/v1"));
    cfg.max_retries = max_retries;
    RateLimitService::from_config(&cfg).unwrap()
}

fn catalog() -> serde_json::Value {
    serde_json::json!({
        "object": "list",
        "data": [
            {"object": "project.rate_limit", "id": "rl-gpt-4o-abc123", "model": "gpt-4o", "max_requests_per_1_minute": 500, "max_tokens_per_1_minute": 30000},
            {"object": "project.rate_limit", "id": "rl-dall-e-3", "model": "dall-e-3", "max_requests_per_1_minute": 5, "max_images_per_1_minute": 1}
        ],
        "first_id": "rl-gpt-4o-abc123",
        "last_id": "rl-dall-e-3",
        "has_more": false
    })
}

#[tokio::test]
async fn get_sends_bearer_auth_and_resolves() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/organization/projects/proj_1/rate_limits")
                .header("authorization", "Bearer sk-admin-test");
            then.status(200).json_body(catalog());
        })
        .await;

    let got = service(&server, 0).get("proj_1", "gpt-4o").await.unwrap();
    assert_eq!(got.id, "rl-gpt-4o-abc123");
    assert_eq!(got.max_tokens_per_1_minute, Some(30000));
    list.assert_hits_async(1).await;
}

#[tokio::test]
async fn update_posts_name_and_sparse_fields() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/organization/projects/proj_1/rate_limits");
            then.status(200).json_body(catalog());
        })
        .await;
    let update = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/organization/projects/proj_1/rate_limits/rl-gpt-4o-abc123")
                .json_body(serde_json::json!({"name": "gpt-4o", "max_requests_per_1_minute": 42}));
            then.status(200).json_body(serde_json::json!({
                "object": "project.rate_limit",
                "id": "rl-gpt-4o-abc123",
                "model": "gpt-4o",
                "max_requests_per_1_minute": 42,
                "max_tokens_per_1_minute": 30000
            }));
        })
        .await;

    let fields = RateLimitFields {
        max_requests_per_1_minute: Some(42),
        ..Default::default()
    };
    let updated = service(&server, 0)
        .update("proj_1", "rl-gpt-4o-abc123", fields)
        .await
        .unwrap();
    assert_eq!(updated.max_requests_per_1_minute, Some(42));
    assert_eq!(updated.max_tokens_per_1_minute, Some(30000));
    list.assert_hits_async(1).await;
    update.assert_hits_async(1).await;
}

#[tokio::test]
async fn reset_posts_full_default_entry() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/organization/projects/proj_1/rate_limits");
            then.status(200).json_body(catalog());
        })
        .await;
    let reset = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/organization/projects/proj_1/rate_limits/rl-dall-e-3")
                .json_body(serde_json::json!({
                    "name": "dall-e-3",
                    "max_requests_per_1_minute": 7500,
                    "max_images_per_1_minute": 15
                }));
            then.status(200).json_body(serde_json::json!({
                "id": "rl-dall-e-3",
                "model": "dall-e-3",
                "max_requests_per_1_minute": 7500,
                "max_images_per_1_minute": 15
            }));
        })
        .await;

    service(&server, 0)
        .delete("proj_1", "dall-e-3")
        .await
        .unwrap();
    reset.assert_hits_async(1).await;
}

#[tokio::test]
async fn unknown_project_is_a_remote_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/organization/projects/proj_missing/rate_limits");
            then.status(404)
                .json_body(serde_json::json!({"error": {"message": "No such project"}}));
        })
        .await;

    let err = service(&server, 0)
        .get("proj_missing", "gpt-4o")
        .await
        .unwrap_err();
    assert!(matches!(err, RateLimitError::Remote { .. }));
    assert_eq!(err.code(), "not_found");
    assert!(err.to_string().contains("proj_missing"));
}

#[tokio::test]
async fn server_errors_are_retried_by_transport() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/organization/projects/proj_1/rate_limits");
            then.status(500).body("boom");
        })
        .await;

    let err = service(&server, 1).list("proj_1").await.unwrap_err();
    assert_eq!(err.code(), "upstream_error");
    assert!(err.retriable());
    list.assert_hits_async(2).await;
}

#[tokio::test]
async fn malformed_catalog_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/organization/projects/proj_1/rate_limits");
            then.status(200).body("not json");
        })
        .await;

    let err = service(&server, 0).list("proj_1").await.unwrap_err();
    assert!(matches!(err, RateLimitError::Decode { .. }));
}

#[tokio::test]
async fn organization_header_is_forwarded() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/organization/projects/proj_1/rate_limits")
                .header("openai-organization", "org-123");
            then.status(200).json_body(catalog());
        })
        .await;

    let mut cfg = Config::new("sk-admin-test", server.url("/v1"));
    cfg.organization = Some("org-123".into());
    let svc = RateLimitService::from_config(&cfg).unwrap();
    assert_eq!(svc.list("proj_1").await.unwrap().len(), 2);
    list.assert_hits_async(1).await;
}

#[test]
fn status_error_mapping() {
    let e = map_status_to_error(StatusCode::TOO_MANY_REQUESTS, "rate".into());
    assert_eq!(e.code, "rate_limited");
    assert!(e.retriable);
}

#[test]
fn url_path_segment_encoding() {
    assert_eq!(encode_path_segment("proj abc/1%"), "proj%20abc%2F1%25");
    assert_eq!(encode_path_segment("rl-gpt-4o_mini.~1"), "rl-gpt-4o_mini.~1");
}
