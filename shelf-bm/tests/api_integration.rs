//! Integration tests for the shelf-bm HTTP surface
//!
//! The router is driven in-process with `oneshot`; cover sources point at a
//! local fake host so the full waterfall runs without leaving the machine.

mod helpers;

use axum::{
    http::{header::HOST, HeaderMap, Method, StatusCode},
    response::Html,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use helpers::{book_record, image_bytes, make_request, FakeRemote, ScriptedProvider};
use shelf_bm::api::books::{MISSING_ISBN_MESSAGE, UNTRUSTED_MESSAGE};
use shelf_bm::config::CoverSources;
use shelf_bm::covers::CoverWaterfall;
use shelf_bm::{build_router, AppState};

const PLACEHOLDER: &str = "https://placeholder.test/no-cover.jpg";

fn sources(remote: &FakeRemote) -> CoverSources {
    CoverSources {
        direct_template: remote.url("/direct/{isbn}.webp"),
        detail_page_template: remote.url("/detail/{isbn}"),
        catalog_template: remote.url("/catalog/{isbn}-us-300.jpg"),
        marketplace_template: remote.url("/market/{isbn10}.01.jpg"),
        image_search_url: remote.url("/search"),
        image_search_timeout_secs: 5,
        placeholder_url: PLACEHOLDER.to_string(),
    }
}

fn app_with(provider: Arc<ScriptedProvider>, remote: &FakeRemote) -> Router {
    let covers = CoverWaterfall::standard(reqwest::Client::new(), &sources(remote));
    build_router(AppState::new(provider, Arc::new(covers)))
}

/// Host whose detail page links a verifiable cover
fn detail_page_host() -> Router {
    Router::new()
        .route(
            "/detail/:isbn",
            get(|headers: HeaderMap| async move {
                let host = headers
                    .get(HOST)
                    .and_then(|h| h.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Html(format!(
                    r#"<html><body><div class="image">
                        <img src="http://{}/img/detail.jpg" alt="cover">
                    </div></body></html>"#,
                    host
                ))
            }),
        )
        .route("/img/detail.jpg", get(|| async { image_bytes(5000) }))
}

// ============================================================================
// Health / routing
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let remote = FakeRemote::spawn(Router::new()).await;
    let app = app_with(ScriptedProvider::returning(book_record("x")), &remote);

    let (status, _, body) = make_request(&app, Method::GET, "/health", None, &[]).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.expect("health body");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "shelf-bm");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].as_u64().is_some());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let remote = FakeRemote::spawn(Router::new()).await;
    let app = app_with(ScriptedProvider::returning(book_record("x")), &remote);

    let (status, _, body) = make_request(&app, Method::GET, "/api/books/human", None, &[]).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, Some(json!({ "error": "Not found" })));
}

#[tokio::test]
async fn test_cors_headers_on_lookup_and_preflight() {
    let remote = FakeRemote::spawn(Router::new()).await;
    let app = app_with(ScriptedProvider::returning(book_record("x")), &remote);

    let (_, headers, _) = make_request(
        &app,
        Method::POST,
        "/api/books/ai",
        Some("{}"),
        &[("origin", "https://shelf.example")],
    )
    .await;
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");

    let (status, headers, _) = make_request(
        &app,
        Method::OPTIONS,
        "/api/books/ai",
        None,
        &[
            ("origin", "https://shelf.example"),
            ("access-control-request-method", "POST"),
            ("access-control-request-headers", "content-type"),
        ],
    )
    .await;
    assert!(status.is_success());
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
}

// ============================================================================
// Book lookup
// ============================================================================

#[tokio::test]
async fn test_missing_isbn_is_bad_request() {
    let remote = FakeRemote::spawn(Router::new()).await;
    let provider = ScriptedProvider::returning(book_record("9786050800001"));
    let app = app_with(Arc::clone(&provider), &remote);

    for body in [r#"{}"#, r#"{"isbn": ""}"#, r#"{"isbn": "   "}"#, "not json"] {
        let (status, _, json) =
            make_request(&app, Method::POST, "/api/books/ai", Some(body), &[]).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(
            json,
            Some(json!({ "found": false, "message": MISSING_ISBN_MESSAGE }))
        );
    }

    assert_eq!(provider.calls(), 0);
    assert_eq!(remote.hits(), 0);
}

#[tokio::test]
async fn test_trusted_lookup_returns_metadata_and_cover() {
    let remote = FakeRemote::spawn(detail_page_host()).await;
    let provider = ScriptedProvider::returning(book_record("978-605-080-000-1"));
    let app = app_with(Arc::clone(&provider), &remote);

    let (status, _, body) = make_request(
        &app,
        Method::POST,
        "/api/books/ai",
        Some(r#"{"isbn": "978-605-080-000-1"}"#),
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = body.expect("lookup body");
    assert_eq!(body["found"], true);
    assert_eq!(body["title"], "Kuyucakli Yusuf");
    assert_eq!(body["author"], "Sabahattin Ali");
    assert_eq!(body["pageCount"], 224);
    assert_eq!(body["publishedDate"], "2014");
    assert_eq!(body["categories"], json!(["Roman", "Klasik"]));
    assert_eq!(body["coverImageUrl"], remote.url("/img/detail.jpg"));

    // Provider sees the cleaned identifier
    assert_eq!(provider.last_isbn().as_deref(), Some("9786050800001"));
}

#[tokio::test]
async fn test_trusted_lookup_without_any_cover_uses_placeholder() {
    let remote = FakeRemote::spawn(
        Router::new().route("/search", get(|| async { Html("<html>no results</html>") })),
    )
    .await;
    let app = app_with(
        ScriptedProvider::returning(book_record("9786050800001")),
        &remote,
    );

    let (status, _, body) = make_request(
        &app,
        Method::POST,
        "/api/books/ai",
        Some(r#"{"isbn": "9786050800001"}"#),
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = body.expect("lookup body");
    assert_eq!(body["found"], true);
    assert_eq!(body["coverImageUrl"], PLACEHOLDER);
    assert!(remote.hits() > 0);
}

#[tokio::test]
async fn test_mismatched_record_is_rejected_without_cover_search() {
    let remote = FakeRemote::spawn(detail_page_host()).await;
    let app = app_with(
        ScriptedProvider::returning(book_record("9786050800002")),
        &remote,
    );

    let (status, _, body) = make_request(
        &app,
        Method::POST,
        "/api/books/ai",
        Some(r#"{"isbn": "9786050800001"}"#),
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        Some(json!({ "found": false, "message": UNTRUSTED_MESSAGE }))
    );
    assert_eq!(remote.hits(), 0);
}

#[tokio::test]
async fn test_not_found_record_is_rejected() {
    let remote = FakeRemote::spawn(Router::new()).await;
    let mut record = book_record("9786050800001");
    record.found = false;
    let app = app_with(ScriptedProvider::returning(record), &remote);

    let (status, _, body) = make_request(
        &app,
        Method::POST,
        "/api/books/ai",
        Some(r#"{"isbn": "9786050800001"}"#),
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.expect("body")["found"], false);
}

#[tokio::test]
async fn test_provider_failure_is_server_error_with_message() {
    let remote = FakeRemote::spawn(Router::new()).await;
    let app = app_with(
        ScriptedProvider::failing("Rate limit reached for requests"),
        &remote,
    );

    let (status, _, body) = make_request(
        &app,
        Method::POST,
        "/api/books/ai",
        Some(r#"{"isbn": "9786050800001"}"#),
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        Some(json!({ "found": false, "message": "Rate limit reached for requests" }))
    );
    assert_eq!(remote.hits(), 0);
}

#[tokio::test]
async fn test_numeric_isbn_body_is_accepted() {
    let remote = FakeRemote::spawn(Router::new()).await;
    let provider = ScriptedProvider::returning(book_record("9786050800001"));
    let app = app_with(Arc::clone(&provider), &remote);

    let (status, _, _) = make_request(
        &app,
        Method::POST,
        "/api/books/ai",
        Some(r#"{"isbn": 9786050800001}"#),
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(provider.last_isbn().as_deref(), Some("9786050800001"));
}

#[tokio::test]
async fn test_search_fallback_supplies_cover() {
    let remote = FakeRemote::spawn(Router::new().route(
        "/search",
        get(|| async {
            Json(json!({
                "data": [["https://example-books.test/covers/9786050800001.jpg", 600, 900]]
            }))
        }),
    ))
    .await;
    let app = app_with(
        ScriptedProvider::returning(book_record("9786050800001")),
        &remote,
    );

    let (status, _, body) = make_request(
        &app,
        Method::POST,
        "/api/books/ai",
        Some(r#"{"isbn": "9786050800001"}"#),
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.expect("body")["coverImageUrl"],
        "https://example-books.test/covers/9786050800001.jpg"
    );
}
