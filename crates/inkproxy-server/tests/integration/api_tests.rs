use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use inkproxy_core::testutil::MockLauncher;
use inkproxy_server::routes::TRUNCATED_HEADER;

use crate::integration::common::{
    CHAPTERS_HTML, CHAPTERS_SELECTOR, IMAGES_HTML, IMAGES_SELECTOR, LISTING_HTML,
    LISTING_SELECTOR, body_json, get, setup_test_app,
};

#[tokio::test]
async fn health_returns_ok() {
    let app = setup_test_app(MockLauncher::serving(""));

    let response = get(app.router, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "OK");
    assert_eq!(app.launcher.launches(), 0);
}

#[tokio::test]
async fn missing_url_returns_400_without_launching() {
    let app = setup_test_app(MockLauncher::serving(LISTING_HTML));

    let response = get(app.router, "/?type=manga").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json, serde_json::json!({ "error": "Missing URL" }));
    assert_eq!(app.launcher.launches(), 0);
}

#[tokio::test]
async fn blank_url_returns_400() {
    let app = setup_test_app(MockLauncher::serving(LISTING_HTML));

    let response = get(app.router, "/?url=%20%20").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.launcher.launches(), 0);
}

#[tokio::test]
async fn unsupported_type_returns_400() {
    let app = setup_test_app(MockLauncher::serving(LISTING_HTML));

    let response = get(app.router, "/?url=https://site.test/&type=pdf").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Unsupported type: pdf");
    assert_eq!(app.launcher.launches(), 0);
}

#[tokio::test]
async fn repeated_query_key_returns_json_400() {
    let app = setup_test_app(MockLauncher::serving(LISTING_HTML).with_selector(LISTING_SELECTOR));

    let response = get(
        app.router,
        "/?url=https://site.test/a&url=https://site.test/b",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    let json = body_json(response).await;
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("Invalid query string"), "{error}");
    assert!(json.get("details").is_none());
    assert_eq!(app.launcher.launches(), 0);
}

#[tokio::test]
async fn listing_defaults_and_dedups() {
    let launcher = MockLauncher::serving(LISTING_HTML).with_selector(LISTING_SELECTOR);
    let app = setup_test_app(launcher);

    let response = get(app.router, "/?url=https://site.test/latest").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(TRUNCATED_HEADER).is_none());
    let json = body_json(response).await;
    assert_eq!(
        json,
        serde_json::json!([
            { "title": "One", "url": "https://site.test/manga/one" },
            { "title": "Two", "url": "https://site.test/manga/two" },
        ])
    );
    assert_eq!(app.launcher.launches(), 1);
    assert_eq!(app.launcher.closes(), 1);
    assert_eq!(app.launcher.navigations(), vec!["https://site.test/latest"]);
}

#[tokio::test]
async fn root_route_accepts_post() {
    let launcher = MockLauncher::serving(LISTING_HTML).with_selector(LISTING_SELECTOR);
    let app = setup_test_app(launcher);

    let response = app
        .router
        .oneshot(
            Request::post("/?url=https://site.test/&type=manga")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn images_are_plain_strings() {
    let launcher = MockLauncher::serving(IMAGES_HTML).with_selector(IMAGES_SELECTOR);
    let app = setup_test_app(launcher);

    let response = get(app.router, "/?url=https://site.test/read/1&type=images").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json,
        serde_json::json!([
            "https://site.test/file/mangap/p1.webp",
            "https://site.test/file/mangap/p2.webp",
        ])
    );
    assert_eq!(app.launcher.scrolls(), 1);
}

#[tokio::test]
async fn empty_result_returns_404() {
    let html = r#"<a href="/manga/x">Unknown Manga</a>"#;
    let launcher = MockLauncher::serving(html).with_selector(LISTING_SELECTOR);
    let app = setup_test_app(launcher);

    let response = get(app.router, "/?url=https://site.test/&type=manga").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json, serde_json::json!({ "error": "No manga found" }));
    assert_eq!(app.launcher.closes(), 1);
}

#[tokio::test]
async fn http_error_status_returns_500_with_details() {
    let launcher = MockLauncher::serving(LISTING_HTML)
        .with_selector(LISTING_SELECTOR)
        .with_status(403);
    let app = setup_test_app(launcher);

    let response = get(app.router, "/?url=https://site.test/").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Failed to fetch data");
    assert_eq!(
        json["details"],
        "Navigation failed: Request failed with status 403"
    );
    assert_eq!(app.launcher.closes(), 1);
    assert!(app.snapshots.saved().is_empty());
}

#[tokio::test]
async fn launch_failure_returns_500() {
    let app = setup_test_app(MockLauncher::failing("chrome not found"));

    let response = get(app.router, "/?url=https://site.test/").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(
        json["details"],
        "Failed to launch browser: chrome not found"
    );
    assert_eq!(app.launcher.launches(), 1);
    assert_eq!(app.launcher.closes(), 0);
}

#[tokio::test]
async fn selector_timeout_returns_500() {
    let app = setup_test_app(MockLauncher::serving("<html></html>"));

    let response = get(app.router, "/?url=https://site.test/&type=chapters").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    let details = json["details"].as_str().unwrap();
    assert!(details.starts_with("Timed out after"), "{details}");
    assert!(details.contains(CHAPTERS_SELECTOR), "{details}");
    assert_eq!(app.launcher.closes(), 1);

    let saved = app.snapshots.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].1, "<html></html>");
}

#[tokio::test]
async fn load_more_cap_sets_truncated_header() {
    let launcher = MockLauncher::serving(CHAPTERS_HTML)
        .with_selector(CHAPTERS_SELECTOR)
        .with_load_more(100);
    let app = setup_test_app(launcher);

    let response = get(app.router, "/?url=https://site.test/series/1&type=chapters").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(TRUNCATED_HEADER).unwrap(),
        "true"
    );
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(app.launcher.clicks(), 5);
}

#[tokio::test]
async fn load_more_exhausted_is_not_truncated() {
    let launcher = MockLauncher::serving(CHAPTERS_HTML)
        .with_selector(CHAPTERS_SELECTOR)
        .with_load_more(2);
    let app = setup_test_app(launcher);

    let response = get(app.router, "/?url=https://site.test/series/1&type=chapters").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(TRUNCATED_HEADER).is_none());
    assert_eq!(app.launcher.clicks(), 2);
}

#[tokio::test]
async fn browser_failure_during_load_more_returns_500() {
    let launcher = MockLauncher::serving(CHAPTERS_HTML)
        .with_selector(CHAPTERS_SELECTOR)
        .with_load_more(2)
        .with_failing_click("Node is detached from document");
    let app = setup_test_app(launcher);

    let response = get(app.router, "/?url=https://site.test/series/1&type=chapters").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Failed to fetch data");
    assert_eq!(
        json["details"],
        "Browser error: Node is detached from document"
    );
    assert_eq!(app.launcher.closes(), 1);
}
