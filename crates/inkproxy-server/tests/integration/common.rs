use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tower::ServiceExt;

use inkproxy_core::testutil::{MockLauncher, MockSnapshots, fast_config};
use inkproxy_core::{SiteProfile, Workflow};
use inkproxy_server::routes;
use inkproxy_server::state::AppState;

pub const LISTING_HTML: &str = r#"<html><body>
    <a href="/manga/one"><span class="manga-title">One</span></a>
    <a href="/manga/two"><span class="manga-title">Two</span></a>
    <a href="/manga/one"><span class="manga-title">One again</span></a>
</body></html>"#;

pub const CHAPTERS_HTML: &str = r#"<html><body>
    <a href="/chapters/1"><span class="chapter-title">Chapter 1</span></a>
    <a href="/chapters/2"><span class="chapter-title">Chapter 2</span></a>
</body></html>"#;

pub const IMAGES_HTML: &str = r#"<html><body>
    <img src="/file/mangap/p1.webp">
    <img data-src="/file/mangap/p2.webp">
    <img src="/static/logo.png">
</body></html>"#;

pub const LISTING_SELECTOR: &str = r#"a[href*="/manga/"]"#;
pub const CHAPTERS_SELECTOR: &str = r#"a[href*="/chapters/"]"#;
pub const IMAGES_SELECTOR: &str = r#"img[src*="/file/mangap/"], img[data-src*="/file/mangap/"]"#;

pub struct TestApp {
    pub router: Router,
    pub launcher: MockLauncher,
    pub snapshots: MockSnapshots,
}

/// Router wired to `launcher` with millisecond timings.
pub fn setup_test_app(launcher: MockLauncher) -> TestApp {
    let snapshots = MockSnapshots::default();
    let workflow = Workflow::new(
        launcher.clone(),
        snapshots.clone(),
        SiteProfile::default(),
        fast_config(),
    );
    let router = routes::router(Arc::new(AppState { workflow }));
    TestApp {
        router,
        launcher,
        snapshots,
    }
}

pub async fn get(router: Router, uri: &str) -> Response<Body> {
    router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
