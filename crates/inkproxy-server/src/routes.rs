use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use tracing::Instrument;
use uuid::Uuid;

use inkproxy_core::{AppError, FetchRequest, SessionLauncher, SnapshotSink};

use crate::dto::{FetchQuery, HealthResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// Set on 200 responses whose chapter list stopped at the load-more cap.
pub const TRUNCATED_HEADER: &str = "x-inkproxy-truncated";

/// Build the router with both routes.
pub fn router<L, S>(state: Arc<AppState<L, S>>) -> Router
where
    L: SessionLauncher + 'static,
    S: SnapshotSink + 'static,
{
    Router::new()
        .route("/", any(fetch::<L, S>))
        .route("/health", get(health))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Render `url` in a headless browser and extract entries for `type`.
pub async fn fetch<L, S>(
    State(state): State<Arc<AppState<L, S>>>,
    query: Result<Query<FetchQuery>, QueryRejection>,
) -> Result<Response, ApiError>
where
    L: SessionLauncher + 'static,
    S: SnapshotSink + 'static,
{
    let Query(query) = query.map_err(|e| AppError::InvalidQuery(e.body_text()))?;
    let request = FetchRequest::parse(query.url.as_deref(), query.kind.as_deref())?;

    let span = tracing::info_span!(
        "fetch",
        request_id = %Uuid::new_v4(),
        url = %request.target_url,
        mode = %request.mode,
    );
    let extraction = state.workflow.run(&request).instrument(span).await?;

    let mut response = Json(extraction.result).into_response();
    if extraction.truncated {
        response
            .headers_mut()
            .insert(TRUNCATED_HEADER, HeaderValue::from_static("true"));
    }
    Ok(response)
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "OK" })
}
