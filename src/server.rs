//! Web server module.
//!
//! Two read-only query endpoints over the ingested snapshot, plus a
//! liveness probe. Each handler issues exactly one equality-scoped ordered
//! query against the store; there is no process-internal cache.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::storage::{EventStore, OrderBy};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: EventStore,
    /// Grouping key the rows were written under (the feed's top-level title).
    pub grouping_key: String,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

/// Error body for failed queries.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create the axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let app_state = Arc::new(state);

    Router::new()
        .route("/title", get(by_title_handler))
        .route("/date", get(by_date_handler))
        .route("/healthz", get(healthz_handler))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Liveness probe.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Events ordered ascending by title.
async fn by_title_handler(State(state): State<Arc<AppState>>) -> Response {
    list_events(&state, OrderBy::Title).await
}

/// Events ordered ascending by date.
async fn by_date_handler(State(state): State<Arc<AppState>>) -> Response {
    list_events(&state, OrderBy::Date).await
}

/// Run one ordered query and render the rows as a JSON array.
///
/// A store failure surfaces as 502 with an error body, not as an empty 200.
async fn list_events(state: &AppState, order_by: OrderBy) -> Response {
    match state.store.query_ordered(&state.grouping_key, order_by).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => {
            tracing::error!(order_by = %order_by, error = %e, "query failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
