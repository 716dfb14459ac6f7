//! HTTP surface.
//!
//! A thin adapter over the aggregator: two GET endpoints plus a read-only
//! guard. No aggregation logic lives here.
//!
//! - `GET /health` - service status and per-source reachability
//! - `GET /events/next/{days}` - merged events for the next `days` days
//!
//! Every mutating verb is rejected with 403 before routing; the service has
//! no mutation operations at all.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::warn;

use calhub_core::Event;

use crate::aggregator::Aggregator;
use crate::health::HealthChecker;

/// Shared state behind the router.
#[derive(Clone)]
pub struct AppState {
    aggregator: Arc<Aggregator>,
    health: Arc<HealthChecker>,
}

impl AppState {
    /// Creates the state for an aggregator; the health checker probes the
    /// same source set.
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        let health = Arc::new(HealthChecker::new(aggregator.sources().to_vec()));
        Self { aggregator, health }
    }
}

/// Builds the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events/next/{days}", get(events_next))
        .layer(middleware::from_fn(readonly_guard))
        .with_state(state)
}

/// JSON error body: `{"detail": ...}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// API-level error carrying its HTTP status.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed caller input (400).
    BadRequest(String),
    /// Internal failure (500); the detail is echoed in an `X-Error` header.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { detail })).into_response()
            }
            Self::Internal(detail) => {
                let mut response = (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        detail: detail.clone(),
                    }),
                )
                    .into_response();
                if let Ok(value) = HeaderValue::from_str(&detail) {
                    response.headers_mut().insert("X-Error", value);
                }
                response
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    calendars_status: BTreeMap<String, bool>,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let calendars_status = state.health.check().await;
    Json(HealthResponse {
        status: "ok",
        calendars_status,
    })
}

async fn events_next(
    State(state): State<AppState>,
    Path(days): Path<i64>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let days = u32::try_from(days)
        .ok()
        .filter(|d| *d > 0)
        .ok_or_else(|| ApiError::BadRequest("days must be positive integer".to_string()))?;

    Ok(Json(state.aggregator.events_next_days(days).await))
}

/// Rejects every mutating verb before routing; the service is read-only.
async fn readonly_guard(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
        return next.run(request).await;
    }

    warn!(method = %method, uri = %request.uri(), "Blocked write attempt");
    (
        StatusCode::FORBIDDEN,
        Json(ErrorBody {
            detail: "Read-only mode: write operations are disabled.".to_string(),
        }),
    )
        .into_response()
}
