//! REST API layer: route handlers, DTOs, OpenAPI document, and router
//! composition.
//!
//! Every endpoint is a read. Responses are pretty-printed JSON.

pub mod dto;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::error::{ApiError, ErrorBody, ErrorResponse};

/// Upper bound on handling a single HTTP request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// OpenAPI description of the HTTP interface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "seatwatch",
        description = "Latest and historical seat availability for the watched route."
    ),
    paths(
        handlers::history::latest_handler,
        handlers::history::list_handler,
        handlers::system::health_handler,
    ),
    components(schemas(
        dto::ItemDto,
        dto::SnapshotDto,
        dto::LatestSnapshotResponse,
        handlers::system::HealthResponse,
        crate::poller::PollStatsSnapshot,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "History", description = "Poll results"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// JSON response body rendered with indentation.
#[derive(Debug, Clone)]
pub struct PrettyJson<T>(pub T);

impl<T: Serialize> IntoResponse for PrettyJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec_pretty(&self.0) {
            Ok(mut body) => {
                body.push(b'\n');
                (
                    [(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("application/json"),
                    )],
                    body,
                )
                    .into_response()
            }
            Err(e) => ApiError::from(e).into_response(),
        }
    }
}

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new().merge(handlers::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

/// Builds the router with middleware and state attached, ready to serve.
pub fn build_app(state: AppState) -> Router {
    build_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
        )
        .with_state(state)
}
