use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::middleware::signature::verify_slack_signature;
use crate::AppState;

pub mod handlers;

/// Slack-facing routes. The caller mounts this under `/slack`.
/// Every route sits behind request-signature verification.
pub fn slack_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/commands", post(handlers::slash_command))
        .route("/interactions", post(handlers::interaction))
        .layer(middleware::from_fn_with_state(state, verify_slack_signature))
        .fallback(fallback_404)
}

/// The whole HTTP surface of the bot.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .nest("/slack", slack_router(state.clone()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Middleware: injects a unique X-Request-Id into every response.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!(
        "request",
        request_id = %req_id,
        method = %req.method(),
        path = %req.uri().path()
    );
    let mut resp = next.run(req).instrument(span).await;
    if let Ok(val) = axum::http::HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}
