//! Slack request signing verification.
//!
//! Slack signs every request with `v0=hex(HMAC-SHA256(secret, "v0:{ts}:{body}"))`
//! and sends the timestamp alongside. Requests with a bad signature or a
//! timestamp more than five minutes off are rejected before any handler runs.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::AppState;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Maximum clock skew accepted between Slack and us, in seconds.
pub const MAX_SKEW_SECS: i64 = 5 * 60;

/// Slack payloads are small; anything past this is not from Slack.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Compute the `v0=<hex>` signature Slack would send for this body.
pub fn compute_signature(secret: &str, timestamp: &str, body: &[u8]) -> Result<String, AppError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("hmac key rejected: {}", e)))?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(format!("v0={}", hex::encode(mac.finalize().into_bytes())))
}

/// Check a request's signature headers against its raw body.
pub fn verify(
    secret: &str,
    timestamp: &str,
    signature: &str,
    body: &[u8],
    now_unix: i64,
) -> Result<(), AppError> {
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| AppError::InvalidSignature("malformed timestamp"))?;
    if now_unix.abs_diff(ts) > MAX_SKEW_SECS.unsigned_abs() {
        return Err(AppError::InvalidSignature("stale timestamp"));
    }

    let expected = compute_signature(secret, timestamp, body)?;
    if bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
        Ok(())
    } else {
        Err(AppError::InvalidSignature("signature mismatch"))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidSignature("missing signature headers"))
}

/// Middleware: buffers the body, verifies it, and hands it on untouched.
pub async fn verify_slack_signature(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(format!("unreadable body: {}", e)))?;

    let timestamp = header(&parts.headers, TIMESTAMP_HEADER)?;
    let signature = header(&parts.headers, SIGNATURE_HEADER)?;
    verify(
        state.signing_secret.as_str(),
        timestamp,
        signature,
        &bytes,
        chrono::Utc::now().timestamp(),
    )?;

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

// ── Tests ─────────────────────────────────────────────────────
