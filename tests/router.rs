//! HTTP surface: signature enforcement and immediate acknowledgement.

mod common;

use std::sync::Arc;
use std::time::Duration;

use approvals::api;
use approvals::middleware::signature::{compute_signature, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use approvals::models::approval::ApprovalPayload;
use approvals::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{workflow_with, workspace, Call, FakeSlack};
use serde_json::json;
use tower::ServiceExt;
use zeroize::Zeroizing;

const SECRET: &str = "test-signing-secret";

fn app() -> (Router, Arc<FakeSlack>) {
    let (workflow, slack, _dir) = workflow_with(workspace());
    let state = Arc::new(AppState {
        workflow,
        signing_secret: Zeroizing::new(SECRET.into()),
        command: "/approval-test".into(),
    });
    (api::app(state), slack)
}

fn signed(uri: &str, body: String) -> Request<Body> {
    let ts = chrono::Utc::now().timestamp().to_string();
    let sig = compute_signature(SECRET, &ts, body.as_bytes()).unwrap();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .header(TIMESTAMP_HEADER, ts)
        .header(SIGNATURE_HEADER, sig)
        .body(Body::from(body))
        .unwrap()
}

/// Wait for the spawned handler to make `n` Slack calls.
async fn wait_for_calls(slack: &FakeSlack, n: usize) -> Vec<Call> {
    for _ in 0..100 {
        let calls = slack.calls();
        if calls.len() >= n {
            return calls;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    slack.calls()
}

#[tokio::test]
async fn test_healthz() {
    let (app, _slack) = app();
    let resp = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_unsigned_command_is_rejected() {
    let (app, slack) = app();
    let req = Request::post("/slack/commands")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("command=%2Fapproval-test&user_id=U_REQ&trigger_id=t"))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(slack.calls().is_empty());
}

#[tokio::test]
async fn test_badly_signed_command_is_rejected() {
    let (app, _slack) = app();
    let mut req = signed(
        "/slack/commands",
        "command=%2Fapproval-test&user_id=U_REQ&trigger_id=t".into(),
    );
    req.headers_mut()
        .insert(SIGNATURE_HEADER, "v0=deadbeef".parse().unwrap());

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signed_command_acks_and_opens_form() {
    let (app, slack) = app();
    let req = signed(
        "/slack/commands",
        "command=%2Fapproval-test&user_id=U_REQ&trigger_id=trig.42&text=".into(),
    );

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let calls = wait_for_calls(&slack, 1).await;
    assert_eq!(calls.len(), 1);
    let Call::OpenView { trigger_id, view } = &calls[0] else {
        panic!("expected views.open");
    };
    assert_eq!(trigger_id, "trig.42");
    assert_eq!(view["callback_id"], "approval_modal");
}

#[tokio::test]
async fn test_other_command_is_ignored() {
    let (app, slack) = app();
    let req = signed(
        "/slack/commands",
        "command=%2Fsomething-else&user_id=U_REQ&trigger_id=t".into(),
    );

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(slack.calls().is_empty());
}

#[tokio::test]
async fn test_ssl_check_is_acknowledged() {
    let (app, slack) = app();
    let resp = app
        .oneshot(signed("/slack/commands", "ssl_check=1&token=abc".into()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(slack.calls().is_empty());
}

#[tokio::test]
async fn test_button_press_resolves_request() {
    let (app, slack) = app();
    let value = ApprovalPayload {
        requester: "U_REQ".into(),
        reason: "ship it".into(),
    }
    .encode()
    .unwrap();
    let payload = json!({
        "type": "block_actions",
        "user": { "id": "U_APP" },
        "channel": { "id": "D1" },
        "message": { "ts": "1.2" },
        "actions": [{ "action_id": "reject_request", "value": value }]
    })
    .to_string();

    let resp = app
        .oneshot(signed(
            "/slack/interactions",
            format!("payload={}", urlencoding::encode(&payload)),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let calls = wait_for_calls(&slack, 2).await;
    assert_eq!(calls.len(), 2);
    assert!(matches!(&calls[0], Call::Post { channel, .. } if channel == "U_REQ"));
    assert!(matches!(&calls[1], Call::Update { channel, ts, .. } if channel == "D1" && ts == "1.2"));
}

#[tokio::test]
async fn test_confirmation_modal_submission_is_ignored() {
    let (app, slack) = app();
    let payload = json!({
        "type": "view_submission",
        "user": { "id": "U_REQ" },
        "view": { "callback_id": "confirmation_modal", "state": { "values": {} } }
    })
    .to_string();

    let resp = app
        .oneshot(signed(
            "/slack/interactions",
            format!("payload={}", urlencoding::encode(&payload)),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(slack.calls().is_empty());
}

#[tokio::test]
async fn test_garbage_interaction_payload_is_bad_request() {
    let (app, _slack) = app();
    let resp = app
        .oneshot(signed("/slack/interactions", "payload=not-json".into()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_slack_route_is_404() {
    let (app, _slack) = app();
    let resp = app
        .oneshot(signed("/slack/events", "x=1".into()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
