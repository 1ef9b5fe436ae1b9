//! HTTP surface tests: auth gating, setup mode, and the redirect chain.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
};
use http::{Request, StatusCode, header};
use tower::ServiceExt;

use super::support::{InMemoryAccountStore, InMemoryOrderStore};
use crate::{
    AppState, build_router,
    config::{ClearoutConfig, OperatorKeyConfig, PurgeConfig},
    purge::PurgeController,
    state::InMemoryJobStateRepo,
};

const RUN_KEY: &str = "op_run_1234567890abcdef";
const READ_KEY: &str = "op_read_1234567890abcdef";

fn test_state(controller: Option<Arc<PurgeController>>) -> AppState {
    let mut config = ClearoutConfig::default();
    config.auth.operator_keys = vec![
        OperatorKeyConfig {
            name: "runner".into(),
            key: RUN_KEY.into(),
            capabilities: vec!["purge:run".into(), "purge:read".into()],
        },
        OperatorKeyConfig {
            name: "viewer".into(),
            key: READ_KEY.into(),
            capabilities: vec!["purge:read".into()],
        },
    ];
    AppState {
        config: Arc::new(config),
        controller,
    }
}

fn app_with_orders(order_count: u64, batch_size: u32) -> Router {
    let controller = PurgeController::new(
        Arc::new(InMemoryJobStateRepo::new()),
        Arc::new(InMemoryOrderStore::with_orders(order_count)),
        Arc::new(InMemoryAccountStore::default()),
        PurgeConfig {
            batch_size,
            ..Default::default()
        },
    );
    build_router(test_state(Some(Arc::new(controller))))
}

async fn send(app: &Router, method: &str, uri: &str, key: Option<&str>) -> (StatusCode, serde_json::Value, Option<String>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {key}"));
    }
    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body, location)
}

fn step_path(body: &serde_json::Value) -> String {
    let url = body["continuation"].as_str().expect("continuation url");
    let idx = url.find("/admin/v1/purge/steps").expect("step path in url");
    url[idx..].to_string()
}

#[tokio::test]
async fn test_health_needs_no_auth() {
    let app = app_with_orders(0, 200);
    let (status, body, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["platform_configured"], true);
}

#[tokio::test]
async fn test_purge_endpoints_require_credentials() {
    let app = app_with_orders(0, 200);
    let (status, body, _) = send(&app, "GET", "/admin/v1/purge", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _, _) = send(&app, "POST", "/admin/v1/purge", Some("op_wrong_1234567890")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_start_requires_run_capability() {
    let app = app_with_orders(0, 200);
    let (status, body, _) = send(&app, "POST", "/admin/v1/purge", Some(READ_KEY)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    // The read capability still covers the status surface.
    let (status, body, _) = send(&app, "GET", "/admin/v1/purge", Some(READ_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);
}

#[tokio::test]
async fn test_setup_mode_rejects_purge() {
    let app = build_router(test_state(None));
    let (status, body, _) = send(&app, "POST", "/admin/v1/purge", Some(RUN_KEY)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "platform_not_configured");

    let (_, health, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["platform_configured"], false);
}

#[tokio::test]
async fn test_second_start_conflicts_without_force() {
    let app = app_with_orders(500, 200);
    let (status, _, _) = send(&app, "POST", "/admin/v1/purge", Some(RUN_KEY)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (status, body, _) = send(&app, "POST", "/admin/v1/purge", Some(RUN_KEY)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "job_already_running");

    let (status, _, _) = send(&app, "POST", "/admin/v1/purge?force=true", Some(RUN_KEY)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_redirect_chain_drives_job_to_completion() {
    let app = app_with_orders(230, 75);

    let (status, body, location) = send(&app, "POST", "/admin/v1/purge", Some(RUN_KEY)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), body["continuation"].as_str());

    let mut path = step_path(&body);
    let mut hops = 0;
    loop {
        hops += 1;
        assert!(hops < 100, "redirect chain did not terminate");
        let (status, body, _) = send(&app, "POST", &path, Some(RUN_KEY)).await;
        match status {
            StatusCode::SEE_OTHER => path = step_path(&body),
            StatusCode::OK => {
                assert_eq!(body["done"], true);
                assert_eq!(body["summary"]["orders_processed"], 230);
                assert_eq!(body["summary"]["accounts_processed"], 0);
                break;
            }
            other => panic!("unexpected status {other}"),
        }
    }
    // 230 orders at 75 per step, plus the accounts pass.
    assert_eq!(hops, 5);

    let (_, status_body, _) = send(&app, "GET", "/admin/v1/purge", Some(RUN_KEY)).await;
    assert_eq!(status_body["active"], false);
}

#[tokio::test]
async fn test_status_reports_progress_mid_chain() {
    let app = app_with_orders(10, 4);

    let (_, body, _) = send(&app, "POST", "/admin/v1/purge", Some(RUN_KEY)).await;
    let path = step_path(&body);
    send(&app, "POST", &path, Some(RUN_KEY)).await;

    let (status, body, _) = send(&app, "GET", "/admin/v1/purge", Some(READ_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], true);
    assert_eq!(body["job"]["stage"], "orders");
    assert_eq!(body["job"]["batch_size"], 4);
    assert_eq!(body["job"]["orders"]["processed"], 4);
    assert_eq!(body["job"]["orders"]["total"], 10);
}

#[tokio::test]
async fn test_forged_step_token_destroys_the_job() {
    let app = app_with_orders(50, 10);
    send(&app, "POST", "/admin/v1/purge", Some(RUN_KEY)).await;

    let (status, body, _) = send(
        &app,
        "POST",
        "/admin/v1/purge/steps?token=forged",
        Some(RUN_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "authentication_failed");

    let (_, status_body, _) = send(&app, "GET", "/admin/v1/purge", Some(RUN_KEY)).await;
    assert_eq!(status_body["active"], false);
}

#[tokio::test]
async fn test_step_without_job_is_not_found() {
    let app = app_with_orders(0, 200);
    let (status, body, _) = send(
        &app,
        "POST",
        "/admin/v1/purge/steps?token=whatever",
        Some(RUN_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "no_active_job");
}
