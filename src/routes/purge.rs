//! Operator API for the purge job.
//!
//! The transport contract mirrors the redirect-chained original: the start
//! and step endpoints answer `303 See Other` pointing at the next step, so
//! any HTTP client that follows redirects drives the chain to completion.
//! The JSON body carries the same continuation for clients that prefer to
//! schedule their own re-invocation.

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::{
    AppState,
    middleware::OperatorIdentity,
    models::{PurgeSummary, Stage},
    purge::{JobStatus, StepOutcome},
};

#[derive(Debug, Deserialize)]
pub struct StartQuery {
    /// Discard an existing job and start fresh.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub struct StepQuery {
    /// The chain's sticky token.
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<JobStatus>,
}

#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    /// URL of the next step; absent once the job has finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<PurgeSummary>,
}

fn step_url(state: &AppState, token: &str) -> String {
    format!(
        "{}/admin/v1/purge/steps?token={}",
        state.config.server.public_base_url(),
        token
    )
}

/// Continue-the-chain response: a redirect for clients that follow it,
/// plus the continuation in the body for clients that don't.
fn continuation_response(state: &AppState, stage: Stage, token: &str) -> Response {
    let url = step_url(state, token);
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, url.clone())],
        Json(StepResponse {
            done: false,
            stage: Some(stage),
            continuation: Some(url),
            summary: None,
        }),
    )
        .into_response()
}

/// Start a purge job. The entry-point action.
pub async fn start(
    State(state): State<AppState>,
    Extension(identity): Extension<OperatorIdentity>,
    Query(query): Query<StartQuery>,
) -> Result<Response, ApiError> {
    identity.require("purge:run")?;
    let controller = state.controller()?;

    let continuation = controller.start(query.force).await?;
    tracing::info!(operator = %identity.name, force = query.force, "Purge started");

    Ok(continuation_response(
        &state,
        continuation.stage,
        &continuation.token,
    ))
}

/// Process one step of the active job.
pub async fn step(
    State(state): State<AppState>,
    Extension(identity): Extension<OperatorIdentity>,
    Query(query): Query<StepQuery>,
) -> Result<Response, ApiError> {
    identity.require("purge:run")?;
    let controller = state.controller()?;

    match controller.process_step(&query.token).await? {
        StepOutcome::Continue(continuation) => Ok(continuation_response(
            &state,
            continuation.stage,
            &continuation.token,
        )),
        StepOutcome::Finished(summary) => {
            tracing::info!(operator = %identity.name, "Purge finished");
            Ok(Json(StepResponse {
                done: true,
                stage: None,
                continuation: None,
                summary: Some(summary),
            })
            .into_response())
        }
    }
}

/// Operator status surface.
pub async fn status(
    State(state): State<AppState>,
    Extension(identity): Extension<OperatorIdentity>,
) -> Result<Json<StatusResponse>, ApiError> {
    identity.require("purge:read")?;
    let controller = state.controller()?;

    let job = controller.status().await?;
    Ok(Json(StatusResponse {
        active: job.is_some(),
        job,
    }))
}
