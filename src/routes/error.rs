use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

use crate::{middleware::AuthError, purge::PurgeError};

/// Error body returned by every purge endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// No `[platform]` section is configured; the service is in setup mode
    /// and must not mutate anything.
    PlatformRequired,
    Auth(AuthError),
    Purge(PurgeError),
}

impl From<PurgeError> for ApiError {
    fn from(err: PurgeError) -> Self {
        ApiError::Purge(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::PlatformRequired => (
                StatusCode::SERVICE_UNAVAILABLE,
                "platform_not_configured",
                "No commerce platform is configured. Add a [platform] section to the config file."
                    .to_string(),
            ),
            ApiError::Auth(err) => return err.into_response(),
            ApiError::Purge(err) => match err {
                PurgeError::NoActiveJob => {
                    (StatusCode::NOT_FOUND, "no_active_job", err.to_string())
                }
                PurgeError::JobAlreadyRunning => {
                    (StatusCode::CONFLICT, "job_already_running", err.to_string())
                }
                PurgeError::AuthenticationFailed => (
                    StatusCode::UNAUTHORIZED,
                    "authentication_failed",
                    err.to_string(),
                ),
                // Defensive reset: the state is already destroyed, send the
                // caller back to the entry point.
                PurgeError::UnexpectedStage => {
                    return Redirect::to("/admin/v1/purge").into_response();
                }
                PurgeError::StaleStep => (StatusCode::CONFLICT, "stale_step", err.to_string()),
                PurgeError::Store(e) => {
                    tracing::error!(error = %e, "Platform store error");
                    (
                        StatusCode::BAD_GATEWAY,
                        "platform_error",
                        "A platform request failed; the job was not advanced".to_string(),
                    )
                }
                PurgeError::State(e) => {
                    tracing::error!(error = %e, "Job state error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "state_error",
                        "An internal job-state error occurred".to_string(),
                    )
                }
            },
        };

        (status, Json(ErrorResponse { code, message })).into_response()
    }
}
