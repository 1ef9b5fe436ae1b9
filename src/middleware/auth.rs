//! Operator authentication middleware.
//!
//! Purge endpoints are gated by static bearer keys from the config file.
//! Key comparison is constant-time so an attacker cannot probe key bytes
//! through response timing. The authenticated identity (name plus granted
//! capabilities) is attached as a request extension; handlers then require
//! the specific capability they need.

use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::AppState;

/// The authenticated operator attached to each admitted request.
#[derive(Debug, Clone)]
pub struct OperatorIdentity {
    pub name: String,
    capabilities: Vec<String>,
}

impl OperatorIdentity {
    /// Check a capability, e.g. `purge:run`.
    pub fn require(&self, capability: &str) -> Result<(), AuthError> {
        if self.capabilities.iter().any(|c| c == capability) {
            Ok(())
        } else {
            Err(AuthError::Forbidden {
                operator: self.name.clone(),
                capability: capability.to_string(),
            })
        }
    }

    #[cfg(test)]
    pub fn for_tests(capabilities: &[&str]) -> Self {
        Self {
            name: "test".into(),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer credentials")]
    MissingCredentials,

    #[error("Invalid operator key")]
    InvalidKey,

    #[error("Operator '{operator}' lacks capability '{capability}'")]
    Forbidden { operator: String, capability: String },
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::MissingCredentials | AuthError::InvalidKey => {
                (StatusCode::UNAUTHORIZED, "unauthorized")
            }
            AuthError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
        };
        (
            status,
            Json(serde_json::json!({
                "code": code,
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}

/// Middleware that requires a configured operator bearer key.
pub async fn operator_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingCredentials)?;

    // Scan every configured key even after a match so timing does not
    // reveal which key (if any) was hit.
    let mut matched = None;
    for key in &state.config.auth.operator_keys {
        let hit: bool = presented.as_bytes().ct_eq(key.key.as_bytes()).into();
        if hit && matched.is_none() {
            matched = Some(key);
        }
    }

    let Some(key) = matched else {
        tracing::warn!("Rejected request with unrecognized operator key");
        return Err(AuthError::InvalidKey);
    };

    let identity = OperatorIdentity {
        name: key.name.clone(),
        capabilities: key.capabilities.clone(),
    };
    tracing::debug!(operator = %identity.name, "Operator authenticated");
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
