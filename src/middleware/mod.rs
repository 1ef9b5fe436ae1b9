mod auth;

pub use auth::{AuthError, OperatorIdentity, operator_auth_middleware};
