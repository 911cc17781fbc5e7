//! Error types for the gateway crate.

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use waypoint_core::{CoreError, FieldError};

/// Errors that can occur during gateway request handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// No route matches the request path.
    #[error("Not Found")]
    NotFound,

    /// The path matches, but not for the request method.
    #[error("Method Not Allowed")]
    MethodNotAllowed { allowed: Vec<Method> },

    /// One or more request fields failed validation.
    #[error("request failed validation on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// A handler and its route declaration disagree.
    #[error("handler error: {0}")]
    Core(#[from] CoreError),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({"detail": "Not Found"}))).into_response()
            }
            GatewayError::MethodNotAllowed { allowed } => {
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut resp = (
                    StatusCode::METHOD_NOT_ALLOWED,
                    Json(json!({"detail": "Method Not Allowed"})),
                )
                    .into_response();
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    resp.headers_mut().insert(header::ALLOW, value);
                }
                resp
            }
            GatewayError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"detail": errors})),
            )
                .into_response(),
            GatewayError::Core(err) => {
                tracing::error!(error = %err, "handler does not match its route declaration");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"detail": err.to_string()})),
                )
                    .into_response()
            }
        }
    }
}
