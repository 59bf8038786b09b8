use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::kubernetes::model::ClusterError;
use crate::kubernetes::replicas::ReplicaError;

/// Failure body shaped like a Kubernetes `Status` object.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBody {
    pub kind: &'static str,
    pub api_version: &'static str,
    pub status: &'static str,
    pub message: String,
    pub reason: String,
    pub code: u16,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    reason: String,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BadRequest", message)
    }
}

impl From<ClusterError> for ApiError {
    fn from(err: ClusterError) -> Self {
        match err {
            ClusterError::Api {
                code,
                reason,
                message,
            } => {
                let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY);
                ApiError::new(status, reason, message)
            }
            ClusterError::Transport(message) => {
                warn!(error = %message, "Cluster API server unreachable");
                ApiError::new(StatusCode::BAD_GATEWAY, "BadGateway", message)
            }
        }
    }
}

impl From<ReplicaError> for ApiError {
    fn from(err: ReplicaError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(StatusBody {
            kind: "Status",
            api_version: "v1",
            status: "Failure",
            message: self.message,
            reason: self.reason,
            code: self.status.as_u16(),
        });
        (self.status, body).into_response()
    }
}
