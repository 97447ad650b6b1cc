use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use shared::{ExceptionKind, MessageCode};
use thiserror::Error;
use uuid::Uuid;

/// An error page emitted directly by a pipeline stage
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    code: u16,
    timestamp: String,
    correlation_id: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
        }
    }

    /// Error page carrying one of the internal message codes
    pub fn from_code(status: StatusCode, code: MessageCode, args: &[&str]) -> Self {
        Self::new(status, code.key(), code.format(args))
    }

    pub fn bad_request(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let correlation_id = Uuid::new_v4().to_string();
        let payload = ErrorResponse {
            error: self.error,
            message: self.message,
            code: self.status.as_u16(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            correlation_id: correlation_id.clone(),
        };

        let mut response = (self.status, Json(payload)).into_response();
        if let Ok(value) = HeaderValue::from_str(&correlation_id) {
            response
                .headers_mut()
                .insert(header::HeaderName::from_static("x-correlation-id"), value);
        }
        response
    }
}

/// A cancel was submitted to a mapping that does not allow it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cancel submitted to non-cancellable mapping {path}")]
pub struct InvalidCancellation {
    pub path: String,
}

/// Failures that cross the pipeline boundary
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    InvalidCancellation(#[from] InvalidCancellation),
    #[error("Failed to read request: {0}")]
    Transport(#[from] axum::Error),
    #[error("Action for {path} failed: {source}")]
    Action {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Exception category used to look up a configured handler
    pub fn kind(&self) -> Option<ExceptionKind> {
        match self {
            DispatchError::InvalidCancellation(_) => Some(ExceptionKind::InvalidCancel),
            DispatchError::Action { .. } => Some(ExceptionKind::Action),
            DispatchError::Transport(_) => None,
        }
    }

    /// Mapping the failing request was dispatched to, when one was selected
    pub fn mapping_path(&self) -> Option<&str> {
        match self {
            DispatchError::InvalidCancellation(cancel) => Some(cancel.path.as_str()),
            DispatchError::Action { path, .. } => Some(path.as_str()),
            DispatchError::Transport(_) => None,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let error = match &self {
            DispatchError::InvalidCancellation(_) => "InvalidCancellation",
            DispatchError::Transport(_) => "TransportError",
            DispatchError::Action { .. } => "ActionFailed",
        };
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, error, self.to_string()).into_response()
    }
}

pub type DispatchResult<T> = std::result::Result<T, DispatchError>;
