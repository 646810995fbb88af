use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors a handler can answer with, each mapped to a JSON body
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid username format")]
    InvalidUsername,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Endpoint not found")]
    NotFound,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidUsername => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<versionscout_core::Error> for ApiError {
    fn from(err: versionscout_core::Error) -> Self {
        match err {
            versionscout_core::Error::InvalidUsername(_) => ApiError::InvalidUsername,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
