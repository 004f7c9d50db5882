use aerosense_core::{AqiError, ValidationError};
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

const AQI_FAILURE_MESSAGE: &str = "Failed to fetch AQI";

/// Service-level errors mapped to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid query: {}", .0.body_text())]
    Query(#[from] QueryRejection),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Aqi(#[from] AqiError),
}

/// Error payload; optional members are omitted rather than null.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Query(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Aqi(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            Self::Query(_) | Self::Validation(_) => ErrorBody {
                error: self.to_string(),
                status: None,
                details: None,
            },
            Self::Aqi(error) => ErrorBody {
                error: String::from(AQI_FAILURE_MESSAGE),
                status: error.status(),
                details: Some(details_value(error.details())),
            },
        }
    }
}

/// Upstream bodies are embedded as JSON when they parse, else as text.
fn details_value(details: String) -> Value {
    serde_json::from_str(&details).unwrap_or(Value::String(details))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
