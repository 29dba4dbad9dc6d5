use crate::config::ConfigError;
use crate::intake::{FormError, GatewayError, ZipDirectoryError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Json(serde_json::Error),
    Gateway(GatewayError),
    Directory(ZipDirectoryError),
    Form(FormError),
    Rejected(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Json(err) => write!(f, "invalid JSON: {}", err),
            AppError::Gateway(err) => write!(f, "gateway error: {}", err),
            AppError::Directory(err) => write!(f, "ZIP directory error: {}", err),
            AppError::Form(err) => write!(f, "form error: {}", err),
            AppError::Rejected(message) => write!(f, "submission rejected: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Gateway(err) => Some(err),
            AppError::Directory(err) => Some(err),
            AppError::Form(err) => Some(err),
            AppError::Rejected(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Json(_) | AppError::Form(_) => StatusCode::BAD_REQUEST,
            AppError::Gateway(_) | AppError::Rejected(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "success": false, "message": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<GatewayError> for AppError {
    fn from(value: GatewayError) -> Self {
        Self::Gateway(value)
    }
}

impl From<ZipDirectoryError> for AppError {
    fn from(value: ZipDirectoryError) -> Self {
        Self::Directory(value)
    }
}

impl From<FormError> for AppError {
    fn from(value: FormError) -> Self {
        Self::Form(value)
    }
}
