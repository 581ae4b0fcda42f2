//! Uniform `{message, data?, status}` reply returned by every emoji operation.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

pub const NOT_FOUND_MESSAGE: &str = "NOT FOUND";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub status: u16,
}

impl<T> Envelope<T> {
    pub fn with_data(message: impl Into<String>, data: T, status: StatusCode) -> Self {
        Self { message: message.into(), data: Some(data), status: status.as_u16() }
    }

    pub fn message(message: impl Into<String>, status: StatusCode) -> Self {
        Self { message: message.into(), data: None, status: status.as_u16() }
    }

    /// `("ok", data, 200)`
    pub fn ok(data: T) -> Self { Self::with_data("ok", data, StatusCode::OK) }

    pub fn not_found() -> Self { Self::message(NOT_FOUND_MESSAGE, StatusCode::NOT_FOUND) }
}
