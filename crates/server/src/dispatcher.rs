//! Maps a command name plus JSON payload onto the emoji service.
//!
//! Shared by the TCP transport and the HTTP gateway, so both surfaces answer
//! with the same envelopes and the same error mapping.

use std::sync::Arc;

use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use validator::Validate;

use models::errors::ModelError;
use service::emoji::domain::{CreateEmojiRequest, GetOneRequest};
use service::emoji::repository::IconRepository;
use service::emoji::EmojiService;
use service::errors::ServiceError;

use crate::metrics::{DISPATCH_DURATION, DISPATCH_TOTAL};

pub const UNKNOWN_PATTERN_MESSAGE: &str = "There is no matching message handler defined in the remote service.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    DatabaseName,
    GetAll,
    GetOne,
    CreateNewEmoji,
}

impl Command {
    pub fn parse(cmd: &str) -> Option<Self> {
        match cmd {
            "database_name" => Some(Self::DatabaseName),
            "get_all" => Some(Self::GetAll),
            "get_one" => Some(Self::GetOne),
            "create_new_emoji" => Some(Self::CreateNewEmoji),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseName => "database_name",
            Self::GetAll => "get_all",
            Self::GetOne => "get_one",
            Self::CreateNewEmoji => "create_new_emoji",
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{}", UNKNOWN_PATTERN_MESSAGE)]
    UnknownPattern(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownPattern(_) => StatusCode::NOT_FOUND,
            Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            Self::UnknownPattern(_) => "unknown_pattern",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::Unauthorized(_) => "unauthorized",
            Self::Internal(_) => "error",
        }
    }
}

impl From<ServiceError> for DispatchError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Unauthorized(msg) => Self::Unauthorized(msg),
            ServiceError::Model(ModelError::Validation(msg)) => Self::InvalidPayload(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<T, DispatchError> {
    serde_json::from_value(data).map_err(|e| DispatchError::InvalidPayload(e.to_string()))
}

fn encode<T: Serialize>(value: T) -> Result<Value, DispatchError> {
    serde_json::to_value(value).map_err(|e| DispatchError::Internal(e.to_string()))
}

pub struct Dispatcher {
    service: Arc<EmojiService<dyn IconRepository>>,
}

impl Dispatcher {
    pub fn new(service: Arc<EmojiService<dyn IconRepository>>) -> Self { Self { service } }

    /// Run `cmd` with `data` and return the serialized envelope.
    pub async fn dispatch(&self, cmd: &str, data: Value) -> Result<Value, DispatchError> {
        let Some(command) = Command::parse(cmd) else {
            warn!(cmd, "no handler for pattern");
            DISPATCH_TOTAL.with_label_values(&["unknown", "unknown_pattern"]).inc();
            return Err(DispatchError::UnknownPattern(cmd.to_string()));
        };

        let timer = DISPATCH_DURATION.with_label_values(&[command.as_str()]).start_timer();
        let result = self.route(command, data).await;
        timer.observe_duration();

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.outcome(),
        };
        DISPATCH_TOTAL.with_label_values(&[command.as_str(), outcome]).inc();
        debug!(cmd = command.as_str(), outcome, "dispatched");
        result
    }

    async fn route(&self, command: Command, data: Value) -> Result<Value, DispatchError> {
        match command {
            Command::DatabaseName => encode(self.service.database_info()),
            Command::GetAll => encode(self.service.list_all().await),
            Command::GetOne => {
                let req: GetOneRequest = decode(data)?;
                encode(self.service.get_one(req.id).await)
            }
            Command::CreateNewEmoji => {
                let req: CreateEmojiRequest = decode(data)?;
                req.validate().map_err(|e| DispatchError::InvalidPayload(e.to_string()))?;
                encode(self.service.create_one(&req).await?)
            }
        }
    }
}
