use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid api base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("request to {path} failed: {source}")]
    Transport { path: String, source: BoxError },
    #[error("{path} returned {status}: {message}")]
    Status {
        path: String,
        status: u16,
        message: String,
    },
    #[error("invalid response body from {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },
}

impl GatewayError {
    pub fn transport(path: &str, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            path: path.to_string(),
            source: source.into(),
        }
    }

    /// Backend error for non-2xx responses; `None` for transport and decode failures.
    pub fn api_error(&self) -> Option<ApiError> {
        match self {
            Self::Status {
                status, message, ..
            } => Some(ApiError::from_status(*status, message.clone())),
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidBaseUrl { .. } => "The server address is not configured correctly".into(),
            Self::Transport { source, .. } => format!("Network error: {source}"),
            Self::Status { message, .. } => message.clone(),
            Self::Decode { .. } => "The server sent an unexpected response".into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("session storage failed: {source:#}")]
    Storage { source: anyhow::Error },
    #[error("not signed in")]
    NotAuthenticated,
    #[error("{0}")]
    Validation(String),
}

impl ClientError {
    pub fn storage(source: anyhow::Error) -> Self {
        Self::Storage { source }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Gateway(err) => err.api_error().map(|api| api.code),
            Self::NotAuthenticated => Some(ErrorCode::Unauthorized),
            Self::Validation(_) => Some(ErrorCode::Validation),
            _ => None,
        }
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(err) => err.user_message(),
            Self::Decode(_) => "The server sent an unexpected response".into(),
            Self::Storage { .. } => "Could not save your session on this device".into(),
            Self::NotAuthenticated => "Please sign in first".into(),
            Self::Validation(message) => message.clone(),
        }
    }
}
