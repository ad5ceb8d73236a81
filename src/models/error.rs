use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde_json::json;
use serde_json::Value;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub code: StatusCode,
    pub body: Json<Value>,
}

impl Error {
    pub fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            body: Json(json!({"message": message})),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.code, self.body).into_response()
    }
}

impl From<(StatusCode, &str)> for Error {
    fn from((code, msg): (StatusCode, &str)) -> Self {
        Self::new(code, msg)
    }
}

/// Failures talking to the racing-data service.
///
/// Kept `Clone` so the outcome of one login attempt can be handed to every
/// caller that queued behind it.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsError {
    /// Required identifier or credential absent or invalid. Never retried.
    Config(String),
    /// The service rejected the session on a data call (HTTP 401).
    Unauthorized(String),
    /// The login call itself was refused.
    Login(String),
    Status(u16, String),
    Transport(String),
    Decode(String),
}

impl StatsError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, StatsError::Unauthorized(_))
    }
}

impl fmt::Display for StatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsError::Config(msg) => write!(f, "{msg}"),
            StatsError::Unauthorized(url) => write!(f, "Unauthorized request to {url}"),
            StatsError::Login(msg) => write!(f, "Login failed: {msg}"),
            StatsError::Status(code, url) => write!(f, "HTTP {code} from {url}"),
            StatsError::Transport(msg) => write!(f, "Network error: {msg}"),
            StatsError::Decode(msg) => write!(f, "Invalid response: {msg}"),
        }
    }
}

impl std::error::Error for StatsError {}
