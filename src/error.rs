use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("{0}")]
    InvalidParameters(String),

    #[error("User not found")]
    UserNotFound,

    #[error("The requested resource could not be found")]
    NotFound,

    #[error("You cannot send a friend request to yourself")]
    CannotFriendSelf,

    #[error("You are not authorized to perform this action")]
    AdminOnly,

    #[error("Invite not found")]
    InviteNotFound,

    #[error("Invalid two-factor authentication code")]
    InvalidTotp,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid or expired session token")]
    InvalidToken,

    #[error("This account has been banned")]
    Banned,

    #[error("That username is already taken")]
    UsernameTaken,
}

impl AppError {
    /// Stable error name surfaced to clients
    pub fn name(&self) -> &'static str {
        match self {
            AppError::InvalidParameters(_) => "INVALID_PARAMETERS",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::NotFound => "NOT_FOUND",
            AppError::CannotFriendSelf => "CANNOT_FRIEND_SELF",
            AppError::AdminOnly => "ADMIN_ONLY",
            AppError::InviteNotFound => "INVITE_NOT_FOUND",
            AppError::InvalidTotp => "INVALID_TOTP",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::Banned => "BANNED",
            AppError::UsernameTaken => "USERNAME_TAKEN",
            _ => "UNKNOWN",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidParameters(_) | AppError::CannotFriendSelf => StatusCode::BAD_REQUEST,
            AppError::UserNotFound | AppError::NotFound | AppError::InviteNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::AdminOnly | AppError::Banned => StatusCode::FORBIDDEN,
            AppError::InvalidTotp | AppError::InvalidCredentials | AppError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::UsernameTaken => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error is an internal failure rather than a client error
    pub fn is_internal(&self) -> bool {
        self.status() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Unreadable request bodies are reported as invalid parameters
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        AppError::InvalidParameters(rejection.body_text())
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
///
/// Body shape: `{"errors":[{"name","message","status"}]}`
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if self.is_internal() {
            tracing::error!("Internal error: {:?}", self);
            "Something went wrong, please try again later.".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "errors": [{
                "name": self.name(),
                "message": message,
                "status": status.as_u16(),
            }]
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
