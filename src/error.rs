//! Server error taxonomy
//!
//! Every handler and manager returns [`Error`]; the `IntoResponse` impl maps
//! it to an HTTP status and a `{"error": {"message": ...}}` body. Store and
//! storage failures are logged with their detail and answered with a fixed
//! generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Auth errors
    #[error("Invalid username or password")]
    LoginFail,
    #[error("Unauthorized: no token provided")]
    AuthFailNoToken,
    #[error("Unauthorized: invalid token")]
    AuthFailInvalidToken,
    #[error("Auth context missing")]
    AuthFailCtxNotInRequestExt,

    // Domain rules
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    InvalidOperation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),

    // Store/storage failures; detail stays in the logs
    #[error("Internal server error")]
    Internal(anyhow::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::LoginFail | Error::AuthFailNoToken | Error::AuthFailInvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::AuthFailCtxNotInRequestExt => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal(source) => {
                error!("internal error: {:#}", source);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": {
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Internal(err.into())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal(err)
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(err: bcrypt::BcryptError) -> Self {
        Error::Internal(err.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Internal(err.into())
    }
}
