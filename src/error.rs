//! Crate-wide error type.
//!
//! Every handler returns `Result<_, Error>`; `ResponseError` turns each
//! variant into a 4xx/5xx response with a `{success, message}` JSON body.

use crate::storage::StorageError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;
use sea_orm::DbErr;
use serde::Serialize;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Display)]
pub enum Error {
    /// Missing, empty or malformed input.
    #[display(fmt = "{}", _0)]
    Validation(String),
    /// Name of the resource that did not resolve.
    #[display(fmt = "{} not found", _0)]
    NotFound(&'static str),
    #[display(fmt = "Authentication required")]
    Unauthorized,
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "Database error: {}", _0)]
    Database(DbErr),
    #[display(fmt = "Storage error: {}", _0)]
    Storage(StorageError),
    #[display(fmt = "Internal error: {}", _0)]
    Internal(String),
}

impl std::error::Error for Error {}

impl From<DbErr> for Error {
    fn from(e: DbErr) -> Self {
        Error::Database(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => Error::NotFound("File"),
            e => Error::Storage(e),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(e: validator::ValidationErrors) -> Self {
        let mut fields: Vec<&str> = e.field_errors().into_keys().collect();
        fields.sort_unstable();
        Error::Validation(format!("Invalid or empty field(s): {}", fields.join(", ")))
    }
}

/// Body of every error response.
#[derive(Serialize)]
pub struct ErrorBody<'a> {
    pub success: bool,
    pub message: &'a str,
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Database(_) | Error::Storage(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            // Details stay in the log.
            log::error!("{}", self);
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(ErrorBody {
            success: false,
            message: &message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_rt::test]
    async fn test_not_found_renders_json_message() {
        let resp = Error::NotFound("Post").error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Post not found");
    }

    #[actix_rt::test]
    async fn test_database_errors_are_not_leaked() {
        let resp = Error::Database(DbErr::Custom("relation \"x\" does not exist".into()))
            .error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Internal server error");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
    }
}
