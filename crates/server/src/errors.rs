use axum::{http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::models::MISSING_MERCHANT;
use crate::repo::StoreError;

#[derive(Debug)]
pub struct ServerError {
    status: StatusCode,
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum ErrorBody {
    Message(String),
    List(Vec<String>),
}

impl ServerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            error: ErrorBody::Message(message.into()),
        }
    }

    pub fn list(status: StatusCode, messages: Vec<String>) -> Self {
        Self {
            status,
            error: ErrorBody::List(messages),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(resource: &str, id: i64) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("Couldn't find {resource} with 'id'={id}"),
        )
    }

    pub fn invalid_parameter() -> Self {
        Self::bad_request("Invalid Parameter")
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(messages) => {
                Self::list(StatusCode::UNPROCESSABLE_ENTITY, messages)
            }
            StoreError::MissingMerchant(merchant_id) => {
                tracing::debug!(merchant_id, "referenced merchant does not exist");
                Self::list(StatusCode::BAD_REQUEST, vec![MISSING_MERCHANT.to_string()])
            }
            StoreError::Database(e) => {
                tracing::error!(error = %e, "database error");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorEnvelope { error: self.error };
        (self.status, axum::Json(body)).into_response()
    }
}

pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some("23503")
                || db_err.code().as_deref() == Some("787")
                || db_err.is_foreign_key_violation()
    )
}
