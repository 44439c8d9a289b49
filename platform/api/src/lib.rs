use std::sync::Arc;

use async_graphql::{Error, ErrorExtensions};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use products_hr::{EmployeeId, StoreError};
use serde::Serialize;
use thiserror::Error;

/// Shared result type for the HTTP and GraphQL surfaces.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error, Clone)]
pub enum ApiError {
    #[error("bad request: {0}")]
    InvalidInput(String),
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("employee already exists at id {existing_id}")]
    Duplicate { existing_id: EmployeeId },
    #[error("employee {0} not found")]
    NotFound(EmployeeId),
    #[error("internal server error")]
    Internal(Arc<anyhow::Error>),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "BAD_REQUEST",
            ApiError::Validation { .. } => "VALIDATION",
            ApiError::Duplicate { .. } => "DUPLICATE",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Duplicate { .. } => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::Internal(Arc::new(err))
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => Self::Validation {
                field: err.field,
                reason: err.reason,
            },
            StoreError::Duplicate { existing } => Self::Duplicate {
                existing_id: existing,
            },
            StoreError::NotFound(id) => Self::NotFound(id),
        }
    }
}

impl From<products_hr::ValidationError> for ApiError {
    fn from(value: products_hr::ValidationError) -> Self {
        StoreError::from(value).into()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::internal(value)
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> Error {
        let mut err = Error::new(self.to_string());
        err = err.extend_with(|_err, e| {
            e.set("code", self.code());
        });
        match self {
            ApiError::Validation { field, .. } => {
                err = err.extend_with(|_err, e| e.set("field", *field));
            }
            ApiError::Duplicate { existing_id } => {
                let existing_id = existing_id.to_string();
                err = err.extend_with(|_err, e| e.set("existingId", existing_id));
            }
            _ => {}
        }
        err
    }
}

/// JSON body returned by the HTTP surface for every rejected request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_id: Option<EmployeeId>,
}

impl From<&ApiError> for ErrorBody {
    fn from(err: &ApiError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            field: match err {
                ApiError::Validation { field, .. } => Some(*field),
                _ => None,
            },
            existing_id: match err {
                ApiError::Duplicate { existing_id } => Some(*existing_id),
                _ => None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(source) = &self {
            tracing::error!(error = %source, "request failed");
        }
        (self.status(), Json(ErrorBody::from(&self))).into_response()
    }
}

/// Convert any error into a GraphQL error payload while hiding internals.
pub fn internal_error(err: impl Into<anyhow::Error>) -> Error {
    ApiError::internal(err.into()).extend()
}
