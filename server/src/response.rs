//! JSON response envelope and the error type handlers return.
//!
//! # Design
//! Every body the API produces, success or failure, has the shape
//! `{success, data?, error?, message?, count?, details?}`. `ApiError` carries
//! only what the client may see; store errors are logged where they are
//! converted and never reach the body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use todo_core::FieldError;

/// Uniform response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T = ()> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::empty(true)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    fn empty(success: bool) -> Self {
        Self {
            success,
            data: None,
            error: None,
            message: None,
            count: None,
            details: None,
        }
    }
}

impl Envelope {
    /// Success without a payload, e.g. after a delete.
    pub fn message(message: impl Into<String>) -> Self {
        Self::empty(true).with_message(message)
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(false)
        }
    }
}

/// Failures a handler or middleware reports to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Invalid JSON in request body")]
    InvalidJson,

    #[error("Todo not found")]
    NotFound,

    /// A domain rule rejected the request; the message is shown as is.
    #[error("{0}")]
    BadRequest(String),

    /// Generic server-side failure; the message never includes the cause.
    #[error("{0}")]
    Internal(&'static str),

    #[error("Not found")]
    NoRoute,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidJson | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound | ApiError::NoRoute => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = Envelope::failure(self.to_string());
        if let ApiError::Validation(details) = self {
            body.details = Some(details);
        }
        (status, Json(body)).into_response()
    }
}
