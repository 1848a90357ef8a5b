//! Mapping of repository errors onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use phonebook_common::Error;
use tracing::error;

use super::MessageResponse;

/// Handler error: every failure is answered with `{"message": ...}`
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn bad_input(message: impl Into<String>) -> Self {
        Self(Error::BadInput(message.into()))
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) | Error::BadInput(_) => StatusCode::BAD_REQUEST,
            other => {
                error!("Request failed: {}", other);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(MessageResponse::new(self.0.to_string()))).into_response()
    }
}
