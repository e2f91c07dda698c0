use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pinka_auth::AuthError;
use pinka_db::StoreError;
use pinka_types::api::ErrorResponse;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{0} must be a positive integer")]
    OutOfRange(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            // A client that produced a well-formed but wrongly signed
            // payload is unauthenticated; a payload we cannot even read
            // is a bad request.
            ApiError::Auth(AuthError::MissingHash | AuthError::InvalidSignature) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Auth(AuthError::MalformedUser) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::MissingField(_) | ApiError::OutOfRange(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("request failed: {self}");
        }

        let body = ErrorResponse {
            ok: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
