use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tessera_reserve::ReserveError;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<ReserveError> for AppError {
    fn from(err: ReserveError) -> Self {
        match err {
            ReserveError::Validation(msg) => AppError::ValidationError(msg),
            ReserveError::NotFound(kind) => AppError::NotFoundError(format!("{kind} not found")),
            ReserveError::Lock(inner) => AppError::ConflictError(inner.to_string()),
            ReserveError::InsufficientSeats {
                requested,
                available,
            } => AppError::ConflictError(format!(
                "Not enough seats available: requested {requested}, available {available}"
            )),
            other @ (ReserveError::Contended(_) | ReserveError::Store(_)) => {
                AppError::InternalServerError(anyhow::Error::new(other))
            }
        }
    }
}
