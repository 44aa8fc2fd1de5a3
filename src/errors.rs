use crate::ai::AiError;
use crate::tracker::TrackerError;
use axum::http::StatusCode;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }

    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        let status = match &err {
            TrackerError::EmptyTitle
            | TrackerError::InvalidTime(_)
            | TrackerError::NothingToReflect
            | TrackerError::MissingReasons(_)
            | TrackerError::EmptyQuery => StatusCode::BAD_REQUEST,
            TrackerError::GoalNotFound(_) => StatusCode::NOT_FOUND,
            TrackerError::InvalidTransition { .. }
            | TrackerError::ReflectionNotOpen
            | TrackerError::ReflectionInFlight
            | TrackerError::ChatInFlight
            | TrackerError::Superseded => StatusCode::CONFLICT,
        };
        Self::new(status, err.to_string())
    }
}

impl From<AiError> for AppError {
    fn from(err: AiError) -> Self {
        let status = match &err {
            AiError::MissingCredential => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
