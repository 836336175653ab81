use axum::http::StatusCode;
use thiserror::Error;

/// Failures reported by a [`crate::storage::DataStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("attendance for {course_code} on {date} is already marked")]
    Duplicate { course_code: String, date: String },

    #[error("unknown course code '{0}'")]
    UnknownCourse(String),

    #[error("failed to encode data file: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write data file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Duplicate,
    Other,
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::Duplicate { .. } => StoreErrorKind::Duplicate,
            _ => StoreErrorKind::Other,
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::Duplicate { .. } => Self {
                status: StatusCode::CONFLICT,
                message: err.to_string(),
            },
            StoreError::UnknownCourse(_) => Self {
                status: StatusCode::NOT_FOUND,
                message: err.to_string(),
            },
            StoreError::Encode(_) | StoreError::Io(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("could not save attendance: {err}"),
            },
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
