use axum::http::StatusCode;
use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("invalid credentials")]
    Authentication,
    #[error("{0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::Configuration(_) => StatusCode::BAD_REQUEST,
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CatalogError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CatalogError::Authentication => StatusCode::UNAUTHORIZED,
            CatalogError::Conflict(_) => StatusCode::CONFLICT,
            CatalogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message returned to the caller. Upload, storage and internal
    /// detail stays server-side; everything else is surfaced verbatim.
    pub fn public_message(&self) -> String {
        match self {
            CatalogError::Upload(_) => "image upload failed".to_string(),
            CatalogError::Storage(_) | CatalogError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for CatalogError {
    fn from(value: validator::ValidationErrors) -> Self {
        CatalogError::Validation(value.to_string())
    }
}
