#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Corrupted data: {0}")]
    Corrupted(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
