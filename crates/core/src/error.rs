use thiserror::Error;

#[derive(Error, Debug)]
pub enum StubscopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(String),
    /// The on-disk data references a serializer this process does not know.
    /// Recoverable: the caller schedules the offending file (or index) for
    /// rebuilding instead of failing.
    #[error("no stub serializer registered for external id `{external_id}`")]
    SerializerNotFound { external_id: String },
    #[error("corrupted stub data: {0}")]
    Corrupted(String),
    #[error("cancelled")]
    Cancelled,
    #[error("plugin error: {0}")]
    Plugin(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<stubscope_api::ApiError> for StubscopeError {
    fn from(err: stubscope_api::ApiError) -> Self {
        match err {
            stubscope_api::ApiError::Corrupted(msg) => StubscopeError::Corrupted(msg),
            stubscope_api::ApiError::InvalidArgument(msg) => StubscopeError::Internal(msg),
        }
    }
}

impl From<stubscope_plugin::BoxError> for StubscopeError {
    fn from(err: stubscope_plugin::BoxError) -> Self {
        StubscopeError::Plugin(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StubscopeError>;
