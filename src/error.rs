/// Main application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("request failed for '{input}': {reason}")]
    RequestFailure { input: String, reason: String },

    #[error("persisted history is malformed: {0}")]
    MalformedPersistedState(String),

    #[error("missing precondition: {0}")]
    MissingPrecondition(String),

    #[error("a batch is already running")]
    BatchInProgress,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("import failed: {0}")]
    Import(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build a `RequestFailure` carrying the identifying value of the
    /// offending input (text snippet or file name) for user-facing reporting.
    pub fn request_failure(input: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::RequestFailure {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;
