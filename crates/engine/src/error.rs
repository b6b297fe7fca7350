use evalcycle_core::error::CoreError;

/// Error type for workflow engine operations.
///
/// Domain failures (not-found, validation, conflict) surface as
/// [`CoreError`]; storage failures pass through as [`sqlx::Error`]. The
/// engine performs no retries; retry policy belongs to the caller.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience alias for engine operation results.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
