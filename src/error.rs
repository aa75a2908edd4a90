use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// The record is absent or belongs to another student.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    InvalidState(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type TrackerResult<T> = Result<T, TrackerError>;
