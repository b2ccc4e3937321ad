use thiserror::Error;

/// Why a scheduling call was refused
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// a job or constraint field is malformed
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// two jobs share this identifier
    #[error("duplicate job identifier: {0}")]
    DuplicateIdentifier(String),
}

impl ScheduleError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
