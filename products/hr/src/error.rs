use thiserror::Error;

use crate::EmployeeId;

/// A candidate record failed a structural check.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("employee already exists at id {existing}")]
    Duplicate { existing: EmployeeId },
    #[error("employee {0} not found")]
    NotFound(EmployeeId),
}

pub type StoreResult<T> = Result<T, StoreError>;
