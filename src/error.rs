use thiserror::Error;

use crate::status::CalculationStatus;

#[derive(Debug, Error)]
pub enum CatlossError {
    #[error("constraint violation: {message}")]
    ConstraintViolation { message: String },
    #[error("referential integrity: {message}")]
    ReferentialIntegrity { message: String },
    #[error("orphan reference: {message}")]
    OrphanReference { message: String },
    #[error("invalid discriminator: {message}")]
    InvalidDiscriminator { message: String },
    #[error("illegal status transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: CalculationStatus,
        to: CalculationStatus,
    },
    #[error("conflict: {message}")]
    Conflict { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl CatlossError {
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            message: message.into(),
        }
    }

    pub fn referential_integrity(message: impl Into<String>) -> Self {
        Self::ReferentialIntegrity {
            message: message.into(),
        }
    }

    pub fn orphan(message: impl Into<String>) -> Self {
        Self::OrphanReference {
            message: message.into(),
        }
    }

    pub fn discriminator(message: impl Into<String>) -> Self {
        Self::InvalidDiscriminator {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

pub type CatlossResult<T> = Result<T, CatlossError>;

impl From<sea_orm::DbErr> for CatlossError {
    fn from(value: sea_orm::DbErr) -> Self {
        CatlossError::storage(value.to_string())
    }
}
