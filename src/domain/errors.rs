use thiserror::Error;

use super::status::OrderStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },
    #[error("Cannot change order status from {from} to {to}.")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        DomainError::NotFound(message.into())
    }
}
