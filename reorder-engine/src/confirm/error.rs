//! Confirmation error taxonomy
//!
//! Every gateway and persistence failure is converted into a [`ConfirmError`]
//! at the orchestrator boundary; nothing below it propagates as a panic. The
//! [`ConfirmErrorCode`] classification tells callers which failures are safe
//! to retry and which already moved money.

use crate::db::StorageError;
use thiserror::Error;

/// Broad failure classes for callers (retry policy, user messaging)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmErrorCode {
    /// Nothing was charged and nothing changed; fix the input
    Validation,
    /// The card was declined; the customer can correct and retry
    PaymentDeclined,
    /// Transient gateway fault; the whole confirm call is safe to retry
    GatewayError,
    /// Charge succeeded but the order could not be created; a compensating
    /// refund was issued - do NOT re-charge manually
    OrderCreation,
    /// Another confirmation holds the cycle lock; retry shortly
    ConcurrencyTimeout,
    /// Persistence fault before any charge; safe to retry
    Storage,
}

/// Confirmation errors
#[derive(Debug, Error)]
pub enum ConfirmError {
    #[error("Pending order not found: {0}")]
    NotFound(String),

    #[error("Order has already been confirmed")]
    AlreadyConfirmed,

    #[error("Order has expired")]
    Expired,

    #[error("Order is empty - no items to confirm")]
    EmptySnapshot,

    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    #[error("Payment failed: {0}")]
    Gateway(String),

    #[error("Order creation failed: {0}")]
    OrderCreation(String),

    #[error("Confirmation already in progress for this order")]
    ConcurrencyTimeout,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ConfirmError {
    /// Classify into a failure class
    pub fn code(&self) -> ConfirmErrorCode {
        match self {
            ConfirmError::NotFound(_)
            | ConfirmError::AlreadyConfirmed
            | ConfirmError::Expired
            | ConfirmError::EmptySnapshot => ConfirmErrorCode::Validation,
            ConfirmError::PaymentDeclined(_) => ConfirmErrorCode::PaymentDeclined,
            ConfirmError::Gateway(_) => ConfirmErrorCode::GatewayError,
            ConfirmError::OrderCreation(_) => ConfirmErrorCode::OrderCreation,
            ConfirmError::ConcurrencyTimeout => ConfirmErrorCode::ConcurrencyTimeout,
            ConfirmError::Storage(_) => ConfirmErrorCode::Storage,
        }
    }

    /// Whether retrying the whole confirm call is safe and useful
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code(),
            ConfirmErrorCode::GatewayError
                | ConfirmErrorCode::ConcurrencyTimeout
                | ConfirmErrorCode::Storage
        )
    }
}

impl From<StorageError> for ConfirmError {
    fn from(err: StorageError) -> Self {
        ConfirmError::Storage(err.to_string())
    }
}
