//! Payment gateway contract
//!
//! The gateway is an opaque collaborator: the engine hands it a charge
//! request carrying the cycle's idempotency key and treats the result as
//! authoritative. Declines are user-correctable and distinct from transient
//! gateway faults, which callers may retry.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Gateway errors
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The card was declined; the customer can fix this (new card, funds)
    #[error("Card declined: {reason}")]
    Declined { reason: String },

    /// Transport or gateway-side fault; the whole operation is retryable
    #[error("Gateway error: {0}")]
    Gateway(String),
}

/// Charge request
///
/// `amount_minor` is the total in integer minor units (pence); the
/// `idempotency_key` is the gateway-side safety net against duplicate
/// charges for the same cycle.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub customer_id: String,
    pub payment_method_id: String,
    pub idempotency_key: String,
    pub description: String,
}

/// A settled (or retrieved) charge
#[derive(Debug, Clone)]
pub struct Charge {
    pub id: String,
    pub amount_minor: i64,
}

/// A refund referencing an earlier charge
#[derive(Debug, Clone)]
pub struct Refund {
    pub id: String,
    pub charge_id: String,
}

/// Request to open a payment-method collection session
#[derive(Debug, Clone)]
pub struct SetupSessionRequest {
    pub customer_id: String,
    pub success_url: String,
    pub cancel_url: String,
    /// Opaque key/value pairs echoed back on completion (source order, cadence)
    pub metadata: HashMap<String, String>,
}

/// An open collection session the customer is redirected to
#[derive(Debug, Clone)]
pub struct SetupSession {
    pub id: String,
    pub url: String,
}

/// Result of a completed collection session
#[derive(Debug, Clone)]
pub struct SetupCompletion {
    pub payment_method_id: String,
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
    /// Metadata from the originating request, echoed verbatim
    pub metadata: HashMap<String, String>,
}

/// Payment gateway collaborator
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge a saved payment method
    async fn charge(&self, request: ChargeRequest) -> Result<Charge, PaymentError>;

    /// Refund an earlier charge in full
    async fn refund(&self, charge_id: &str) -> Result<Refund, PaymentError>;

    /// Retrieve an existing charge
    async fn retrieve(&self, charge_id: &str) -> Result<Charge, PaymentError>;

    /// Open an out-of-band payment-method collection session
    async fn create_setup_session(
        &self,
        request: SetupSessionRequest,
    ) -> Result<SetupSession, PaymentError>;

    /// Fetch the outcome of a completed collection session
    async fn retrieve_setup(&self, session_id: &str) -> Result<SetupCompletion, PaymentError>;
}
