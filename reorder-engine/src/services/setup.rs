//! One-time schedule setup from a prior order
//!
//! Payment method collection happens out of band: `begin_setup` opens a
//! gateway session the customer is redirected to, with the source order and
//! chosen cadence riding along as session metadata. When the gateway calls
//! back, `complete_setup` reads the collected payment method, creates the
//! schedule with its first cycle one cadence out, and clones the source
//! order's lines into template items at their order-time price.

use crate::db::{ReorderStorage, StorageError};
use crate::gateway::{PaymentError, PaymentGateway, SetupSession, SetupSessionRequest};
use chrono::{NaiveDate, Utc};
use shared::{Cadence, ReorderSchedule, ScheduleError, ScheduleItem};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

const META_ORDER_ID: &str = "order_id";
const META_CUSTOMER_ID: &str = "customer_id";
const META_CADENCE: &str = "cadence";

/// Setup flow errors
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Schedule(#[from] ScheduleError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<PaymentError> for SetupError {
    fn from(err: PaymentError) -> Self {
        SetupError::Gateway(err.to_string())
    }
}

pub struct ScheduleSetupService {
    storage: ReorderStorage,
    gateway: Arc<dyn PaymentGateway>,
}

impl ScheduleSetupService {
    pub fn new(storage: ReorderStorage, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { storage, gateway }
    }

    /// Open a payment-method collection session for the customer
    ///
    /// The source order must exist and belong to the customer; it rides
    /// along in the session metadata so completion needs nothing but the
    /// session id.
    pub async fn begin_setup(
        &self,
        customer_id: &str,
        order_id: &str,
        cadence: Cadence,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<SetupSession, SetupError> {
        let order = self
            .storage
            .get_order(order_id)?
            .ok_or_else(|| SetupError::OrderNotFound(order_id.to_string()))?;
        if order.customer_id != customer_id {
            return Err(SetupError::OrderNotFound(order_id.to_string()));
        }
        if order.items.is_empty() {
            return Err(SetupError::Validation(
                "Order has no items to reorder".to_string(),
            ));
        }

        let mut metadata = HashMap::new();
        metadata.insert(META_ORDER_ID.to_string(), order.id.clone());
        metadata.insert(META_CUSTOMER_ID.to_string(), customer_id.to_string());
        metadata.insert(META_CADENCE.to_string(), cadence.as_str().to_string());

        let session = self
            .gateway
            .create_setup_session(SetupSessionRequest {
                customer_id: customer_id.to_string(),
                success_url: success_url.to_string(),
                cancel_url: cancel_url.to_string(),
                metadata,
            })
            .await?;

        tracing::info!(
            customer_id = %customer_id,
            order_id = %order_id,
            session_id = %session.id,
            "Setup session created"
        );
        Ok(session)
    }

    /// Complete setup after the gateway redirect
    ///
    /// First due date = today + one cadence period.
    pub async fn complete_setup(
        &self,
        session_id: &str,
        today: NaiveDate,
    ) -> Result<ReorderSchedule, SetupError> {
        let completion = self.gateway.retrieve_setup(session_id).await?;

        let order_id = completion
            .metadata
            .get(META_ORDER_ID)
            .ok_or_else(|| SetupError::Validation("Session metadata missing order".to_string()))?;
        let cadence: Cadence = completion
            .metadata
            .get(META_CADENCE)
            .ok_or_else(|| SetupError::Validation("Session metadata missing cadence".to_string()))?
            .parse()?;

        let order = self
            .storage
            .get_order(order_id)?
            .ok_or_else(|| SetupError::OrderNotFound(order_id.clone()))?;

        let items: Vec<ScheduleItem> = order
            .items
            .iter()
            .map(|item| ScheduleItem {
                variant_id: item.variant_id.clone(),
                quantity: item.quantity,
                price: item.unit_price,
            })
            .collect();

        let schedule = ReorderSchedule::new(
            uuid::Uuid::new_v4().to_string(),
            order.customer_id.clone(),
            cadence,
            cadence.advance(today),
            completion.payment_method_id,
            completion.card_brand,
            completion.card_last4,
            items,
            Utc::now().timestamp_millis(),
        )?;

        let txn = self.storage.begin_write()?;
        self.storage.store_schedule(&txn, &schedule)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            schedule_id = %schedule.id,
            customer_id = %schedule.customer_id,
            cadence = %schedule.cadence().as_str(),
            next_due = %schedule.next_due_date(),
            "Reorder schedule created"
        );
        Ok(schedule)
    }
}
