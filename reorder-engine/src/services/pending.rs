//! Customer edits to a pending cycle
//!
//! Before confirming, a customer may change quantities or drop lines from
//! the cycle they were mailed about. The edit replaces the whole snapshot
//! with a freshly priced one - the old document is never patched in place.

use super::{ServiceError, ServiceResult};
use crate::catalog::CatalogLookup;
use crate::core::PricingConfig;
use crate::db::ReorderStorage;
use crate::money::MAX_QUANTITY;
use crate::pricing::{EditedItem, SnapshotBuilder};
use shared::PendingOrder;
use std::sync::Arc;

pub struct PendingOrderService {
    storage: ReorderStorage,
    catalog: Arc<dyn CatalogLookup>,
    pricing: PricingConfig,
}

impl PendingOrderService {
    pub fn new(
        storage: ReorderStorage,
        catalog: Arc<dyn CatalogLookup>,
        pricing: PricingConfig,
    ) -> Self {
        Self {
            storage,
            catalog,
            pricing,
        }
    }

    /// Rebuild a pending order's snapshot from an edited item list
    ///
    /// The submission must be non-empty with positive, bounded quantities.
    /// Items that no longer resolve to a purchasable variant are silently
    /// dropped by the pricing path (the customer just re-chose them, so
    /// there is nothing to warn about that the storefront has not already
    /// said).
    pub fn update_items(
        &self,
        pending_order_id: &str,
        items: &[EditedItem],
    ) -> ServiceResult<PendingOrder> {
        if items.is_empty() {
            return Err(ServiceError::Validation(
                "Cannot save an empty order".to_string(),
            ));
        }
        for item in items {
            if item.quantity == 0 {
                return Err(ServiceError::Validation(
                    "Quantity must be greater than zero".to_string(),
                ));
            }
            if item.quantity > MAX_QUANTITY {
                return Err(ServiceError::Validation(format!(
                    "Quantity exceeds maximum allowed ({})",
                    MAX_QUANTITY
                )));
            }
        }

        let mut pending = self
            .storage
            .get_pending_order(pending_order_id)?
            .ok_or_else(|| ServiceError::PendingOrderNotFound(pending_order_id.to_string()))?;

        let snapshot = SnapshotBuilder::new(self.catalog.as_ref(), &self.pricing).from_items(items);
        pending.replace_snapshot(snapshot)?;

        let txn = self.storage.begin_write()?;
        self.storage.store_pending_order(&txn, &pending)?;
        txn.commit().map_err(crate::db::StorageError::from)?;

        tracing::info!(
            pending_order_id = %pending.id,
            total = %pending.snapshot().total,
            "Pending order items updated"
        );
        Ok(pending)
    }
}
