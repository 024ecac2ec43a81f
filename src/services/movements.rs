//! Movement engine: the façade that applies sales, restocks, and manual
//! adjustments as one atomic unit of stock adjustment + ledger append.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::inventory_transaction::TransactionType;
use crate::entities::product;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::ledger::{self, LedgerEntry};
use crate::services::locks::KeyLocks;
use crate::services::stock::{self, StockChange, StockSnapshot};
use crate::services::bundles;

/// Outcome of a committed movement: the ledger row id plus the stock
/// snapshots it recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementResult {
    pub transaction_id: Uuid,
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    pub change: StockChange,
}

/// Service for applying stock movements.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    locks: Arc<KeyLocks>,
    lock_timeout: Duration,
}

impl InventoryService {
    /// Creates a new inventory service instance
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        locks: Arc<KeyLocks>,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            db,
            event_sender,
            locks,
            lock_timeout,
        }
    }

    /// Records a sale of a simple product: on-hand decreases by `quantity`.
    ///
    /// Bundles are rejected — a bundle has no stock row of its own and is
    /// sold by confirming a reservation over its components. Fails
    /// `InsufficientStock` when the sale would eat into reserved stock.
    #[instrument(skip(self))]
    pub async fn sale(
        &self,
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        reference_id: Option<Uuid>,
    ) -> Result<MovementResult, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidQuantity(format!(
                "sale quantity must be positive, got {}",
                quantity
            )));
        }

        let prod = self.load_product(product_id).await?;
        if prod.is_bundle() {
            return Err(ServiceError::InvalidOperation(format!(
                "Product {} is a bundle; sell it by confirming a reservation",
                product_id
            )));
        }

        let _guards = self
            .locks
            .acquire(&[(warehouse_id, product_id)], self.lock_timeout)
            .await?;

        let db = &*self.db;
        let result = db
            .transaction::<_, MovementResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let current = stock::find_for_update(txn, warehouse_id, product_id)
                        .await?
                        .ok_or(ServiceError::UnknownInventoryRow {
                            warehouse_id,
                            product_id,
                        })?;
                    let available = current.available();
                    if available < quantity {
                        return Err(ServiceError::InsufficientStock(format!(
                            "Available: {}, Required: {}",
                            available, quantity
                        )));
                    }

                    let change =
                        stock::adjust(txn, warehouse_id, product_id, -quantity, 0).await?;
                    let recorded = ledger::append(
                        txn,
                        LedgerEntry::from_change(
                            TransactionType::Sale,
                            warehouse_id,
                            product_id,
                            &change,
                            reference_id,
                            None,
                        ),
                    )
                    .await?;

                    Ok(MovementResult {
                        transaction_id: recorded.id,
                        warehouse_id,
                        product_id,
                        change,
                    })
                })
            })
            .await
            .map_err(ServiceError::from_transaction_error)?;

        self.event_sender
            .send(Event::StockSold {
                warehouse_id,
                product_id,
                quantity,
                transaction_id: result.transaction_id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(
            warehouse_id = %warehouse_id,
            product_id = %product_id,
            quantity = %quantity,
            remaining = %result.change.after.quantity,
            "Recorded sale"
        );

        Ok(result)
    }

    /// Adds received stock: on-hand increases by `quantity`, creating the
    /// stock row if this is the first receipt for the key.
    #[instrument(skip(self))]
    pub async fn restock(
        &self,
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        reference_id: Option<Uuid>,
    ) -> Result<MovementResult, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidQuantity(format!(
                "restock quantity must be positive, got {}",
                quantity
            )));
        }

        let prod = self.load_product(product_id).await?;
        if prod.is_bundle() {
            return Err(ServiceError::NotRestockable(product_id));
        }

        let _guards = self
            .locks
            .acquire(&[(warehouse_id, product_id)], self.lock_timeout)
            .await?;

        let db = &*self.db;
        let result = db
            .transaction::<_, MovementResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let change = stock::adjust(txn, warehouse_id, product_id, quantity, 0).await?;
                    let recorded = ledger::append(
                        txn,
                        LedgerEntry::from_change(
                            TransactionType::Restock,
                            warehouse_id,
                            product_id,
                            &change,
                            reference_id,
                            None,
                        ),
                    )
                    .await?;

                    Ok(MovementResult {
                        transaction_id: recorded.id,
                        warehouse_id,
                        product_id,
                        change,
                    })
                })
            })
            .await
            .map_err(ServiceError::from_transaction_error)?;

        self.event_sender
            .send(Event::StockRestocked {
                warehouse_id,
                product_id,
                quantity,
                transaction_id: result.transaction_id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(
            warehouse_id = %warehouse_id,
            product_id = %product_id,
            quantity = %quantity,
            on_hand = %result.change.after.quantity,
            "Recorded restock"
        );

        Ok(result)
    }

    /// Applies a signed manual correction to on-hand stock.
    ///
    /// A zero delta is rejected — the ledger must not record vacuous
    /// entries. The invariant checks apply unchanged, so a downward
    /// adjustment cannot take quantity below zero or below the reserved
    /// amount.
    #[instrument(skip(self))]
    pub async fn adjustment(
        &self,
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity_delta: i64,
        reason: String,
        reference_id: Option<Uuid>,
    ) -> Result<MovementResult, ServiceError> {
        if quantity_delta == 0 {
            return Err(ServiceError::NoOpAdjustment);
        }

        let prod = self.load_product(product_id).await?;
        if prod.is_bundle() {
            return Err(ServiceError::InvalidOperation(format!(
                "Product {} is a bundle and has no stock row to adjust",
                product_id
            )));
        }

        let _guards = self
            .locks
            .acquire(&[(warehouse_id, product_id)], self.lock_timeout)
            .await?;

        let db = &*self.db;
        let metadata = json!({ "reason": reason.clone() });
        let result = db
            .transaction::<_, MovementResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let change =
                        stock::adjust(txn, warehouse_id, product_id, quantity_delta, 0).await?;
                    let recorded = ledger::append(
                        txn,
                        LedgerEntry::from_change(
                            TransactionType::Adjustment,
                            warehouse_id,
                            product_id,
                            &change,
                            reference_id,
                            Some(metadata),
                        ),
                    )
                    .await?;

                    Ok(MovementResult {
                        transaction_id: recorded.id,
                        warehouse_id,
                        product_id,
                        change,
                    })
                })
            })
            .await
            .map_err(ServiceError::from_transaction_error)?;

        self.event_sender
            .send(Event::StockAdjusted {
                warehouse_id,
                product_id,
                quantity_delta,
                reason,
                transaction_id: result.transaction_id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(
            warehouse_id = %warehouse_id,
            product_id = %product_id,
            quantity_delta = %quantity_delta,
            on_hand = %result.change.after.quantity,
            "Recorded manual adjustment"
        );

        Ok(result)
    }

    /// Current snapshot of one stock row; absent rows read as zero.
    #[instrument(skip(self))]
    pub async fn get_stock(
        &self,
        warehouse_id: Uuid,
        product_id: Uuid,
    ) -> Result<StockSnapshot, ServiceError> {
        stock::snapshot(&*self.db, warehouse_id, product_id).await
    }

    /// Sell-able amount for a product, derived through the bundle resolver
    /// when the product is a bundle.
    #[instrument(skip(self))]
    pub async fn available_stock(
        &self,
        warehouse_id: Uuid,
        product_id: Uuid,
    ) -> Result<i64, ServiceError> {
        bundles::available_stock(&*self.db, warehouse_id, product_id).await
    }

    async fn load_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }
}
