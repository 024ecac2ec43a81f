//! Stock store: atomic read-modify-write of `(quantity, reserved_quantity)`
//! rows. Every function runs on the caller's connection so movement and
//! reservation operations can compose an adjustment with its ledger entry
//! inside one transaction.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, QueryFilter,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::warehouse_inventory::{self, Entity as WarehouseInventory};
use crate::errors::ServiceError;

/// Point-in-time view of one stock row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub quantity: i64,
    pub reserved_quantity: i64,
}

impl StockSnapshot {
    pub const ZERO: StockSnapshot = StockSnapshot {
        quantity: 0,
        reserved_quantity: 0,
    };

    pub fn available(&self) -> i64 {
        self.quantity - self.reserved_quantity
    }
}

impl From<&warehouse_inventory::Model> for StockSnapshot {
    fn from(row: &warehouse_inventory::Model) -> Self {
        Self {
            quantity: row.quantity,
            reserved_quantity: row.reserved_quantity,
        }
    }
}

/// Before/after pair returned by [`adjust`]; callers feed it straight into
/// the ledger entry for the same transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChange {
    pub before: StockSnapshot,
    pub after: StockSnapshot,
}

/// Reads the stock row for `(warehouse_id, product_id)`, taking a row lock
/// on backends that support `SELECT ... FOR UPDATE`. On SQLite the write
/// transaction itself serializes, so no explicit lock clause is emitted.
pub async fn find_for_update<C: ConnectionTrait>(
    conn: &C,
    warehouse_id: Uuid,
    product_id: Uuid,
) -> Result<Option<warehouse_inventory::Model>, ServiceError> {
    let mut query = WarehouseInventory::find()
        .filter(warehouse_inventory::Column::WarehouseId.eq(warehouse_id))
        .filter(warehouse_inventory::Column::ProductId.eq(product_id));

    if conn.get_database_backend() == DbBackend::Postgres {
        query = query.lock_exclusive();
    }

    query.one(conn).await.map_err(ServiceError::db_error)
}

/// Reads the current snapshot without locking; absent rows read as zero.
pub async fn snapshot<C: ConnectionTrait>(
    conn: &C,
    warehouse_id: Uuid,
    product_id: Uuid,
) -> Result<StockSnapshot, ServiceError> {
    let row = WarehouseInventory::find()
        .filter(warehouse_inventory::Column::WarehouseId.eq(warehouse_id))
        .filter(warehouse_inventory::Column::ProductId.eq(product_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;

    Ok(row.as_ref().map(StockSnapshot::from).unwrap_or(StockSnapshot::ZERO))
}

fn check_invariants(next: &StockSnapshot) -> Result<(), ServiceError> {
    if next.quantity < 0 {
        return Err(ServiceError::InvariantViolation(format!(
            "quantity would become negative ({})",
            next.quantity
        )));
    }
    if next.reserved_quantity < 0 {
        return Err(ServiceError::InvariantViolation(format!(
            "reserved_quantity would become negative ({})",
            next.reserved_quantity
        )));
    }
    if next.reserved_quantity > next.quantity {
        return Err(ServiceError::InvariantViolation(format!(
            "reserved_quantity ({}) would exceed quantity ({})",
            next.reserved_quantity, next.quantity
        )));
    }
    Ok(())
}

/// Applies `(quantity_delta, reserved_delta)` to the row under the caller's
/// transaction and returns the before/after snapshots.
///
/// Prospective values are checked against all three invariants before any
/// write; nothing is partially applied. A missing row is created with a zero
/// baseline only for a pure on-hand credit (restock or upward adjustment);
/// any debit or reservation change against a missing row fails
/// `UnknownInventoryRow`.
pub async fn adjust<C: ConnectionTrait>(
    conn: &C,
    warehouse_id: Uuid,
    product_id: Uuid,
    quantity_delta: i64,
    reserved_delta: i64,
) -> Result<StockChange, ServiceError> {
    let existing = find_for_update(conn, warehouse_id, product_id).await?;

    match existing {
        Some(row) => {
            let before = StockSnapshot::from(&row);
            let after = StockSnapshot {
                quantity: before.quantity + quantity_delta,
                reserved_quantity: before.reserved_quantity + reserved_delta,
            };
            check_invariants(&after)?;

            let mut active: warehouse_inventory::ActiveModel = row.into();
            active.quantity = Set(after.quantity);
            active.reserved_quantity = Set(after.reserved_quantity);
            active.update(conn).await.map_err(ServiceError::db_error)?;

            Ok(StockChange { before, after })
        }
        None => {
            if quantity_delta < 0 || reserved_delta != 0 {
                return Err(ServiceError::UnknownInventoryRow {
                    warehouse_id,
                    product_id,
                });
            }

            let after = StockSnapshot {
                quantity: quantity_delta,
                reserved_quantity: 0,
            };
            check_invariants(&after)?;

            let fresh = warehouse_inventory::ActiveModel {
                warehouse_id: Set(warehouse_id),
                product_id: Set(product_id),
                quantity: Set(after.quantity),
                reserved_quantity: Set(0),
                ..Default::default()
            };
            fresh.insert(conn).await.map_err(ServiceError::db_error)?;

            Ok(StockChange {
                before: StockSnapshot::ZERO,
                after,
            })
        }
    }
}
