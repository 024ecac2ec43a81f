//! Ledger writer: appends one immutable `inventory_transactions` row per
//! stock mutation, on the same connection (and therefore in the same
//! transaction) as the mutation it documents.

use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use uuid::Uuid;

use crate::entities::inventory_transaction::{self, TransactionType};
use crate::errors::ServiceError;
use crate::services::stock::{StockChange, StockSnapshot};

/// One pending ledger entry. Snapshots come from the stock store's
/// [`StockChange`]; [`append`] rejects entries whose deltas disagree with
/// their snapshots instead of trusting the caller.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity_delta: i64,
    pub reserved_delta: i64,
    pub before: Option<StockSnapshot>,
    pub after: Option<StockSnapshot>,
    pub reference_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
}

impl LedgerEntry {
    /// Builds an entry directly from a stock change, deriving the deltas
    /// from the snapshots so they cannot disagree.
    pub fn from_change(
        transaction_type: TransactionType,
        warehouse_id: Uuid,
        product_id: Uuid,
        change: &StockChange,
        reference_id: Option<Uuid>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            warehouse_id,
            product_id,
            transaction_type,
            quantity_delta: change.after.quantity - change.before.quantity,
            reserved_delta: change.after.reserved_quantity - change.before.reserved_quantity,
            before: Some(change.before),
            after: Some(change.after),
            reference_id,
            metadata,
        }
    }

    /// Structural completeness check: both snapshots present, deltas equal
    /// after − before. This is the writer's entire validation surface; the
    /// engine's invariant checks happen upstream in the stock store.
    pub fn validate(&self) -> Result<(StockSnapshot, StockSnapshot), ServiceError> {
        let before = self
            .before
            .ok_or_else(|| ServiceError::MalformedEntry("missing before snapshot".to_string()))?;
        let after = self
            .after
            .ok_or_else(|| ServiceError::MalformedEntry("missing after snapshot".to_string()))?;

        if after.quantity - before.quantity != self.quantity_delta {
            return Err(ServiceError::MalformedEntry(format!(
                "quantity delta {} does not equal after - before ({} - {})",
                self.quantity_delta, after.quantity, before.quantity
            )));
        }
        if after.reserved_quantity - before.reserved_quantity != self.reserved_delta {
            return Err(ServiceError::MalformedEntry(format!(
                "reserved delta {} does not equal after - before ({} - {})",
                self.reserved_delta, after.reserved_quantity, before.reserved_quantity
            )));
        }

        Ok((before, after))
    }
}

/// Appends the entry. Insert-only; existing rows are never touched.
pub async fn append<C: ConnectionTrait>(
    conn: &C,
    entry: LedgerEntry,
) -> Result<inventory_transaction::Model, ServiceError> {
    let (before, after) = entry.validate()?;

    let row = inventory_transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        warehouse_id: Set(entry.warehouse_id),
        product_id: Set(entry.product_id),
        transaction_type: Set(entry.transaction_type.as_str().to_string()),
        quantity_delta: Set(entry.quantity_delta),
        reserved_delta: Set(entry.reserved_delta),
        quantity_before: Set(before.quantity),
        quantity_after: Set(after.quantity),
        reserved_before: Set(before.reserved_quantity),
        reserved_after: Set(after.reserved_quantity),
        reference_id: Set(entry.reference_id),
        metadata: Set(entry.metadata),
        ..Default::default()
    };

    row.insert(conn).await.map_err(ServiceError::db_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(before: (i64, i64), after: (i64, i64)) -> StockChange {
        StockChange {
            before: StockSnapshot {
                quantity: before.0,
                reserved_quantity: before.1,
            },
            after: StockSnapshot {
                quantity: after.0,
                reserved_quantity: after.1,
            },
        }
    }

    #[test]
    fn from_change_derives_consistent_deltas() {
        let entry = LedgerEntry::from_change(
            TransactionType::Sale,
            Uuid::new_v4(),
            Uuid::new_v4(),
            &change((100, 0), (70, 0)),
            None,
            None,
        );
        assert_eq!(entry.quantity_delta, -30);
        assert_eq!(entry.reserved_delta, 0);
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn missing_snapshot_is_malformed() {
        let mut entry = LedgerEntry::from_change(
            TransactionType::Restock,
            Uuid::new_v4(),
            Uuid::new_v4(),
            &change((0, 0), (10, 0)),
            None,
            None,
        );
        entry.after = None;
        assert!(matches!(
            entry.validate(),
            Err(ServiceError::MalformedEntry(_))
        ));
    }

    #[test]
    fn delta_snapshot_mismatch_is_malformed() {
        let mut entry = LedgerEntry::from_change(
            TransactionType::Adjustment,
            Uuid::new_v4(),
            Uuid::new_v4(),
            &change((10, 0), (5, 0)),
            None,
            None,
        );
        entry.quantity_delta = -4;
        assert!(matches!(
            entry.validate(),
            Err(ServiceError::MalformedEntry(_))
        ));

        let mut entry = LedgerEntry::from_change(
            TransactionType::ReservationCreate,
            Uuid::new_v4(),
            Uuid::new_v4(),
            &change((10, 0), (10, 3)),
            None,
            None,
        );
        entry.reserved_delta = 2;
        assert!(matches!(
            entry.validate(),
            Err(ServiceError::MalformedEntry(_))
        ));
    }
}
