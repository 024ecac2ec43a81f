use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Types of inventory transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Sale,
    Restock,
    Adjustment,
    ReservationCreate,
    ReservationConfirm,
    ReservationRelease,
    ReservationExpire,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "sale",
            TransactionType::Restock => "restock",
            TransactionType::Adjustment => "adjustment",
            TransactionType::ReservationCreate => "reservation-create",
            TransactionType::ReservationConfirm => "reservation-confirm",
            TransactionType::ReservationRelease => "reservation-release",
            TransactionType::ReservationExpire => "reservation-expire",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sale" => Some(TransactionType::Sale),
            "restock" => Some(TransactionType::Restock),
            "adjustment" => Some(TransactionType::Adjustment),
            "reservation-create" => Some(TransactionType::ReservationCreate),
            "reservation-confirm" => Some(TransactionType::ReservationConfirm),
            "reservation-release" => Some(TransactionType::ReservationRelease),
            "reservation-expire" => Some(TransactionType::ReservationExpire),
            _ => None,
        }
    }
}

/// Append-only audit record of one state change to one `(warehouse,
/// product)` pair. Rows are never updated or deleted; every stock mutation
/// commits exactly one of these in the same transaction.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    pub transaction_type: String, // Storing as string in DB, but will convert to/from enum
    pub quantity_delta: i64,
    pub reserved_delta: i64,
    pub quantity_before: i64,
    pub quantity_after: i64,
    pub reserved_before: i64,
    pub reserved_after: i64,
    pub reference_id: Option<Uuid>,
    pub metadata: Option<Json>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_type_round_trips() {
        assert_eq!(TransactionType::Sale.as_str(), "sale");
        assert_eq!(
            TransactionType::ReservationExpire.as_str(),
            "reservation-expire"
        );
        assert_eq!(
            TransactionType::from_str("reservation-create"),
            Some(TransactionType::ReservationCreate)
        );
        assert_eq!(TransactionType::from_str("transfer"), None);
    }
}
