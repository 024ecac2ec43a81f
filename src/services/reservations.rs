//! Reservation manager: temporary holds on stock, tracked per token in an
//! in-process registry. The persisted state stays exactly the stock rows
//! plus their ledger entries; a token is a lightweight record of the rows a
//! reservation touched and by how much.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::inventory_transaction::TransactionType;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::bundles;
use crate::services::ledger::{self, LedgerEntry};
use crate::services::locks::{KeyLocks, StockKey};
use crate::services::stock;

/// Lifecycle of a reservation. Pending is the only state with live holds;
/// the three terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Released,
    Expired,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Released => "released",
            ReservationStatus::Expired => "expired",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReservationStatus::Pending),
            "confirmed" => Some(ReservationStatus::Confirmed),
            "released" => Some(ReservationStatus::Released),
            "expired" => Some(ReservationStatus::Expired),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Pending)
    }
}

/// One reserved leaf row: how much of which product this reservation holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationLine {
    pub product_id: Uuid,
    pub amount: i64,
}

/// The record a token resolves to: the requested product (bundle or
/// simple), the leaf rows actually held, and the lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub lines: Vec<ReservationLine>,
    pub status: ReservationStatus,
    pub reference_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Result of sweeping overdue reservations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutcome {
    /// Number of reservations transitioned to expired.
    pub expired_count: u64,
    /// Timestamp when the sweep ran.
    pub swept_at: DateTime<Utc>,
}

/// Service for managing stock reservations.
pub struct ReservationService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    locks: Arc<KeyLocks>,
    registry: DashMap<Uuid, Reservation>,
    ttl: chrono::Duration,
    lock_timeout: Duration,
}

impl ReservationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        locks: Arc<KeyLocks>,
        ttl: chrono::Duration,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            db,
            event_sender,
            locks,
            registry: DashMap::new(),
            ttl,
            lock_timeout,
        }
    }

    /// Places a hold of `quantity` units of `product_id` in `warehouse_id`.
    ///
    /// A bundle is expanded first and every leaf is reserved in one
    /// transaction — a partial bundle reservation is meaningless, so either
    /// every leaf hold commits or none do. Fails `InsufficientStock` when
    /// any leaf's available stock cannot cover its share.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        reference_id: Option<Uuid>,
    ) -> Result<Reservation, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidQuantity(format!(
                "reservation quantity must be positive, got {}",
                quantity
            )));
        }

        let db = &*self.db;
        let leaves = bundles::expand(db, product_id).await?;
        if leaves.is_empty() {
            return Err(ServiceError::InvalidOperation(format!(
                "Bundle {} has no components to reserve",
                product_id
            )));
        }

        let lines: Vec<ReservationLine> = leaves
            .iter()
            .map(|leaf| ReservationLine {
                product_id: leaf.product_id,
                amount: leaf.multiplier * quantity,
            })
            .collect();

        let keys: Vec<StockKey> = lines
            .iter()
            .map(|line| (warehouse_id, line.product_id))
            .collect();
        let _guards = self.locks.acquire(&keys, self.lock_timeout).await?;

        let reservation_id = Uuid::new_v4();
        let txn_lines = lines.clone();
        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                for line in &txn_lines {
                    let current = stock::snapshot(txn, warehouse_id, line.product_id).await?;
                    if current.available() < line.amount {
                        return Err(ServiceError::InsufficientStock(format!(
                            "Product {}: available {}, requested hold {}",
                            line.product_id,
                            current.available(),
                            line.amount
                        )));
                    }

                    let change =
                        stock::adjust(txn, warehouse_id, line.product_id, 0, line.amount).await?;
                    ledger::append(
                        txn,
                        LedgerEntry::from_change(
                            TransactionType::ReservationCreate,
                            warehouse_id,
                            line.product_id,
                            &change,
                            reference_id,
                            Some(json!({ "reservation_id": reservation_id })),
                        ),
                    )
                    .await?;
                }
                Ok(())
            })
        })
        .await
        .map_err(ServiceError::from_transaction_error)?;

        let now = Utc::now();
        let reservation = Reservation {
            id: reservation_id,
            warehouse_id,
            product_id,
            quantity,
            lines,
            status: ReservationStatus::Pending,
            reference_id,
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.registry.insert(reservation_id, reservation.clone());

        self.event_sender
            .send(Event::ReservationCreated {
                reservation_id,
                warehouse_id,
                product_id,
                quantity,
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(
            reservation_id = %reservation_id,
            warehouse_id = %warehouse_id,
            product_id = %product_id,
            quantity = %quantity,
            leaves = reservation.lines.len(),
            "Created reservation"
        );

        Ok(reservation)
    }

    /// Converts the hold into an actual debit: each reserved leaf ships out
    /// and its hold clears in one step. Pending → Confirmed.
    #[instrument(skip(self))]
    pub async fn confirm(&self, token: Uuid) -> Result<Reservation, ServiceError> {
        let reservation = self
            .settle(token, ReservationStatus::Confirmed, |amount| (-amount, -amount))
            .await?;

        self.event_sender
            .send(Event::ReservationConfirmed {
                reservation_id: token,
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(reservation_id = %token, "Confirmed reservation");
        Ok(reservation)
    }

    /// Returns the held stock to the sell-able pool without debiting
    /// on-hand. Pending → Released; a second release fails
    /// `InvalidReservationState`.
    #[instrument(skip(self))]
    pub async fn release(&self, token: Uuid) -> Result<Reservation, ServiceError> {
        let reservation = self
            .settle(token, ReservationStatus::Released, |amount| (0, -amount))
            .await?;

        self.event_sender
            .send(Event::ReservationReleased {
                reservation_id: token,
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(reservation_id = %token, "Released reservation");
        Ok(reservation)
    }

    /// Same stock effect as release, recorded as an expiry. Invoked by an
    /// external scheduler once the reservation's TTL elapses.
    #[instrument(skip(self))]
    pub async fn expire(&self, token: Uuid) -> Result<Reservation, ServiceError> {
        let reservation = self
            .settle(token, ReservationStatus::Expired, |amount| (0, -amount))
            .await?;

        self.event_sender
            .send(Event::ReservationExpired {
                reservation_id: token,
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(reservation_id = %token, "Expired reservation");
        Ok(reservation)
    }

    /// Looks up a reservation by token.
    pub fn get(&self, token: Uuid) -> Option<Reservation> {
        self.registry.get(&token).map(|entry| entry.value().clone())
    }

    /// Expires every pending reservation past its `expires_at`.
    ///
    /// Intended to be called periodically by an external scheduler; each
    /// expiry runs through the normal transition so holds are returned and
    /// ledger entries written exactly as for an explicit expire call.
    #[instrument(skip(self))]
    pub async fn expire_overdue(&self) -> Result<SweepOutcome, ServiceError> {
        let now = Utc::now();
        let due: Vec<Uuid> = self
            .registry
            .iter()
            .filter(|entry| {
                entry.value().status == ReservationStatus::Pending
                    && entry.value().expires_at <= now
            })
            .map(|entry| *entry.key())
            .collect();

        let results =
            futures::future::join_all(due.iter().map(|token| self.expire(*token))).await;

        let mut expired_count = 0u64;
        for (token, result) in due.iter().zip(results) {
            match result {
                Ok(_) => expired_count += 1,
                Err(e) => {
                    warn!(reservation_id = %token, error = %e, "Failed to expire reservation");
                }
            }
        }

        info!(expired_count, "Completed overdue reservation sweep");

        Ok(SweepOutcome {
            expired_count,
            swept_at: now,
        })
    }

    /// Claims the token out of the registry (only while Pending), applies
    /// the per-leaf deltas and ledger entries in one transaction, and
    /// re-inserts the record in its new state. On failure the record is
    /// restored as Pending, so the caller can retry or release.
    async fn settle(
        &self,
        token: Uuid,
        target: ReservationStatus,
        deltas: fn(i64) -> (i64, i64),
    ) -> Result<Reservation, ServiceError> {
        debug_assert!(target.is_terminal());

        let (_, mut reservation) = self
            .registry
            .remove_if(&token, |_, r| r.status == ReservationStatus::Pending)
            .ok_or_else(|| {
                ServiceError::InvalidReservationState(format!(
                    "Reservation {} does not exist or is not pending",
                    token
                ))
            })?;

        let result = self.apply_settlement(&reservation, target, deltas).await;

        match result {
            Ok(()) => {
                reservation.status = target;
                self.registry.insert(token, reservation.clone());
                Ok(reservation)
            }
            Err(e) => {
                self.registry.insert(token, reservation);
                Err(e)
            }
        }
    }

    async fn apply_settlement(
        &self,
        reservation: &Reservation,
        target: ReservationStatus,
        deltas: fn(i64) -> (i64, i64),
    ) -> Result<(), ServiceError> {
        let transaction_type = match target {
            ReservationStatus::Confirmed => TransactionType::ReservationConfirm,
            ReservationStatus::Released => TransactionType::ReservationRelease,
            ReservationStatus::Expired => TransactionType::ReservationExpire,
            ReservationStatus::Pending => {
                return Err(ServiceError::InternalError(
                    "Pending is not a settlement target".to_string(),
                ))
            }
        };

        let keys: Vec<StockKey> = reservation
            .lines
            .iter()
            .map(|line| (reservation.warehouse_id, line.product_id))
            .collect();
        let _guards = self.locks.acquire(&keys, self.lock_timeout).await?;

        let warehouse_id = reservation.warehouse_id;
        let reservation_id = reservation.id;
        let reference_id = reservation.reference_id;
        let lines = reservation.lines.clone();

        let db = &*self.db;
        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                for line in &lines {
                    let (quantity_delta, reserved_delta) = deltas(line.amount);
                    let change = stock::adjust(
                        txn,
                        warehouse_id,
                        line.product_id,
                        quantity_delta,
                        reserved_delta,
                    )
                    .await?;
                    ledger::append(
                        txn,
                        LedgerEntry::from_change(
                            transaction_type,
                            warehouse_id,
                            line.product_id,
                            &change,
                            reference_id,
                            Some(json!({ "reservation_id": reservation_id })),
                        ),
                    )
                    .await?;
                }
                Ok(())
            })
        })
        .await
        .map_err(ServiceError::from_transaction_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_status_round_trips() {
        assert_eq!(ReservationStatus::Pending.as_str(), "pending");
        assert_eq!(ReservationStatus::Expired.as_str(), "expired");
        assert_eq!(
            ReservationStatus::from_str("confirmed"),
            Some(ReservationStatus::Confirmed)
        );
        assert_eq!(ReservationStatus::from_str("cancelled"), None);
    }

    #[test]
    fn terminal_states_are_final() {
        assert!(!ReservationStatus::Pending.is_terminal());
        assert!(ReservationStatus::Confirmed.is_terminal());
        assert!(ReservationStatus::Released.is_terminal());
        assert!(ReservationStatus::Expired.is_terminal());
    }
}
