//! StockFlow inventory engine
//!
//! The transactional core of a multi-tenant inventory backend: it applies
//! concurrent stock-affecting operations (sales, restocks, adjustments,
//! reservations, bundle assembly) while keeping `warehouse_inventory` and
//! `inventory_transactions` mutually consistent — every committed stock
//! mutation carries exactly one ledger entry, and the stock invariants
//! (`quantity >= 0`, `reserved_quantity >= 0`, `reserved <= quantity`) hold
//! at every committed state.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod migrator;
pub mod services;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::services::locks::KeyLocks;
use crate::services::{InventoryService, LowStockService, ReservationService};

/// Composition root wiring the engine's services over one connection pool,
/// one event channel, and one shared lock table.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub inventory: InventoryService,
    pub reservations: Arc<ReservationService>,
    pub low_stock: LowStockService,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let locks = Arc::new(KeyLocks::new());

        let inventory = InventoryService::new(
            db.clone(),
            event_sender.clone(),
            locks.clone(),
            config.lock_timeout(),
        );
        let reservations = Arc::new(ReservationService::new(
            db.clone(),
            event_sender.clone(),
            locks,
            config.reservation_ttl(),
            config.lock_timeout(),
        ));
        let low_stock = LowStockService::new(db.clone(), config.low_stock_lookback_days);

        Self {
            db,
            config,
            event_sender,
            inventory,
            reservations,
            low_stock,
        }
    }
}
