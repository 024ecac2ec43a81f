// Engine internals, composed inside one transaction per operation
pub mod ledger;
pub mod stock;

// Derived availability
pub mod bundles;

// Per-key mutual exclusion
pub mod locks;

// Public facades
pub mod low_stock;
pub mod movements;
pub mod reservations;

pub use low_stock::LowStockService;
pub use movements::InventoryService;
pub use reservations::ReservationService;
