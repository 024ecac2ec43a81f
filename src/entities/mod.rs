// Tenancy
pub mod company;
pub mod warehouse;

// Catalog
pub mod product;
pub mod product_bundle;

// Supply
pub mod supplier;
pub mod supplier_product;

// Engine-owned stock state
pub mod inventory_transaction;
pub mod warehouse_inventory;
