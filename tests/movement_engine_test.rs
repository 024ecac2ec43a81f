mod common;

use common::TestApp;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use stockflow_api::entities::inventory_transaction::{self, TransactionType};
use stockflow_api::errors::ServiceError;
use uuid::Uuid;

async fn ledger_rows(
    app: &TestApp,
    warehouse_id: Uuid,
    product_id: Uuid,
) -> Vec<inventory_transaction::Model> {
    inventory_transaction::Entity::find()
        .filter(inventory_transaction::Column::WarehouseId.eq(warehouse_id))
        .filter(inventory_transaction::Column::ProductId.eq(product_id))
        .all(&*app.state.db)
        .await
        .expect("ledger query")
}

#[tokio::test]
async fn restock_creates_row_and_ledger_entry() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let warehouse = app.seed_warehouse(company, "MAIN").await;
    let product = app.seed_product(company, "WIDGET-1", "simple").await;

    let result = app
        .state
        .inventory
        .restock(warehouse, product, 100, None)
        .await
        .expect("restock");

    assert_eq!(result.change.before.quantity, 0);
    assert_eq!(result.change.after.quantity, 100);

    let stock = app.state.inventory.get_stock(warehouse, product).await.unwrap();
    assert_eq!(stock.quantity, 100);
    assert_eq!(stock.reserved_quantity, 0);

    let rows = ledger_rows(&app, warehouse, product).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].transaction_type, TransactionType::Restock.as_str());
    assert_eq!(rows[0].quantity_delta, 100);
    assert_eq!(rows[0].quantity_before, 0);
    assert_eq!(rows[0].quantity_after, 100);
}

#[tokio::test]
async fn sale_debits_stock_and_records_ledger() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let warehouse = app.seed_warehouse(company, "MAIN").await;
    let product = app.seed_product(company, "WIDGET-1", "simple").await;

    app.state
        .inventory
        .restock(warehouse, product, 100, None)
        .await
        .unwrap();

    let result = app
        .state
        .inventory
        .sale(warehouse, product, 30, None)
        .await
        .expect("sale");
    assert_eq!(result.change.after.quantity, 70);

    let sales = inventory_transaction::Entity::find()
        .filter(inventory_transaction::Column::WarehouseId.eq(warehouse))
        .filter(inventory_transaction::Column::ProductId.eq(product))
        .filter(
            inventory_transaction::Column::TransactionType.eq(TransactionType::Sale.as_str()),
        )
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].quantity_delta, -30);
    assert_eq!(sales[0].quantity_before, 100);
    assert_eq!(sales[0].quantity_after, 70);
}

#[tokio::test]
async fn sale_beyond_available_fails_and_leaves_state_unchanged() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let warehouse = app.seed_warehouse(company, "MAIN").await;
    let product = app.seed_product(company, "WIDGET-1", "simple").await;

    app.state
        .inventory
        .restock(warehouse, product, 100, None)
        .await
        .unwrap();
    app.state
        .inventory
        .sale(warehouse, product, 30, None)
        .await
        .unwrap();
    app.state
        .reservations
        .create(warehouse, product, 20, None)
        .await
        .unwrap();

    // Available is 70 - 20 = 50; a sale of 60 must fail without side effects.
    let ledger_before = ledger_rows(&app, warehouse, product).await.len();
    let err = app
        .state
        .inventory
        .sale(warehouse, product, 60, None)
        .await
        .expect_err("oversell must fail");
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    let stock = app.state.inventory.get_stock(warehouse, product).await.unwrap();
    assert_eq!(stock.quantity, 70);
    assert_eq!(stock.reserved_quantity, 20);
    assert_eq!(ledger_rows(&app, warehouse, product).await.len(), ledger_before);
}

#[tokio::test]
async fn sale_against_missing_row_fails() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let warehouse = app.seed_warehouse(company, "MAIN").await;
    let product = app.seed_product(company, "WIDGET-1", "simple").await;

    let err = app
        .state
        .inventory
        .sale(warehouse, product, 1, None)
        .await
        .expect_err("no stock row exists");
    assert!(matches!(err, ServiceError::UnknownInventoryRow { .. }));
}

#[tokio::test]
async fn non_positive_quantities_fail_fast_without_side_effects() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let warehouse = app.seed_warehouse(company, "MAIN").await;
    let product = app.seed_product(company, "WIDGET-1", "simple").await;

    for quantity in [0, -5] {
        let err = app
            .state
            .inventory
            .sale(warehouse, product, quantity, None)
            .await
            .expect_err("invalid quantity");
        assert!(matches!(err, ServiceError::InvalidQuantity(_)));

        let err = app
            .state
            .inventory
            .restock(warehouse, product, quantity, None)
            .await
            .expect_err("invalid quantity");
        assert!(matches!(err, ServiceError::InvalidQuantity(_)));
    }

    assert!(ledger_rows(&app, warehouse, product).await.is_empty());
}

#[tokio::test]
async fn bundles_cannot_be_restocked_or_sold_directly() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let warehouse = app.seed_warehouse(company, "MAIN").await;
    let leaf = app.seed_product(company, "PART-1", "simple").await;
    let bundle = app.seed_product(company, "KIT-1", "bundle").await;
    app.seed_bundle_edge(bundle, leaf, 2).await;

    let err = app
        .state
        .inventory
        .restock(warehouse, bundle, 10, None)
        .await
        .expect_err("bundle restock");
    assert!(matches!(err, ServiceError::NotRestockable(_)));

    let err = app
        .state
        .inventory
        .sale(warehouse, bundle, 1, None)
        .await
        .expect_err("bundle sale");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    let err = app
        .state
        .inventory
        .adjustment(warehouse, bundle, 5, "count".to_string(), None)
        .await
        .expect_err("bundle adjustment");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn zero_delta_adjustment_is_rejected() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let warehouse = app.seed_warehouse(company, "MAIN").await;
    let product = app.seed_product(company, "WIDGET-1", "simple").await;

    let err = app
        .state
        .inventory
        .adjustment(warehouse, product, 0, "cycle count".to_string(), None)
        .await
        .expect_err("no-op adjustment");
    assert!(matches!(err, ServiceError::NoOpAdjustment));
    assert!(ledger_rows(&app, warehouse, product).await.is_empty());
}

#[tokio::test]
async fn adjustment_applies_signed_delta_with_reason_metadata() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let warehouse = app.seed_warehouse(company, "MAIN").await;
    let product = app.seed_product(company, "WIDGET-1", "simple").await;

    app.state
        .inventory
        .restock(warehouse, product, 50, None)
        .await
        .unwrap();
    let result = app
        .state
        .inventory
        .adjustment(warehouse, product, -20, "damaged in transit".to_string(), None)
        .await
        .expect("adjustment");
    assert_eq!(result.change.after.quantity, 30);

    let rows = ledger_rows(&app, warehouse, product).await;
    let adjustment = rows
        .iter()
        .find(|r| r.transaction_type == TransactionType::Adjustment.as_str())
        .expect("adjustment ledger row");
    assert_eq!(adjustment.quantity_delta, -20);
    let metadata = adjustment.metadata.as_ref().expect("metadata");
    assert_eq!(metadata["reason"], "damaged in transit");
}

#[tokio::test]
async fn adjustment_cannot_break_reserved_limit() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let warehouse = app.seed_warehouse(company, "MAIN").await;
    let product = app.seed_product(company, "WIDGET-1", "simple").await;

    app.state
        .inventory
        .restock(warehouse, product, 10, None)
        .await
        .unwrap();
    app.state
        .reservations
        .create(warehouse, product, 5, None)
        .await
        .unwrap();

    // 10 - 8 = 2 on hand would undercut the 5 reserved.
    let err = app
        .state
        .inventory
        .adjustment(warehouse, product, -8, "shrinkage".to_string(), None)
        .await
        .expect_err("invariant break");
    assert!(matches!(err, ServiceError::InvariantViolation(_)));

    let stock = app.state.inventory.get_stock(warehouse, product).await.unwrap();
    assert_eq!(stock.quantity, 10);
    assert_eq!(stock.reserved_quantity, 5);
}

#[tokio::test]
async fn every_mutation_records_exactly_one_consistent_ledger_row() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let warehouse = app.seed_warehouse(company, "MAIN").await;
    let product = app.seed_product(company, "WIDGET-1", "simple").await;

    app.state
        .inventory
        .restock(warehouse, product, 40, None)
        .await
        .unwrap();
    app.state
        .inventory
        .sale(warehouse, product, 15, None)
        .await
        .unwrap();
    app.state
        .inventory
        .adjustment(warehouse, product, 3, "found in returns bin".to_string(), None)
        .await
        .unwrap();

    let rows = ledger_rows(&app, warehouse, product).await;
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.quantity_after - row.quantity_before, row.quantity_delta);
        assert_eq!(row.reserved_after - row.reserved_before, row.reserved_delta);
    }

    let stock = app.state.inventory.get_stock(warehouse, product).await.unwrap();
    assert_eq!(stock.quantity, 28);
}

#[tokio::test]
async fn unknown_product_is_rejected_before_any_store_access() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let warehouse = app.seed_warehouse(company, "MAIN").await;

    let err = app
        .state
        .inventory
        .sale(warehouse, Uuid::new_v4(), 1, None)
        .await
        .expect_err("unknown product");
    assert!(matches!(err, ServiceError::NotFound(_)));
}
