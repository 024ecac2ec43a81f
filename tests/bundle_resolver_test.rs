mod common;

use common::TestApp;
use stockflow_api::errors::ServiceError;
use stockflow_api::services::bundles;

#[tokio::test]
async fn simple_product_expands_to_itself() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let product = app.seed_product(company, "PART-1", "simple").await;

    let leaves = bundles::expand(&*app.state.db, product).await.unwrap();
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].product_id, product);
    assert_eq!(leaves[0].multiplier, 1);
}

#[tokio::test]
async fn bundle_expands_to_leaves_with_multipliers() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let x = app.seed_product(company, "PART-X", "simple").await;
    let y = app.seed_product(company, "PART-Y", "simple").await;
    let bundle = app.seed_product(company, "KIT-1", "bundle").await;
    app.seed_bundle_edge(bundle, x, 2).await;
    app.seed_bundle_edge(bundle, y, 1).await;

    let leaves = bundles::expand(&*app.state.db, bundle).await.unwrap();
    assert_eq!(leaves.len(), 2);
    for leaf in &leaves {
        if leaf.product_id == x {
            assert_eq!(leaf.multiplier, 2);
        } else {
            assert_eq!(leaf.product_id, y);
            assert_eq!(leaf.multiplier, 1);
        }
    }
}

#[tokio::test]
async fn nested_bundles_multiply_along_paths_and_accumulate_shared_leaves() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let x = app.seed_product(company, "PART-X", "simple").await;
    let inner = app.seed_product(company, "KIT-INNER", "bundle").await;
    let outer = app.seed_product(company, "KIT-OUTER", "bundle").await;

    // outer = 2 x inner + 4 x X; inner = 3 x X
    // X is reached twice: 2 * 3 + 4 = 10
    app.seed_bundle_edge(inner, x, 3).await;
    app.seed_bundle_edge(outer, inner, 2).await;
    app.seed_bundle_edge(outer, x, 4).await;

    let leaves = bundles::expand(&*app.state.db, outer).await.unwrap();
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].product_id, x);
    assert_eq!(leaves[0].multiplier, 10);

    // Expansion is idempotent: a second traversal yields the same mapping.
    let again = bundles::expand(&*app.state.db, outer).await.unwrap();
    assert_eq!(leaves, again);
}

#[tokio::test]
async fn cyclic_bundle_definition_is_rejected_not_looped() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let a = app.seed_product(company, "KIT-A", "bundle").await;
    let b = app.seed_product(company, "KIT-B", "bundle").await;
    app.seed_bundle_edge(a, b, 1).await;
    app.seed_bundle_edge(b, a, 1).await;

    let err = bundles::expand(&*app.state.db, a)
        .await
        .expect_err("cycle must be detected");
    assert!(matches!(err, ServiceError::CyclicBundleDefinition(_)));

    let err = bundles::available_stock(&*app.state.db, uuid::Uuid::new_v4(), b)
        .await
        .expect_err("cycle must be detected through availability too");
    assert!(matches!(err, ServiceError::CyclicBundleDefinition(_)));
}

#[tokio::test]
async fn bundle_availability_is_limited_by_scarcest_component() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let warehouse = app.seed_warehouse(company, "MAIN").await;
    let x = app.seed_product(company, "PART-X", "simple").await;
    let y = app.seed_product(company, "PART-Y", "simple").await;
    let bundle = app.seed_product(company, "KIT-1", "bundle").await;
    app.seed_bundle_edge(bundle, x, 2).await;
    app.seed_bundle_edge(bundle, y, 1).await;

    app.state.inventory.restock(warehouse, x, 10, None).await.unwrap();
    app.state.inventory.restock(warehouse, y, 3, None).await.unwrap();

    // min(floor(10 / 2), floor(3 / 1)) = min(5, 3) = 3
    let available = app
        .state
        .inventory
        .available_stock(warehouse, bundle)
        .await
        .unwrap();
    assert_eq!(available, 3);
}

#[tokio::test]
async fn bundle_availability_subtracts_component_reservations() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let warehouse = app.seed_warehouse(company, "MAIN").await;
    let x = app.seed_product(company, "PART-X", "simple").await;
    let bundle = app.seed_product(company, "KIT-1", "bundle").await;
    app.seed_bundle_edge(bundle, x, 2).await;

    app.state.inventory.restock(warehouse, x, 10, None).await.unwrap();
    assert_eq!(
        app.state.inventory.available_stock(warehouse, bundle).await.unwrap(),
        5
    );

    app.state.reservations.create(warehouse, x, 4, None).await.unwrap();
    // 6 available units of X support floor(6 / 2) = 3 bundles.
    assert_eq!(
        app.state.inventory.available_stock(warehouse, bundle).await.unwrap(),
        3
    );
}

#[tokio::test]
async fn bundle_without_components_has_zero_availability() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let warehouse = app.seed_warehouse(company, "MAIN").await;
    let bundle = app.seed_product(company, "KIT-EMPTY", "bundle").await;

    let leaves = bundles::expand(&*app.state.db, bundle).await.unwrap();
    assert!(leaves.is_empty());
    assert_eq!(
        app.state.inventory.available_stock(warehouse, bundle).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn simple_product_availability_reads_stock_row() {
    let app = TestApp::new().await;
    let company = app.seed_company("Acme").await;
    let warehouse = app.seed_warehouse(company, "MAIN").await;
    let product = app.seed_product(company, "PART-1", "simple").await;

    assert_eq!(
        app.state.inventory.available_stock(warehouse, product).await.unwrap(),
        0
    );

    app.state.inventory.restock(warehouse, product, 7, None).await.unwrap();
    app.state.reservations.create(warehouse, product, 3, None).await.unwrap();
    assert_eq!(
        app.state.inventory.available_stock(warehouse, product).await.unwrap(),
        4
    );
}
