#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::mpsc;
use uuid::Uuid;

use stockflow_api::{
    config::AppConfig,
    db,
    entities::{company, product, product_bundle, supplier, supplier_product, warehouse},
    events::{self, EventSender},
    AppState,
};

/// Helper harness for spinning up an application state backed by a
/// file-based SQLite database pinned to a single pooled connection.
pub struct TestApp {
    pub state: AppState,
    db_path: PathBuf,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_path = std::env::temp_dir().join(format!(
            "stockflow_test_{}.db",
            Uuid::new_v4().simple()
        ));
        let _ = std::fs::remove_file(&db_path);

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        stockflow_api::logging::init_telemetry(&cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("db connect");
        db::run_migrations(&pool).await.expect("migrations");

        let (tx, rx) = mpsc::channel(256);
        let sender = EventSender::new(tx);
        let event_task = tokio::spawn(events::process_events(rx));

        let state = AppState::new(Arc::new(pool), cfg, sender);

        Self {
            state,
            db_path,
            _event_task: event_task,
        }
    }

    pub async fn seed_company(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        company::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed company");
        id
    }

    pub async fn seed_warehouse(&self, company_id: Uuid, code: &str) -> Uuid {
        let id = Uuid::new_v4();
        warehouse::ActiveModel {
            id: Set(id),
            company_id: Set(company_id),
            code: Set(code.to_string()),
            name: Set(format!("Warehouse {}", code)),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed warehouse");
        id
    }

    pub async fn seed_product(&self, company_id: Uuid, sku: &str, product_type: &str) -> Uuid {
        let id = Uuid::new_v4();
        product::ActiveModel {
            id: Set(id),
            company_id: Set(company_id),
            sku: Set(sku.to_string()),
            name: Set(format!("Product {}", sku)),
            product_type: Set(product_type.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product");
        id
    }

    pub async fn seed_bundle_edge(&self, bundle_id: Uuid, component_id: Uuid, quantity: i64) {
        product_bundle::ActiveModel {
            bundle_product_id: Set(bundle_id),
            component_product_id: Set(component_id),
            quantity: Set(quantity),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed bundle edge");
    }

    pub async fn seed_supplier(&self, name: &str, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        supplier::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            contact_email: Set(email.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed supplier");
        id
    }

    pub async fn link_supplier(&self, supplier_id: Uuid, product_id: Uuid, lead_time_days: i32) {
        supplier_product::ActiveModel {
            supplier_id: Set(supplier_id),
            product_id: Set(product_id),
            lead_time_days: Set(lead_time_days),
        }
        .insert(&*self.state.db)
        .await
        .expect("link supplier");
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
        for suffix in ["-wal", "-shm"] {
            let mut sidecar = self.db_path.as_os_str().to_owned();
            sidecar.push(suffix);
            let _ = std::fs::remove_file(PathBuf::from(sidecar));
        }
    }
}
