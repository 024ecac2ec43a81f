//! Low-stock alerting: per-company report of stocked products running
//! below their threshold, with recent-sales velocity and supplier lead
//! times attached for reordering. Read-only over the stock tables and the
//! ledger; nothing here mutates state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::inventory_transaction::{self, TransactionType};
use crate::entities::{product, supplier, supplier_product, warehouse, warehouse_inventory};
use crate::errors::ServiceError;

/// Low-stock thresholds by product type. Unknown types fall back to
/// [`DEFAULT_THRESHOLD`].
static THRESHOLDS: Lazy<HashMap<&'static str, i64>> =
    Lazy::new(|| HashMap::from([("simple", 20), ("bundle", 10)]));

pub const DEFAULT_THRESHOLD: i64 = 20;

/// Supplier attached to an alert for reordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierInfo {
    pub id: Uuid,
    pub name: String,
    pub contact_email: String,
    pub lead_time_days: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub current_stock: i64,
    pub threshold: i64,
    pub days_until_stockout: i64,
    pub supplier: Option<SupplierInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockReport {
    pub alerts: Vec<LowStockAlert>,
    pub total_alerts: usize,
    pub generated_at: DateTime<Utc>,
}

/// Service producing low-stock reports.
#[derive(Clone)]
pub struct LowStockService {
    db: Arc<DatabaseConnection>,
    lookback_days: i64,
}

impl LowStockService {
    pub fn new(db: Arc<DatabaseConnection>, lookback_days: i64) -> Self {
        Self { db, lookback_days }
    }

    /// Builds the low-stock report for every active warehouse of a company.
    ///
    /// A product only alerts when it has sales activity inside the lookback
    /// window — inactive products never alert, which also keeps the daily
    /// average well-defined. Days-until-stockout is current stock divided
    /// by average daily sales, floored; zero stock reports zero days.
    #[instrument(skip(self))]
    pub async fn low_stock_alerts(&self, company_id: Uuid) -> Result<LowStockReport, ServiceError> {
        let db = &*self.db;
        let since = Utc::now() - chrono::Duration::days(self.lookback_days);

        let warehouses = warehouse::Entity::find()
            .filter(warehouse::Column::CompanyId.eq(company_id))
            .filter(warehouse::Column::IsActive.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut alerts = Vec::new();

        for wh in &warehouses {
            let rows = warehouse_inventory::Entity::find()
                .filter(warehouse_inventory::Column::WarehouseId.eq(wh.id))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?;

            for row in rows {
                let Some(prod) = product::Entity::find_by_id(row.product_id)
                    .one(db)
                    .await
                    .map_err(ServiceError::db_error)?
                else {
                    continue;
                };

                let threshold = THRESHOLDS
                    .get(prod.product_type.as_str())
                    .copied()
                    .unwrap_or(DEFAULT_THRESHOLD);

                if row.quantity > threshold {
                    continue;
                }

                let sold = self.recent_sales(wh.id, row.product_id, since).await?;
                if sold == 0 {
                    continue;
                }

                let avg_daily_sales = sold as f64 / self.lookback_days as f64;
                let days_until_stockout = (row.quantity as f64 / avg_daily_sales) as i64;

                let supplier = self.preferred_supplier(row.product_id).await?;

                alerts.push(LowStockAlert {
                    product_id: prod.id,
                    product_name: prod.name.clone(),
                    sku: prod.sku.clone(),
                    warehouse_id: wh.id,
                    warehouse_name: wh.name.clone(),
                    current_stock: row.quantity,
                    threshold,
                    days_until_stockout,
                    supplier,
                });
            }
        }

        info!(
            company_id = %company_id,
            total_alerts = alerts.len(),
            "Generated low-stock report"
        );

        Ok(LowStockReport {
            total_alerts: alerts.len(),
            alerts,
            generated_at: Utc::now(),
        })
    }

    /// Units sold for the key inside the lookback window, summed from the
    /// ledger (sales carry negative quantity deltas).
    async fn recent_sales(
        &self,
        warehouse_id: Uuid,
        product_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, ServiceError> {
        let sales = inventory_transaction::Entity::find()
            .filter(inventory_transaction::Column::WarehouseId.eq(warehouse_id))
            .filter(inventory_transaction::Column::ProductId.eq(product_id))
            .filter(
                inventory_transaction::Column::TransactionType.eq(TransactionType::Sale.as_str()),
            )
            .filter(inventory_transaction::Column::CreatedAt.gte(since))
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(sales.iter().map(|t| t.quantity_delta.abs()).sum())
    }

    /// Supplier with the shortest lead time for the product, when any.
    async fn preferred_supplier(
        &self,
        product_id: Uuid,
    ) -> Result<Option<SupplierInfo>, ServiceError> {
        let link = supplier_product::Entity::find()
            .filter(supplier_product::Column::ProductId.eq(product_id))
            .order_by_asc(supplier_product::Column::LeadTimeDays)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let Some(link) = link else {
            return Ok(None);
        };

        let supplier_row = supplier::Entity::find_by_id(link.supplier_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(supplier_row.map(|s| SupplierInfo {
            id: s.id,
            name: s.name,
            contact_email: s.contact_email,
            lead_time_days: link.lead_time_days,
        }))
    }
}
