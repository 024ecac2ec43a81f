//! Bundle resolver: expands bundle products into leaf components with
//! multipliers and derives bundle availability from component stock.
//!
//! Availability is always computed from the leaf rows at read time. It is
//! never stored, so it cannot drift from the stock it is derived from.

use std::collections::BTreeMap;

use async_recursion::async_recursion;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{product, product_bundle};
use crate::errors::ServiceError;
use crate::services::stock;

/// One leaf of an expanded bundle: a non-bundle product and the number of
/// units of it consumed per unit of the expanded root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleLeaf {
    pub product_id: Uuid,
    pub multiplier: i64,
}

/// Expands `product_id` into its leaf components, ordered by leaf product
/// id. A leaf reachable via multiple paths accumulates the sum of the path
/// multipliers. A simple product expands to itself with multiplier 1.
///
/// The traversal keeps the current path and fails `CyclicBundleDefinition`
/// on re-entry, so a cyclic definition is rejected instead of looping.
pub async fn expand<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> Result<Vec<BundleLeaf>, ServiceError> {
    let root = product::Entity::find_by_id(product_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

    if !root.is_bundle() {
        return Ok(vec![BundleLeaf {
            product_id,
            multiplier: 1,
        }]);
    }

    let mut leaves = BTreeMap::new();
    let mut path = Vec::new();
    walk(conn, product_id, 1, &mut path, &mut leaves).await?;

    Ok(leaves
        .into_iter()
        .map(|(product_id, multiplier)| BundleLeaf {
            product_id,
            multiplier,
        })
        .collect())
}

#[async_recursion]
async fn walk<C: ConnectionTrait>(
    conn: &C,
    node: Uuid,
    multiplier: i64,
    path: &mut Vec<Uuid>,
    leaves: &mut BTreeMap<Uuid, i64>,
) -> Result<(), ServiceError> {
    if path.contains(&node) {
        return Err(ServiceError::CyclicBundleDefinition(node));
    }
    path.push(node);

    let edges = product_bundle::Entity::find()
        .filter(product_bundle::Column::BundleProductId.eq(node))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    for edge in edges {
        let component = product::Entity::find_by_id(edge.component_product_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Bundle component {} not found",
                    edge.component_product_id
                ))
            })?;

        let next_multiplier = multiplier * edge.quantity;
        if component.is_bundle() {
            walk(conn, component.id, next_multiplier, path, leaves).await?;
        } else {
            *leaves.entry(component.id).or_insert(0) += next_multiplier;
        }
    }

    path.pop();
    Ok(())
}

/// Available stock for a product in a warehouse.
///
/// Simple product: `quantity - reserved_quantity` (zero when no row exists).
/// Bundle: `min` over leaves of `floor(leaf available / multiplier)` — the
/// scarcest component limits how many bundles can be assembled. A bundle
/// with no components has no availability.
pub async fn available_stock<C: ConnectionTrait>(
    conn: &C,
    warehouse_id: Uuid,
    product_id: Uuid,
) -> Result<i64, ServiceError> {
    let leaves = expand(conn, product_id).await?;
    if leaves.is_empty() {
        return Ok(0);
    }

    let mut available = i64::MAX;
    for leaf in &leaves {
        let leaf_available = stock::snapshot(conn, warehouse_id, leaf.product_id)
            .await?
            .available();
        available = available.min(leaf_available / leaf.multiplier);
    }

    Ok(available.max(0))
}
