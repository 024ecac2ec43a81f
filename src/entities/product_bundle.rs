use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directed composition edge: `bundle_product` contains `quantity` units of
/// `component_product`. The schema forbids self-reference but cannot forbid
/// cycles; the bundle resolver detects those at expansion time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_bundles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub bundle_product_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub component_product_id: Uuid,
    pub quantity: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::BundleProductId",
        to = "super::product::Column::Id"
    )]
    BundleProduct,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ComponentProductId",
        to = "super::product::Column::Id"
    )]
    ComponentProduct,
}

impl ActiveModelBehavior for ActiveModel {}
