use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of product. Bundles carry no stock of their own; their availability
/// is derived from component stock at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    Simple,
    Bundle,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Simple => "simple",
            ProductType::Bundle => "bundle",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "simple" => Some(ProductType::Simple),
            "bundle" => Some(ProductType::Bundle),
            _ => None,
        }
    }
}

/// Catalog entry, unique per company by SKU (`uq_products_company_sku`).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub sku: String,
    pub name: String,
    pub product_type: String, // Storing as string in DB, but will convert to/from enum
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn is_bundle(&self) -> bool {
        ProductType::from_str(&self.product_type) == Some(ProductType::Bundle)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_type_round_trips() {
        assert_eq!(ProductType::Simple.as_str(), "simple");
        assert_eq!(ProductType::Bundle.as_str(), "bundle");
        assert_eq!(ProductType::from_str("bundle"), Some(ProductType::Bundle));
        assert_eq!(ProductType::from_str("virtual"), None);
    }
}
