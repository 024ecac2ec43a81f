use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_tenancy_tables::Migration),
            Box::new(m20240301_000002_create_catalog_tables::Migration),
            Box::new(m20240301_000003_create_supplier_tables::Migration),
            Box::new(m20240301_000004_create_warehouse_inventory_table::Migration),
            Box::new(m20240301_000005_create_inventory_transactions_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_tenancy_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_tenancy_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Companies::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Companies::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Companies::Name).string().not_null())
                        .col(
                            ColumnDef::new(Companies::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Companies::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Warehouses::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(Warehouses::Code).string().not_null())
                        .col(ColumnDef::new(Warehouses::Name).string().not_null())
                        .col(
                            ColumnDef::new(Warehouses::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Warehouses::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_warehouses_company_code")
                        .table(Warehouses::Table)
                        .col(Warehouses::CompanyId)
                        .col(Warehouses::Code)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Companies::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Companies {
        Table,
        Id,
        Name,
        IsActive,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Warehouses {
        Table,
        Id,
        CompanyId,
        Code,
        Name,
        IsActive,
        CreatedAt,
    }
}

mod m20240301_000002_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(Products::Sku).string().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(
                            ColumnDef::new(Products::ProductType)
                                .string()
                                .not_null()
                                .default("simple"),
                        )
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_products_company_sku")
                        .table(Products::Table)
                        .col(Products::CompanyId)
                        .col(Products::Sku)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // Bundle composition edges. Self-reference and non-positive
            // multipliers are rejected here; acyclicity cannot be expressed
            // as a constraint and is enforced by the resolver at runtime.
            manager
                .create_table(
                    Table::create()
                        .table(ProductBundles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductBundles::BundleProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductBundles::ComponentProductId)
                                .uuid()
                                .not_null()
                                .check(
                                    Expr::col(ProductBundles::ComponentProductId)
                                        .ne(Expr::col(ProductBundles::BundleProductId)),
                                ),
                        )
                        .col(
                            ColumnDef::new(ProductBundles::Quantity)
                                .big_integer()
                                .not_null()
                                .check(Expr::col(ProductBundles::Quantity).gt(0)),
                        )
                        .primary_key(
                            Index::create()
                                .col(ProductBundles::BundleProductId)
                                .col(ProductBundles::ComponentProductId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_bundles_component")
                        .table(ProductBundles::Table)
                        .col(ProductBundles::ComponentProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductBundles::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        CompanyId,
        Sku,
        Name,
        ProductType,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductBundles {
        Table,
        BundleProductId,
        ComponentProductId,
        Quantity,
    }
}

mod m20240301_000003_create_supplier_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_supplier_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(
                            ColumnDef::new(Suppliers::ContactEmail)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierProducts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierProducts::SupplierId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierProducts::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierProducts::LeadTimeDays)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .primary_key(
                            Index::create()
                                .col(SupplierProducts::SupplierId)
                                .col(SupplierProducts::ProductId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_supplier_products_product")
                        .table(SupplierProducts::Table)
                        .col(SupplierProducts::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SupplierProducts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Suppliers {
        Table,
        Id,
        Name,
        ContactEmail,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum SupplierProducts {
        Table,
        SupplierId,
        ProductId,
        LeadTimeDays,
    }
}

mod m20240301_000004_create_warehouse_inventory_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_warehouse_inventory_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // The CHECKs restate the engine's invariants so the store rejects
            // at commit anything the pre-checks missed.
            manager
                .create_table(
                    Table::create()
                        .table(WarehouseInventory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WarehouseInventory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::Quantity)
                                .big_integer()
                                .not_null()
                                .default(0)
                                .check(Expr::col(WarehouseInventory::Quantity).gte(0)),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::ReservedQuantity)
                                .big_integer()
                                .not_null()
                                .default(0)
                                .check(
                                    Expr::col(WarehouseInventory::ReservedQuantity)
                                        .gte(0)
                                        .and(
                                            Expr::col(WarehouseInventory::ReservedQuantity)
                                                .lte(Expr::col(WarehouseInventory::Quantity)),
                                        ),
                                ),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::UpdatedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_wh_product")
                        .table(WarehouseInventory::Table)
                        .col(WarehouseInventory::WarehouseId)
                        .col(WarehouseInventory::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WarehouseInventory::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum WarehouseInventory {
        Table,
        Id,
        WarehouseId,
        ProductId,
        Quantity,
        ReservedQuantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000005_create_inventory_transactions_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_inventory_transactions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::TransactionType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::QuantityDelta)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ReservedDelta)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::QuantityBefore)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::QuantityAfter)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ReservedBefore)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ReservedAfter)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ReferenceId)
                                .uuid()
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryTransactions::Metadata).json().null())
                        .col(
                            ColumnDef::new(InventoryTransactions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_transactions_wh_product")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::WarehouseId)
                        .col(InventoryTransactions::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_transactions_type")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::TransactionType)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_transactions_created_at")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryTransactions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryTransactions {
        Table,
        Id,
        WarehouseId,
        ProductId,
        TransactionType,
        QuantityDelta,
        ReservedDelta,
        QuantityBefore,
        QuantityAfter,
        ReservedBefore,
        ReservedAfter,
        ReferenceId,
        Metadata,
        CreatedAt,
    }
}
