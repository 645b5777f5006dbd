use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_reference_tables::Migration),
            Box::new(m20240301_000002_create_documents_tables::Migration),
            Box::new(m20240301_000003_create_stock_tables::Migration),
        ]
    }
}

mod m20240301_000001_create_reference_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_reference_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Branches::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Branches::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Branches::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Branches::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                        .col(ColumnDef::new(Users::BranchId).uuid().null())
                        .col(
                            ColumnDef::new(Users::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_users_branch_id")
                                .from(Users::Table, Users::BranchId)
                                .to(Branches::Table, Branches::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
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
                        .col(ColumnDef::new(Warehouses::Name).string().not_null())
                        .col(ColumnDef::new(Warehouses::BranchId).uuid().not_null())
                        .col(ColumnDef::new(Warehouses::Location).string().null())
                        .col(
                            ColumnDef::new(Warehouses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_warehouses_branch_id")
                                .from(Warehouses::Table, Warehouses::BranchId)
                                .to(Branches::Table, Branches::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Sku).string().not_null().unique_key())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(
                            ColumnDef::new(Products::UnitPrice)
                                .decimal_len(16, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::Email).string().null())
                        .col(ColumnDef::new(Customers::Phone).string().null())
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

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
                        .col(ColumnDef::new(Suppliers::Country).string().null())
                        .col(ColumnDef::new(Suppliers::Email).string().null())
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                Suppliers::Table.into_iden(),
                Customers::Table.into_iden(),
                Products::Table.into_iden(),
                Warehouses::Table.into_iden(),
                Users::Table.into_iden(),
                Branches::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub(crate) enum Branches {
        Table,
        Id,
        Name,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Name,
        Email,
        BranchId,
        Active,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(crate) enum Warehouses {
        Table,
        Id,
        Name,
        BranchId,
        Location,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(crate) enum Products {
        Table,
        Id,
        Sku,
        Name,
        Description,
        UnitPrice,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Customers {
        Table,
        Id,
        Name,
        Email,
        Phone,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Suppliers {
        Table,
        Id,
        Name,
        Country,
        Email,
        CreatedAt,
    }
}

mod m20240301_000002_create_documents_tables {
    use super::m20240301_000001_create_reference_tables::{Branches, Products};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_documents_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Documents::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Documents::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Documents::Kind).string_len(16).not_null())
                        .col(
                            ColumnDef::new(Documents::Number)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Documents::Status).string_len(16).not_null())
                        .col(ColumnDef::new(Documents::BranchId).uuid().not_null())
                        .col(ColumnDef::new(Documents::CreatedBy).uuid().not_null())
                        .col(ColumnDef::new(Documents::CustomerId).uuid().null())
                        .col(ColumnDef::new(Documents::SupplierId).uuid().null())
                        .col(ColumnDef::new(Documents::WarehouseId).uuid().null())
                        .col(ColumnDef::new(Documents::Currency).string_len(3).not_null())
                        .col(
                            ColumnDef::new(Documents::ExchangeRate)
                                .decimal_len(16, 6)
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Documents::ApplyTax)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Documents::TaxRate)
                                .decimal_len(8, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Documents::Subtotal)
                                .decimal_len(16, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Documents::TaxAmount)
                                .decimal_len(16, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Documents::Total)
                                .decimal_len(16, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Documents::Notes).text().null())
                        .col(
                            ColumnDef::new(Documents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Documents::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_documents_branch_id")
                                .from(Documents::Table, Documents::BranchId)
                                .to(Branches::Table, Branches::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_documents_kind_status")
                        .table(Documents::Table)
                        .col(Documents::Kind)
                        .col(Documents::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_documents_branch_id")
                        .table(Documents::Table)
                        .col(Documents::BranchId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_documents_created_at")
                        .table(Documents::Table)
                        .col(Documents::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DocumentItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DocumentItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DocumentItems::DocumentId).uuid().not_null())
                        .col(ColumnDef::new(DocumentItems::Position).integer().not_null())
                        .col(ColumnDef::new(DocumentItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(DocumentItems::Description).text().null())
                        .col(
                            ColumnDef::new(DocumentItems::Quantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DocumentItems::UnitPrice)
                                .decimal_len(16, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(DocumentItems::LineTotal)
                                .decimal_len(16, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(DocumentItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_document_items_document_id")
                                .from(DocumentItems::Table, DocumentItems::DocumentId)
                                .to(Documents::Table, Documents::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_document_items_product_id")
                                .from(DocumentItems::Table, DocumentItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_document_items_document_id")
                        .table(DocumentItems::Table)
                        .col(DocumentItems::DocumentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DocumentItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Documents::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Documents {
        Table,
        Id,
        Kind,
        Number,
        Status,
        BranchId,
        CreatedBy,
        CustomerId,
        SupplierId,
        WarehouseId,
        Currency,
        ExchangeRate,
        ApplyTax,
        TaxRate,
        Subtotal,
        TaxAmount,
        Total,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DocumentItems {
        Table,
        Id,
        DocumentId,
        Position,
        ProductId,
        Description,
        Quantity,
        UnitPrice,
        LineTotal,
        CreatedAt,
    }
}

mod m20240301_000003_create_stock_tables {
    use super::m20240301_000001_create_reference_tables::{Products, Warehouses};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_stock_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockLevels::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockLevels::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockLevels::WarehouseId).uuid().not_null())
                        .col(ColumnDef::new(StockLevels::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockLevels::Quantity)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockLevels::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_levels_warehouse_id")
                                .from(StockLevels::Table, StockLevels::WarehouseId)
                                .to(Warehouses::Table, Warehouses::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_levels_product_id")
                                .from(StockLevels::Table, StockLevels::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_stock_levels_warehouse_product")
                        .table(StockLevels::Table)
                        .col(StockLevels::WarehouseId)
                        .col(StockLevels::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::WarehouseId).uuid().not_null())
                        .col(ColumnDef::new(StockMovements::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockMovements::Quantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string_len(24)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::ReferenceId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_reference_id")
                        .table(StockMovements::Table)
                        .col(StockMovements::ReferenceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockLevels::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockLevels {
        Table,
        Id,
        WarehouseId,
        ProductId,
        Quantity,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum StockMovements {
        Table,
        Id,
        WarehouseId,
        ProductId,
        Quantity,
        MovementType,
        ReferenceId,
        CreatedAt,
    }
}
