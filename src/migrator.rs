use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_bases_table::Migration),
            Box::new(m20240101_000002_create_equipment_types_table::Migration),
            Box::new(m20240101_000003_create_users_table::Migration),
            Box::new(m20240101_000004_create_inventory_balances_table::Migration),
            Box::new(m20240101_000005_create_purchases_table::Migration),
            Box::new(m20240101_000006_create_transfers_table::Migration),
            Box::new(m20240101_000007_create_assignments_table::Migration),
            Box::new(m20240101_000008_create_audit_logs_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_bases_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_bases_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Bases::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Bases::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Bases::Name).string().not_null())
                        .col(ColumnDef::new(Bases::Location).string().not_null())
                        .col(
                            ColumnDef::new(Bases::CreatedAt)
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
                        .name("idx_bases_name")
                        .table(Bases::Table)
                        .col(Bases::Name)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Bases::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Bases {
        Table,
        Id,
        Name,
        Location,
        CreatedAt,
    }
}

mod m20240101_000002_create_equipment_types_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_equipment_types_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(EquipmentTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EquipmentTypes::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(EquipmentTypes::Name).string().not_null())
                        .col(ColumnDef::new(EquipmentTypes::Category).string().not_null())
                        .col(ColumnDef::new(EquipmentTypes::Unit).string().not_null())
                        .col(
                            ColumnDef::new(EquipmentTypes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(EquipmentTypes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum EquipmentTypes {
        Table,
        Id,
        Name,
        Category,
        Unit,
        CreatedAt,
    }
}

mod m20240101_000003_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Users::Username)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Role).string().not_null())
                        .col(ColumnDef::new(Users::BaseId).uuid().null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Users {
        Table,
        Id,
        Username,
        PasswordHash,
        Role,
        BaseId,
        CreatedAt,
    }
}

mod m20240101_000004_create_inventory_balances_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_inventory_balances_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryBalances::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryBalances::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryBalances::BaseId).uuid().not_null())
                        .col(
                            ColumnDef::new(InventoryBalances::EquipmentTypeId)
                                .uuid()
                                .not_null(),
                        )
                        // Non-negativity is enforced by the ledger services; the CHECK
                        // is a storage-layer backstop.
                        .col(
                            ColumnDef::new(InventoryBalances::CurrentBalance)
                                .big_integer()
                                .not_null()
                                .default(0)
                                .check(
                                    Expr::col(InventoryBalances::CurrentBalance)
                                        .gte(0),
                                ),
                        )
                        .col(
                            ColumnDef::new(InventoryBalances::LastUpdated)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_balances_base")
                                .from(InventoryBalances::Table, InventoryBalances::BaseId)
                                .to(
                                    super::m20240101_000001_create_bases_table::Bases::Table,
                                    super::m20240101_000001_create_bases_table::Bases::Id,
                                ),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_balances_equipment_type")
                                .from(
                                    InventoryBalances::Table,
                                    InventoryBalances::EquipmentTypeId,
                                )
                                .to(
                                    super::m20240101_000002_create_equipment_types_table::EquipmentTypes::Table,
                                    super::m20240101_000002_create_equipment_types_table::EquipmentTypes::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            // One balance row per (base, equipment type) pair
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_balances_base_equipment")
                        .table(InventoryBalances::Table)
                        .col(InventoryBalances::BaseId)
                        .col(InventoryBalances::EquipmentTypeId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryBalances::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryBalances {
        Table,
        Id,
        BaseId,
        EquipmentTypeId,
        CurrentBalance,
        LastUpdated,
    }
}

mod m20240101_000005_create_purchases_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_purchases_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Purchases::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Purchases::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Purchases::BaseId).uuid().not_null())
                        .col(ColumnDef::new(Purchases::EquipmentTypeId).uuid().not_null())
                        .col(
                            ColumnDef::new(Purchases::Quantity)
                                .big_integer()
                                .not_null()
                                .check(Expr::col(Purchases::Quantity).gt(0)),
                        )
                        .col(ColumnDef::new(Purchases::Supplier).string().null())
                        .col(
                            ColumnDef::new(Purchases::PurchaseDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Purchases::Notes).string().null())
                        .col(ColumnDef::new(Purchases::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(Purchases::CreatedAt)
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
                        .name("idx_purchases_base_id")
                        .table(Purchases::Table)
                        .col(Purchases::BaseId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchases_purchase_date")
                        .table(Purchases::Table)
                        .col(Purchases::PurchaseDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Purchases::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Purchases {
        Table,
        Id,
        BaseId,
        EquipmentTypeId,
        Quantity,
        Supplier,
        PurchaseDate,
        Notes,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240101_000006_create_transfers_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_transfers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Transfers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Transfers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Transfers::FromBaseId).uuid().not_null())
                        .col(ColumnDef::new(Transfers::ToBaseId).uuid().not_null())
                        .col(ColumnDef::new(Transfers::EquipmentTypeId).uuid().not_null())
                        .col(
                            ColumnDef::new(Transfers::Quantity)
                                .big_integer()
                                .not_null()
                                .check(Expr::col(Transfers::Quantity).gt(0)),
                        )
                        .col(
                            ColumnDef::new(Transfers::Status)
                                .string()
                                .not_null()
                                .default("pending"),
                        )
                        .col(ColumnDef::new(Transfers::Notes).string().null())
                        .col(ColumnDef::new(Transfers::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(Transfers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transfers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transfers_from_base_id")
                        .table(Transfers::Table)
                        .col(Transfers::FromBaseId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transfers_to_base_id")
                        .table(Transfers::Table)
                        .col(Transfers::ToBaseId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transfers_status")
                        .table(Transfers::Table)
                        .col(Transfers::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Transfers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Transfers {
        Table,
        Id,
        FromBaseId,
        ToBaseId,
        EquipmentTypeId,
        Quantity,
        Status,
        Notes,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000007_create_assignments_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_assignments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Assignments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Assignments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Assignments::BaseId).uuid().not_null())
                        .col(
                            ColumnDef::new(Assignments::EquipmentTypeId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Assignments::AssignedTo).string().null())
                        .col(
                            ColumnDef::new(Assignments::Quantity)
                                .big_integer()
                                .not_null()
                                .check(Expr::col(Assignments::Quantity).gt(0)),
                        )
                        .col(ColumnDef::new(Assignments::Kind).string().not_null())
                        .col(ColumnDef::new(Assignments::Notes).string().null())
                        .col(ColumnDef::new(Assignments::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(Assignments::CreatedAt)
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
                        .name("idx_assignments_base_id")
                        .table(Assignments::Table)
                        .col(Assignments::BaseId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_assignments_kind")
                        .table(Assignments::Table)
                        .col(Assignments::Kind)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Assignments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Assignments {
        Table,
        Id,
        BaseId,
        EquipmentTypeId,
        AssignedTo,
        Quantity,
        Kind,
        Notes,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240101_000008_create_audit_logs_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_audit_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AuditLogs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(AuditLogs::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(AuditLogs::UserId).uuid().not_null())
                        .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                        .col(ColumnDef::new(AuditLogs::EntityType).string().not_null())
                        .col(ColumnDef::new(AuditLogs::EntityId).uuid().null())
                        .col(ColumnDef::new(AuditLogs::OldValues).text().null())
                        .col(ColumnDef::new(AuditLogs::NewValues).text().null())
                        .col(
                            ColumnDef::new(AuditLogs::CreatedAt)
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
                        .name("idx_audit_logs_entity")
                        .table(AuditLogs::Table)
                        .col(AuditLogs::EntityType)
                        .col(AuditLogs::EntityId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum AuditLogs {
        Table,
        Id,
        UserId,
        Action,
        EntityType,
        EntityId,
        OldValues,
        NewValues,
        CreatedAt,
    }
}
