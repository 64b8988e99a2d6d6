use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_client_orders_table::Migration),
            Box::new(m20250101_000002_create_client_order_items_table::Migration),
            Box::new(m20250101_000003_create_representatives_table::Migration),
            Box::new(m20250101_000004_create_financial_titles_table::Migration),
            Box::new(m20250101_000005_create_separations_table::Migration),
            Box::new(m20250101_000006_create_separation_items_table::Migration),
            Box::new(m20250101_000007_create_outbox_events_table::Migration),
        ]
    }
}

// Migration implementations

mod m20250101_000001_create_client_orders_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_client_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ClientOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ClientOrders::OrderNumber)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ClientOrders::ClientCode).string().null())
                        .col(ColumnDef::new(ClientOrders::ClientName).string().null())
                        .col(
                            ColumnDef::new(ClientOrders::RepresentativeCode)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(ClientOrders::Status).string().not_null())
                        .col(
                            ColumnDef::new(ClientOrders::OrderDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ClientOrders::ImportedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ClientOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ClientOrders {
        Table,
        OrderNumber,
        ClientCode,
        ClientName,
        RepresentativeCode,
        Status,
        OrderDate,
        ImportedAt,
    }
}

mod m20250101_000002_create_client_order_items_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_client_order_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ClientOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ClientOrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ClientOrderItems::OrderNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ClientOrderItems::ItemCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ClientOrderItems::Description)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ClientOrderItems::QuantityOrdered)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ClientOrderItems::QuantityDelivered)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ClientOrderItems::QuantitySaldo)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ClientOrderItems::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ClientOrderItems::PhysicalStock)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ClientOrderItems::ImportedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_client_order_items_order_number")
                        .table(ClientOrderItems::Table)
                        .col(ClientOrderItems::OrderNumber)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ClientOrderItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ClientOrderItems {
        Table,
        Id,
        OrderNumber,
        ItemCode,
        Description,
        QuantityOrdered,
        QuantityDelivered,
        QuantitySaldo,
        UnitPrice,
        PhysicalStock,
        ImportedAt,
    }
}

mod m20250101_000003_create_representatives_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_representatives_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Representatives::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Representatives::Code)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Representatives::Name).string().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Representatives::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Representatives {
        Table,
        Code,
        Name,
    }
}

mod m20250101_000004_create_financial_titles_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000004_create_financial_titles_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(FinancialTitles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FinancialTitles::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialTitles::ClientCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialTitles::TitleNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialTitles::OpenValue)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FinancialTitles::DueDate).date().not_null())
                        .col(ColumnDef::new(FinancialTitles::Status).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_financial_titles_client_code")
                        .table(FinancialTitles::Table)
                        .col(FinancialTitles::ClientCode)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FinancialTitles::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum FinancialTitles {
        Table,
        Id,
        ClientCode,
        TitleNumber,
        OpenValue,
        DueDate,
        Status,
    }
}

mod m20250101_000005_create_separations_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000005_create_separations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Separations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Separations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Separations::ClientCode).string().not_null())
                        .col(ColumnDef::new(Separations::ClientName).string().not_null())
                        .col(ColumnDef::new(Separations::ItemCount).integer().not_null())
                        .col(
                            ColumnDef::new(Separations::TotalValue)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Separations::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Separations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Separations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Separations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Separations {
        Table,
        Id,
        ClientCode,
        ClientName,
        ItemCount,
        TotalValue,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000006_create_separation_items_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000006_create_separation_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SeparationItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SeparationItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SeparationItems::SeparationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SeparationItems::OrderNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SeparationItems::ItemCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SeparationItems::Description)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SeparationItems::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SeparationItems::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SeparationItems::TotalPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SeparationItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_separation_items_separation")
                                .from(SeparationItems::Table, SeparationItems::SeparationId)
                                .to(Separations::Table, Separations::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_separation_items_separation_id")
                        .table(SeparationItems::Table)
                        .col(SeparationItems::SeparationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SeparationItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum SeparationItems {
        Table,
        Id,
        SeparationId,
        OrderNumber,
        ItemCode,
        Description,
        Quantity,
        UnitPrice,
        TotalPrice,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Separations {
        Table,
        Id,
    }
}

mod m20250101_000007_create_outbox_events_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000007_create_outbox_events_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OutboxEvents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OutboxEvents::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OutboxEvents::EventType).string().not_null())
                        .col(ColumnDef::new(OutboxEvents::Payload).json().not_null())
                        .col(
                            ColumnDef::new(OutboxEvents::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(OutboxEvents::Attempts).integer().not_null())
                        .col(
                            ColumnDef::new(OutboxEvents::AvailableAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OutboxEvents::LastError).string().null())
                        .col(
                            ColumnDef::new(OutboxEvents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OutboxEvents::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_outbox_events_status_available_at")
                        .table(OutboxEvents::Table)
                        .col(OutboxEvents::Status)
                        .col(OutboxEvents::AvailableAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OutboxEvents::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum OutboxEvents {
        Table,
        Id,
        EventType,
        Payload,
        Status,
        Attempts,
        AvailableAt,
        LastError,
        CreatedAt,
        UpdatedAt,
    }
}
