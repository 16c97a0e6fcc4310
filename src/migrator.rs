use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_print_orders_table::Migration),
            Box::new(m20240301_000002_create_order_progress_table::Migration),
            Box::new(m20240301_000003_create_design_files_table::Migration),
        ]
    }
}

mod m20240301_000001_create_print_orders_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_print_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PrintOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PrintOrders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(PrintOrders::OwnerId).string().not_null())
                        .col(ColumnDef::new(PrintOrders::MaterialType).string().not_null())
                        .col(ColumnDef::new(PrintOrders::Width).double().not_null())
                        .col(ColumnDef::new(PrintOrders::Height).double().not_null())
                        .col(ColumnDef::new(PrintOrders::Depth).double().not_null())
                        .col(ColumnDef::new(PrintOrders::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(PrintOrders::PrintStyle)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PrintOrders::ColorPreferences).json().null())
                        .col(ColumnDef::new(PrintOrders::FilePath).string().not_null())
                        .col(ColumnDef::new(PrintOrders::FileName).string().not_null())
                        .col(ColumnDef::new(PrintOrders::FileSize).big_integer().not_null())
                        .col(ColumnDef::new(PrintOrders::ContactName).string().not_null())
                        .col(ColumnDef::new(PrintOrders::ContactEmail).string().not_null())
                        .col(ColumnDef::new(PrintOrders::ContactPhone).string().null())
                        .col(ColumnDef::new(PrintOrders::ShippingAddress).text().not_null())
                        .col(ColumnDef::new(PrintOrders::CustomerNotes).text().null())
                        .col(money(PrintOrders::BasePrice))
                        .col(money(PrintOrders::TaxAmount))
                        .col(money(PrintOrders::ShippingCost))
                        .col(money(PrintOrders::TotalPrice))
                        .col(
                            ColumnDef::new(PrintOrders::Status)
                                .string_len(32)
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(PrintOrders::PaymentStatus)
                                .string_len(32)
                                .not_null()
                                .default("pending"),
                        )
                        .col(ColumnDef::new(PrintOrders::TrackingNumber).string().null())
                        .col(ColumnDef::new(PrintOrders::InternalNotes).text().null())
                        .col(ColumnDef::new(PrintOrders::TrackingUpdates).json().not_null())
                        .col(
                            ColumnDef::new(PrintOrders::EstimatedDelivery)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PrintOrders::ActualDelivery)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PrintOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PrintOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            for (name, column) in [
                ("idx_print_orders_owner_id", PrintOrders::OwnerId),
                ("idx_print_orders_status", PrintOrders::Status),
                ("idx_print_orders_payment_status", PrintOrders::PaymentStatus),
                ("idx_print_orders_created_at", PrintOrders::CreatedAt),
            ] {
                manager
                    .create_index(
                        Index::create()
                            .if_not_exists()
                            .name(name)
                            .table(PrintOrders::Table)
                            .col(column)
                            .to_owned(),
                    )
                    .await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PrintOrders::Table).to_owned())
                .await
        }
    }

    fn money(column: PrintOrders) -> ColumnDef {
        ColumnDef::new(column)
            .decimal_len(12, 2)
            .not_null()
            .default(0)
            .to_owned()
    }

    #[derive(DeriveIden)]
    pub(super) enum PrintOrders {
        Table,
        Id,
        OwnerId,
        MaterialType,
        Width,
        Height,
        Depth,
        Quantity,
        PrintStyle,
        ColorPreferences,
        FilePath,
        FileName,
        FileSize,
        ContactName,
        ContactEmail,
        ContactPhone,
        ShippingAddress,
        CustomerNotes,
        BasePrice,
        TaxAmount,
        ShippingCost,
        TotalPrice,
        Status,
        PaymentStatus,
        TrackingNumber,
        InternalNotes,
        TrackingUpdates,
        EstimatedDelivery,
        ActualDelivery,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_order_progress_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_order_progress_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderProgress::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderProgress::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrderProgress::OrderId).integer().not_null())
                        .col(
                            ColumnDef::new(OrderProgress::Status)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderProgress::Description).text().not_null())
                        .col(ColumnDef::new(OrderProgress::UpdatedBy).string().null())
                        .col(
                            ColumnDef::new(OrderProgress::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_progress_order_id")
                                .from(OrderProgress::Table, OrderProgress::OrderId)
                                .to(PrintOrders::Table, PrintOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_progress_order_id")
                        .table(OrderProgress::Table)
                        .col(OrderProgress::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderProgress::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum OrderProgress {
        Table,
        Id,
        OrderId,
        Status,
        Description,
        UpdatedBy,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum PrintOrders {
        Table,
        Id,
    }
}

mod m20240301_000003_create_design_files_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_design_files_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DesignFiles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DesignFiles::FilePath)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(DesignFiles::OwnerId).string().not_null())
                        .col(ColumnDef::new(DesignFiles::FileName).string().not_null())
                        .col(ColumnDef::new(DesignFiles::FileSize).big_integer().not_null())
                        .col(
                            ColumnDef::new(DesignFiles::CreatedAt)
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
                        .name("idx_design_files_owner_id")
                        .table(DesignFiles::Table)
                        .col(DesignFiles::OwnerId)
                        .to_owned(),
                )
                .await?;

            // one order per design file
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_print_orders_file_path")
                        .table(PrintOrders::Table)
                        .col(PrintOrders::FilePath)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_index(
                    Index::drop()
                        .name("idx_print_orders_file_path")
                        .table(PrintOrders::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(DesignFiles::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DesignFiles {
        Table,
        FilePath,
        OwnerId,
        FileName,
        FileSize,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum PrintOrders {
        Table,
        FilePath,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectOptions, ConnectionTrait, Database, Statement};

    #[tokio::test]
    async fn migrations_create_all_tables_on_sqlite() {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1);
        let db = Database::connect(opt).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        for table in ["print_orders", "order_progress", "design_files"] {
            let row = db
                .query_one(Statement::from_string(
                    db.get_database_backend(),
                    format!(
                        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = '{}'",
                        table
                    ),
                ))
                .await
                .unwrap();
            assert!(row.is_some(), "missing table {}", table);
        }

        let unique_index = db
            .query_one(Statement::from_string(
                db.get_database_backend(),
                "SELECT sql FROM sqlite_master WHERE type = 'index' AND name = 'idx_print_orders_file_path'"
                    .to_owned(),
            ))
            .await
            .unwrap()
            .expect("file_path index");
        let sql: String = unique_index.try_get("", "sql").unwrap();
        assert!(sql.to_uppercase().contains("UNIQUE"), "{}", sql);

        Migrator::down(&db, None).await.unwrap();
    }
}
