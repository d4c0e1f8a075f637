use sea_orm_migration::prelude::*;

use super::m20250601_000001_create_catalog_tables::WorkCenters;
use super::m20250601_000002_create_sales_order_tables::SalesOrders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductionOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductionOrders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProductionOrders::SalesOrderId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionOrders::WorkCenterId)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ProductionOrders::Status)
                            .string_len(32)
                            .not_null()
                            .default("planned"),
                    )
                    .col(
                        ColumnDef::new(ProductionOrders::StartDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ProductionOrders::EndDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ProductionOrders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_production_orders_sales_order_id")
                            .from(ProductionOrders::Table, ProductionOrders::SalesOrderId)
                            .to(SalesOrders::Table, SalesOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_production_orders_work_center_id")
                            .from(ProductionOrders::Table, ProductionOrders::WorkCenterId)
                            .to(WorkCenters::Table, WorkCenters::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Deliveries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Deliveries::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Deliveries::SalesOrderId).integer().not_null())
                    .col(
                        ColumnDef::new(Deliveries::DeliveryDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Deliveries::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Deliveries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deliveries_sales_order_id")
                            .from(Deliveries::Table, Deliveries::SalesOrderId)
                            .to(SalesOrders::Table, SalesOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Billings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Billings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Billings::SalesOrderId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Billings::InvoiceNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Billings::Amount).decimal_len(12, 2).not_null())
                    .col(
                        ColumnDef::new(Billings::BilledDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billings_sales_order_id")
                            .from(Billings::Table, Billings::SalesOrderId)
                            .to(SalesOrders::Table, SalesOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Billings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Deliveries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductionOrders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ProductionOrders {
    Table,
    Id,
    SalesOrderId,
    WorkCenterId,
    Status,
    StartDate,
    EndDate,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Deliveries {
    Table,
    Id,
    SalesOrderId,
    DeliveryDate,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Billings {
    Table,
    Id,
    SalesOrderId,
    InvoiceNumber,
    Amount,
    BilledDate,
}
