use sea_orm_migration::prelude::*;

use super::m20250601_000001_create_catalog_tables::{Customers, Products};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SalesOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SalesOrders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SalesOrders::CustomerId).integer().not_null())
                    .col(
                        ColumnDef::new(SalesOrders::TotalAmount)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(SalesOrders::Status)
                            .string_len(32)
                            .not_null()
                            .default("created"),
                    )
                    .col(
                        ColumnDef::new(SalesOrders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalesOrders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_orders_customer_id")
                            .from(SalesOrders::Table, SalesOrders::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SalesOrderItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SalesOrderItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SalesOrderItems::SalesOrderId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalesOrderItems::ProductId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalesOrderItems::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalesOrderItems::Subtotal)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_order_items_sales_order_id")
                            .from(SalesOrderItems::Table, SalesOrderItems::SalesOrderId)
                            .to(SalesOrders::Table, SalesOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_order_items_product_id")
                            .from(SalesOrderItems::Table, SalesOrderItems::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SalesOrderItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SalesOrders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SalesOrders {
    Table,
    Id,
    CustomerId,
    TotalAmount,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum SalesOrderItems {
    Table,
    Id,
    SalesOrderId,
    ProductId,
    Quantity,
    Subtotal,
}
