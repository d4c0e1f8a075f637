use sea_orm_migration::prelude::*;

use super::m20250601_000002_create_sales_order_tables::{SalesOrderItems, SalesOrders};
use super::m20250601_000003_create_fulfillment_tables::{Deliveries, ProductionOrders};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Order list filters: by customer, by status, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_sales_orders_customer_status")
                    .table(SalesOrders::Table)
                    .col(SalesOrders::CustomerId)
                    .col(SalesOrders::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sales_orders_created_at")
                    .table(SalesOrders::Table)
                    .col((SalesOrders::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sales_order_items_sales_order_id")
                    .table(SalesOrderItems::Table)
                    .col(SalesOrderItems::SalesOrderId)
                    .to_owned(),
            )
            .await?;

        // Top-products aggregation groups by product
        manager
            .create_index(
                Index::create()
                    .name("idx_sales_order_items_product_id")
                    .table(SalesOrderItems::Table)
                    .col(SalesOrderItems::ProductId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_production_orders_sales_order_id")
                    .table(ProductionOrders::Table)
                    .col(ProductionOrders::SalesOrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_production_orders_status")
                    .table(ProductionOrders::Table)
                    .col(ProductionOrders::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_deliveries_sales_order_id")
                    .table(Deliveries::Table)
                    .col(Deliveries::SalesOrderId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_deliveries_sales_order_id")
                    .table(Deliveries::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_production_orders_status")
                    .table(ProductionOrders::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_production_orders_sales_order_id")
                    .table(ProductionOrders::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_sales_order_items_product_id")
                    .table(SalesOrderItems::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_sales_order_items_sales_order_id")
                    .table(SalesOrderItems::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_sales_orders_created_at")
                    .table(SalesOrders::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_sales_orders_customer_status")
                    .table(SalesOrders::Table)
                    .to_owned(),
            )
            .await
    }
}
