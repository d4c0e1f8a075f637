use crate::{
    db::DbPool,
    entities::customer::Entity as CustomerEntity,
    entities::product,
    entities::production_order::{self, Entity as ProductionOrderEntity, ProductionOrderStatus},
    entities::sales_order::{self, Entity as SalesOrderEntity, SalesOrderStatus},
    entities::sales_order_item::{self, Entity as SalesOrderItemEntity},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, Iterable, JoinType, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use tracing::instrument;
use utoipa::ToSchema;

const TOP_PRODUCTS_LIMIT: u64 = 5;
const RECENT_ORDERS_LIMIT: u64 = 5;
const RECENT_PRODUCTION_LIMIT: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromQueryResult)]
pub struct TopProduct {
    pub product_id: i32,
    pub name: String,
    /// Total quantity ordered across all sales orders.
    pub orders: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecentOrder {
    pub id: i32,
    pub customer_name: Option<String>,
    pub status: SalesOrderStatus,
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummary {
    pub total_orders: u64,
    /// Production orders currently in progress.
    pub in_production: u64,
    pub ready_for_delivery: u64,
    pub billed: u64,
    pub top_products: Vec<TopProduct>,
    pub recent_orders: Vec<RecentOrder>,
}

/// Production orders per status plus the newest ones.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductionStatusSummary {
    pub total_production_orders: u64,
    /// Every production status, zero when no order is in it.
    pub by_status: BTreeMap<String, u64>,
    pub recent_production_orders: Vec<production_order::Model>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerOrderSummary {
    pub customer_id: i32,
    pub customer_name: String,
    pub total_orders: u64,
    pub orders_by_status: BTreeMap<String, u64>,
    /// Sum of order totals, cancelled orders included.
    #[schema(value_type = f64)]
    pub total_revenue: Decimal,
}

#[derive(Debug, FromQueryResult)]
struct StatusCount {
    status: String,
    count: i64,
}

fn zeroed_counts<S: Iterable + ToString>() -> BTreeMap<String, u64> {
    S::iter().map(|status| (status.to_string(), 0)).collect()
}

#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn count_orders_in(&self, status: SalesOrderStatus) -> Result<u64, ServiceError> {
        SalesOrderEntity::find()
            .filter(sales_order::Column::Status.eq(status))
            .count(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to count sales orders", e))
    }

    async fn top_products(&self) -> Result<Vec<TopProduct>, ServiceError> {
        SalesOrderItemEntity::find()
            .select_only()
            .column(sales_order_item::Column::ProductId)
            .column_as(product::Column::Name, "name")
            .column_as(sales_order_item::Column::Quantity.sum(), "orders")
            .join(JoinType::InnerJoin, sales_order_item::Relation::Product.def())
            .group_by(sales_order_item::Column::ProductId)
            .group_by(product::Column::Name)
            .order_by(sales_order_item::Column::Quantity.sum(), Order::Desc)
            .order_by_asc(sales_order_item::Column::ProductId)
            .limit(TOP_PRODUCTS_LIMIT)
            .into_model::<TopProduct>()
            .all(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to aggregate top products", e))
    }

    async fn recent_orders(&self) -> Result<Vec<RecentOrder>, ServiceError> {
        let rows = SalesOrderEntity::find()
            .find_also_related(CustomerEntity)
            .order_by_desc(sales_order::Column::CreatedAt)
            .order_by_desc(sales_order::Column::Id)
            .limit(RECENT_ORDERS_LIMIT)
            .all(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch recent orders", e))?;

        Ok(rows
            .into_iter()
            .map(|(order, customer)| RecentOrder {
                id: order.id,
                customer_name: customer.map(|c| c.name),
                status: order.status,
                total_amount: order.total_amount,
                created_at: order.created_at,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<DashboardSummary, ServiceError> {
        let total_orders = SalesOrderEntity::find()
            .count(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to count sales orders", e))?;
        let in_production = ProductionOrderEntity::find()
            .filter(production_order::Column::Status.eq(ProductionOrderStatus::InProgress))
            .count(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to count production orders", e))?;

        Ok(DashboardSummary {
            total_orders,
            in_production,
            ready_for_delivery: self
                .count_orders_in(SalesOrderStatus::ReadyForDelivery)
                .await?,
            billed: self.count_orders_in(SalesOrderStatus::Billed).await?,
            top_products: self.top_products().await?,
            recent_orders: self.recent_orders().await?,
        })
    }

    #[instrument(skip(self))]
    pub async fn production_status_summary(&self) -> Result<ProductionStatusSummary, ServiceError> {
        let counts = ProductionOrderEntity::find()
            .select_only()
            .column(production_order::Column::Status)
            .column_as(production_order::Column::Id.count(), "count")
            .group_by(production_order::Column::Status)
            .into_model::<StatusCount>()
            .all(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to count production orders by status", e))?;

        let mut by_status = zeroed_counts::<ProductionOrderStatus>();
        let mut total_production_orders = 0;
        for row in counts {
            let count = u64::try_from(row.count).unwrap_or_default();
            total_production_orders += count;
            by_status.insert(row.status, count);
        }

        let recent_production_orders = ProductionOrderEntity::find()
            .order_by_desc(production_order::Column::CreatedAt)
            .order_by_desc(production_order::Column::Id)
            .limit(RECENT_PRODUCTION_LIMIT)
            .all(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch recent production orders", e))?;

        Ok(ProductionStatusSummary {
            total_production_orders,
            by_status,
            recent_production_orders,
        })
    }

    #[instrument(skip(self))]
    pub async fn customer_order_summary(
        &self,
        customer_id: i32,
    ) -> Result<CustomerOrderSummary, ServiceError> {
        let customer = CustomerEntity::find_by_id(customer_id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch customer", e))?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))?;

        let orders = SalesOrderEntity::find()
            .filter(sales_order::Column::CustomerId.eq(customer_id))
            .all(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch customer orders", e))?;

        let mut orders_by_status = zeroed_counts::<SalesOrderStatus>();
        let mut total_revenue = Decimal::ZERO;
        for order in &orders {
            *orders_by_status.entry(order.status.to_string()).or_default() += 1;
            total_revenue += order.total_amount;
        }

        Ok(CustomerOrderSummary {
            customer_id: customer.id,
            customer_name: customer.name,
            total_orders: orders.len() as u64,
            orders_by_status,
            total_revenue,
        })
    }
}
