use crate::{
    db::DbPool,
    entities::billing::{self, Entity as BillingEntity},
    entities::customer::Entity as CustomerEntity,
    entities::delivery::{self, DeliveryStatus, Entity as DeliveryEntity},
    entities::product::Entity as ProductEntity,
    entities::production_order::{self, Entity as ProductionOrderEntity, ProductionOrderStatus},
    entities::sales_order::{
        self, ActiveModel as SalesOrderActiveModel, Entity as SalesOrderEntity, SalesOrderStatus,
    },
    entities::sales_order_item::{
        self, ActiveModel as SalesOrderItemActiveModel, Entity as SalesOrderItemEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::{fulfillment_repository, sales_order_repository},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OrderItemRequest {
    pub product_id: i32,
    #[schema(example = 2)]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    pub customer_id: i32,
    #[validate(length(min = 1, message = "At least one item is required to create an order"))]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrderStatusRequest {
    pub status: SalesOrderStatus,
}

/// Row of the order list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub id: i32,
    pub customer_id: i32,
    pub customer_name: Option<String>,
    pub status: SalesOrderStatus,
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemDetail {
    pub id: i32,
    pub product_id: i32,
    pub product_name: Option<String>,
    pub quantity: i32,
    #[schema(value_type = f64)]
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductionOrderBrief {
    pub id: i32,
    pub status: ProductionOrderStatus,
    pub work_center_id: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryBrief {
    pub id: i32,
    pub status: DeliveryStatus,
    pub delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillingBrief {
    pub id: i32,
    pub invoice_number: String,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub billed_date: DateTime<Utc>,
}

/// Sales order with everything that hangs off it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderDetails {
    pub id: i32,
    pub customer_id: i32,
    pub customer_name: Option<String>,
    pub status: SalesOrderStatus,
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemDetail>,
    pub production_orders: Vec<ProductionOrderBrief>,
    pub deliveries: Vec<DeliveryBrief>,
    pub billing: Option<BillingBrief>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<SalesOrderStatus>,
    pub customer_id: Option<i32>,
}

#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(event);
        }
    }

    /// Order summaries, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<OrderSummary>, ServiceError> {
        let mut query = SalesOrderEntity::find().find_also_related(CustomerEntity);
        if let Some(status) = filter.status {
            query = query.filter(sales_order::Column::Status.eq(status));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(sales_order::Column::CustomerId.eq(customer_id));
        }

        let rows = query
            .order_by_desc(sales_order::Column::CreatedAt)
            .order_by_desc(sales_order::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to list sales orders", e))?;

        Ok(rows
            .into_iter()
            .map(|(order, customer)| OrderSummary {
                id: order.id,
                customer_id: order.customer_id,
                customer_name: customer.map(|c| c.name),
                status: order.status,
                total_amount: order.total_amount,
                created_at: order.created_at,
            })
            .collect())
    }

    #[instrument(skip(self), fields(order_id = id))]
    pub async fn get_order_details(&self, id: i32) -> Result<OrderDetails, ServiceError> {
        let db = &*self.db_pool;

        let (order, customer) = SalesOrderEntity::find_by_id(id)
            .find_also_related(CustomerEntity)
            .one(db)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch sales order", e))?
            .ok_or_else(|| ServiceError::not_found("Sales order", id))?;

        let items = SalesOrderItemEntity::find()
            .find_also_related(ProductEntity)
            .filter(sales_order_item::Column::SalesOrderId.eq(id))
            .order_by_asc(sales_order_item::Column::Id)
            .all(db)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch order items", e))?;

        let production_orders = ProductionOrderEntity::find()
            .filter(production_order::Column::SalesOrderId.eq(id))
            .order_by_asc(production_order::Column::Id)
            .all(db)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch production orders", e))?;

        let deliveries = DeliveryEntity::find()
            .filter(delivery::Column::SalesOrderId.eq(id))
            .order_by_asc(delivery::Column::Id)
            .all(db)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch deliveries", e))?;

        let billing = BillingEntity::find()
            .filter(billing::Column::SalesOrderId.eq(id))
            .one(db)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch billing", e))?;

        Ok(OrderDetails {
            id: order.id,
            customer_id: order.customer_id,
            customer_name: customer.map(|c| c.name),
            status: order.status,
            total_amount: order.total_amount,
            created_at: order.created_at,
            items: items
                .into_iter()
                .map(|(item, product)| OrderItemDetail {
                    id: item.id,
                    product_id: item.product_id,
                    product_name: product.map(|p| p.name),
                    quantity: item.quantity,
                    subtotal: item.subtotal,
                })
                .collect(),
            production_orders: production_orders
                .into_iter()
                .map(|p| ProductionOrderBrief {
                    id: p.id,
                    status: p.status,
                    work_center_id: p.work_center_id,
                    start_date: p.start_date,
                    end_date: p.end_date,
                })
                .collect(),
            deliveries: deliveries
                .into_iter()
                .map(|d| DeliveryBrief {
                    id: d.id,
                    status: d.status,
                    delivery_date: d.delivery_date,
                })
                .collect(),
            billing: billing.map(|b| BillingBrief {
                id: b.id,
                invoice_number: b.invoice_number,
                amount: b.amount,
                billed_date: b.billed_date,
            }),
        })
    }

    /// Prices every line from the catalog and stores the order with its items
    /// in one transaction. Stock is not reserved here.
    #[instrument(skip(self, request), fields(customer_id = request.customer_id, items = request.items.len()))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderDetails, ServiceError> {
        request.validate()?;
        if let Some(bad) = request.items.iter().find(|item| item.quantity <= 0) {
            return Err(ServiceError::ValidationError(format!(
                "Item quantity must be greater than zero (product {})",
                bad.product_id
            )));
        }

        let txn = self
            .db_pool
            .begin()
            .await
            .map_err(|e| ServiceError::db("Failed to begin order transaction", e))?;

        CustomerEntity::find_by_id(request.customer_id)
            .one(&txn)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch customer", e))?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Customer {} does not exist",
                    request.customer_id
                ))
            })?;

        let mut prices: HashMap<i32, Decimal> = HashMap::new();
        let mut lines = Vec::with_capacity(request.items.len());
        let mut total = Decimal::ZERO;
        for item in &request.items {
            let price = match prices.get(&item.product_id) {
                Some(price) => *price,
                None => {
                    let product = ProductEntity::find_by_id(item.product_id)
                        .one(&txn)
                        .await
                        .map_err(|e| ServiceError::db("Failed to fetch product", e))?
                        .ok_or_else(|| {
                            ServiceError::ValidationError(format!(
                                "Product {} does not exist",
                                item.product_id
                            ))
                        })?;
                    prices.insert(product.id, product.price);
                    product.price
                }
            };
            let subtotal = price * Decimal::from(item.quantity);
            total += subtotal;
            lines.push((item.product_id, item.quantity, subtotal));
        }

        let order = SalesOrderActiveModel {
            customer_id: Set(request.customer_id),
            total_amount: Set(total),
            status: Set(SalesOrderStatus::Created),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::db("Failed to insert sales order", e))?;

        for (product_id, quantity, subtotal) in lines {
            SalesOrderItemActiveModel {
                sales_order_id: Set(order.id),
                product_id: Set(product_id),
                quantity: Set(quantity),
                subtotal: Set(subtotal),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| ServiceError::db("Failed to insert order item", e))?;
        }

        txn.commit()
            .await
            .map_err(|e| ServiceError::db("Failed to commit order creation", e))?;

        info!(order_id = order.id, total_amount = %total, "Sales order created");
        self.emit(Event::OrderCreated {
            order_id: order.id,
            customer_id: order.customer_id,
            total_amount: total,
        });

        self.get_order_details(order.id).await
    }

    /// Applies a manual lifecycle move. Cancelling an order also cancels its
    /// planned or running production orders and pending deliveries.
    #[instrument(skip(self), fields(order_id = id))]
    pub async fn update_order_status(
        &self,
        id: i32,
        status: SalesOrderStatus,
    ) -> Result<sales_order::Model, ServiceError> {
        let txn = self
            .db_pool
            .begin()
            .await
            .map_err(|e| ServiceError::db("Failed to begin status transaction", e))?;

        let order = sales_order_repository::find_or_404(&txn, id).await?;
        let from = order.status;
        sales_order_repository::transition_status(&txn, id, from, status).await?;

        let mut cancelled_production = Vec::new();
        let mut cancelled_deliveries = Vec::new();
        if status == SalesOrderStatus::Cancelled {
            let open_production = ProductionOrderEntity::find()
                .filter(production_order::Column::SalesOrderId.eq(id))
                .filter(production_order::Column::Status.is_in([
                    ProductionOrderStatus::Planned,
                    ProductionOrderStatus::InProgress,
                ]))
                .all(&txn)
                .await
                .map_err(|e| ServiceError::db("Failed to fetch open production orders", e))?;
            for production in open_production {
                fulfillment_repository::transition_production_status(
                    &txn,
                    production.id,
                    production.status,
                    ProductionOrderStatus::Cancelled,
                )
                .await?;
                cancelled_production.push((production.id, production.status));
            }

            let pending_deliveries = DeliveryEntity::find()
                .filter(delivery::Column::SalesOrderId.eq(id))
                .filter(delivery::Column::Status.eq(DeliveryStatus::Pending))
                .all(&txn)
                .await
                .map_err(|e| ServiceError::db("Failed to fetch pending deliveries", e))?;
            for pending in pending_deliveries {
                fulfillment_repository::transition_delivery_status(
                    &txn,
                    pending.id,
                    DeliveryStatus::Pending,
                    DeliveryStatus::Cancelled,
                )
                .await?;
                cancelled_deliveries.push(pending.id);
            }
        }

        let updated = sales_order_repository::find_or_404(&txn, id).await?;
        txn.commit()
            .await
            .map_err(|e| ServiceError::db("Failed to commit status change", e))?;

        info!(
            order_id = id,
            %from,
            to = %status,
            production_cancelled = cancelled_production.len(),
            deliveries_cancelled = cancelled_deliveries.len(),
            "Sales order status updated"
        );
        self.emit(Event::OrderStatusChanged {
            order_id: id,
            from,
            to: status,
        });
        for (production_order_id, previous) in cancelled_production {
            self.emit(Event::ProductionStatusChanged {
                production_order_id,
                sales_order_id: id,
                from: previous,
                to: ProductionOrderStatus::Cancelled,
            });
        }
        for delivery_id in cancelled_deliveries {
            self.emit(Event::DeliveryStatusChanged {
                delivery_id,
                sales_order_id: id,
                from: DeliveryStatus::Pending,
                to: DeliveryStatus::Cancelled,
            });
        }
        Ok(updated)
    }

    /// Removes the order together with its items, production orders,
    /// deliveries and billing.
    #[instrument(skip(self), fields(order_id = id))]
    pub async fn delete_order(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self
            .db_pool
            .begin()
            .await
            .map_err(|e| ServiceError::db("Failed to begin delete transaction", e))?;

        sales_order_repository::find_or_404(&txn, id).await?;

        BillingEntity::delete_many()
            .filter(billing::Column::SalesOrderId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| ServiceError::db("Failed to delete billing", e))?;
        DeliveryEntity::delete_many()
            .filter(delivery::Column::SalesOrderId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| ServiceError::db("Failed to delete deliveries", e))?;
        ProductionOrderEntity::delete_many()
            .filter(production_order::Column::SalesOrderId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| ServiceError::db("Failed to delete production orders", e))?;
        SalesOrderItemEntity::delete_many()
            .filter(sales_order_item::Column::SalesOrderId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| ServiceError::db("Failed to delete order items", e))?;
        SalesOrderEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| ServiceError::db("Failed to delete sales order", e))?;

        txn.commit()
            .await
            .map_err(|e| ServiceError::db("Failed to commit order deletion", e))?;

        info!(order_id = id, "Sales order deleted");
        self.emit(Event::OrderDeleted(id));
        Ok(())
    }
}
