use crate::{
    db::DbPool,
    entities::delivery::{self, ActiveModel as DeliveryActiveModel, DeliveryStatus, Entity as DeliveryEntity},
    entities::sales_order::SalesOrderStatus,
    errors::ServiceError,
    events::{Event, EventSender},
    lifecycle::Lifecycle,
    repositories::{fulfillment_repository, sales_order_repository},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateDeliveryRequest {
    pub sales_order_id: i32,
    /// Planned delivery time; replaced by the completion time once delivered
    pub delivery_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct DeliveryService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl DeliveryService {
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

    #[instrument(skip(self))]
    pub async fn list_deliveries(
        &self,
        status: Option<DeliveryStatus>,
    ) -> Result<Vec<delivery::Model>, ServiceError> {
        let mut query = DeliveryEntity::find();
        if let Some(status) = status {
            query = query.filter(delivery::Column::Status.eq(status));
        }
        query
            .order_by_asc(delivery::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to list deliveries", e))
    }

    #[instrument(skip(self), fields(delivery_id = id))]
    pub async fn get_delivery(&self, id: i32) -> Result<delivery::Model, ServiceError> {
        fulfillment_repository::find_delivery(&*self.db_pool, id).await
    }

    /// Schedules a pending delivery for an order whose production is done.
    #[instrument(skip(self, request), fields(sales_order_id = request.sales_order_id))]
    pub async fn create_delivery_for_order(
        &self,
        request: CreateDeliveryRequest,
    ) -> Result<delivery::Model, ServiceError> {
        let db = &*self.db_pool;
        let order = sales_order_repository::find_or_404(db, request.sales_order_id).await?;
        // Only an order that may move on to `delivered` can be shipped.
        order.status.ensure_transition(SalesOrderStatus::Delivered)?;

        let created = DeliveryActiveModel {
            sales_order_id: Set(order.id),
            delivery_date: Set(request.delivery_date),
            status: Set(DeliveryStatus::Pending),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::db("Failed to insert delivery", e))?;

        info!(delivery_id = created.id, sales_order_id = order.id, "Delivery scheduled");
        self.emit(Event::DeliveryScheduled {
            delivery_id: created.id,
            sales_order_id: order.id,
        });
        Ok(created)
    }

    /// pending -> delivered; the sales order becomes delivered.
    #[instrument(skip(self), fields(delivery_id = id))]
    pub async fn mark_delivered(&self, id: i32) -> Result<delivery::Model, ServiceError> {
        let txn = self
            .db_pool
            .begin()
            .await
            .map_err(|e| ServiceError::db("Failed to begin delivery transaction", e))?;

        let delivery = fulfillment_repository::find_delivery(&txn, id).await?;
        fulfillment_repository::transition_delivery_status(
            &txn,
            id,
            delivery.status,
            DeliveryStatus::Delivered,
        )
        .await?;

        let order = sales_order_repository::find_or_404(&txn, delivery.sales_order_id).await?;
        sales_order_repository::transition_status(
            &txn,
            order.id,
            order.status,
            SalesOrderStatus::Delivered,
        )
        .await?;

        let updated = fulfillment_repository::find_delivery(&txn, id).await?;
        txn.commit()
            .await
            .map_err(|e| ServiceError::db("Failed to commit delivery completion", e))?;

        info!(delivery_id = id, sales_order_id = order.id, "Delivery completed");
        self.emit(Event::DeliveryStatusChanged {
            delivery_id: id,
            sales_order_id: order.id,
            from: delivery.status,
            to: DeliveryStatus::Delivered,
        });
        self.emit(Event::OrderStatusChanged {
            order_id: order.id,
            from: order.status,
            to: SalesOrderStatus::Delivered,
        });
        Ok(updated)
    }

    /// pending -> cancelled. The sales order stays ready for another delivery.
    #[instrument(skip(self), fields(delivery_id = id))]
    pub async fn cancel(&self, id: i32) -> Result<delivery::Model, ServiceError> {
        let db = &*self.db_pool;
        let delivery = fulfillment_repository::find_delivery(db, id).await?;
        fulfillment_repository::transition_delivery_status(
            db,
            id,
            delivery.status,
            DeliveryStatus::Cancelled,
        )
        .await?;
        let updated = fulfillment_repository::find_delivery(db, id).await?;

        info!(delivery_id = id, "Delivery cancelled");
        self.emit(Event::DeliveryStatusChanged {
            delivery_id: id,
            sales_order_id: updated.sales_order_id,
            from: delivery.status,
            to: DeliveryStatus::Cancelled,
        });
        Ok(updated)
    }
}
