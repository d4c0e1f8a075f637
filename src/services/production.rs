use crate::{
    db::DbPool,
    entities::production_order::{
        self, ActiveModel as ProductionOrderActiveModel, Entity as ProductionOrderEntity,
        ProductionOrderStatus,
    },
    entities::sales_order::SalesOrderStatus,
    entities::work_center::Entity as WorkCenterEntity,
    errors::ServiceError,
    events::{Event, EventSender},
    lifecycle::Lifecycle,
    repositories::{fulfillment_repository, sales_order_repository},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct StartProductionRequest {
    pub sales_order_id: i32,
    pub work_center_id: Option<i32>,
}

/// Manufacturing workflow for sales orders.
#[derive(Clone)]
pub struct ProductionService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ProductionService {
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
    pub async fn list_production_orders(
        &self,
        status: Option<ProductionOrderStatus>,
    ) -> Result<Vec<production_order::Model>, ServiceError> {
        let mut query = ProductionOrderEntity::find();
        if let Some(status) = status {
            query = query.filter(production_order::Column::Status.eq(status));
        }
        query
            .order_by_asc(production_order::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to list production orders", e))
    }

    #[instrument(skip(self), fields(production_order_id = id))]
    pub async fn get_production_order(
        &self,
        id: i32,
    ) -> Result<production_order::Model, ServiceError> {
        fulfillment_repository::find_production_order(&*self.db_pool, id).await
    }

    /// Opens a planned production order for a freshly created sales order and
    /// moves the sales order into production.
    #[instrument(skip(self, request), fields(sales_order_id = request.sales_order_id))]
    pub async fn start_production_for_order(
        &self,
        request: StartProductionRequest,
    ) -> Result<production_order::Model, ServiceError> {
        let sales_order_id = request.sales_order_id;
        let txn = self
            .db_pool
            .begin()
            .await
            .map_err(|e| ServiceError::db("Failed to begin production transaction", e))?;

        let order = sales_order_repository::find_or_404(&txn, sales_order_id).await?;
        if order.status != SalesOrderStatus::Created {
            return Err(ServiceError::InvalidTransition {
                entity: SalesOrderStatus::ENTITY,
                from: order.status.to_string(),
                to: SalesOrderStatus::InProduction.to_string(),
            });
        }

        if let Some(work_center_id) = request.work_center_id {
            WorkCenterEntity::find_by_id(work_center_id)
                .one(&txn)
                .await
                .map_err(|e| ServiceError::db("Failed to fetch work center", e))?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Work center {} does not exist",
                        work_center_id
                    ))
                })?;
        }

        let production = ProductionOrderActiveModel {
            sales_order_id: Set(sales_order_id),
            work_center_id: Set(request.work_center_id),
            status: Set(ProductionOrderStatus::Planned),
            start_date: Set(None),
            end_date: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::db("Failed to insert production order", e))?;

        sales_order_repository::transition_status(
            &txn,
            sales_order_id,
            SalesOrderStatus::Created,
            SalesOrderStatus::InProduction,
        )
        .await?;

        txn.commit()
            .await
            .map_err(|e| ServiceError::db("Failed to commit production start", e))?;

        info!(
            production_order_id = production.id,
            sales_order_id, "Production started"
        );
        self.emit(Event::ProductionStarted {
            production_order_id: production.id,
            sales_order_id,
            work_center_id: production.work_center_id,
        });
        self.emit(Event::OrderStatusChanged {
            order_id: sales_order_id,
            from: SalesOrderStatus::Created,
            to: SalesOrderStatus::InProduction,
        });
        Ok(production)
    }

    /// planned -> in_progress, stamping `start_date`.
    #[instrument(skip(self), fields(production_order_id = id))]
    pub async fn mark_in_progress(
        &self,
        id: i32,
    ) -> Result<production_order::Model, ServiceError> {
        let db = &*self.db_pool;
        let production = fulfillment_repository::find_production_order(db, id).await?;

        fulfillment_repository::transition_production_status(
            db,
            id,
            production.status,
            ProductionOrderStatus::InProgress,
        )
        .await?;
        let updated = fulfillment_repository::find_production_order(db, id).await?;

        info!(production_order_id = id, "Production order in progress");
        self.emit(Event::ProductionStatusChanged {
            production_order_id: id,
            sales_order_id: updated.sales_order_id,
            from: production.status,
            to: ProductionOrderStatus::InProgress,
        });
        Ok(updated)
    }

    /// in_progress -> completed; the sales order becomes ready for delivery.
    #[instrument(skip(self), fields(production_order_id = id))]
    pub async fn mark_complete(&self, id: i32) -> Result<production_order::Model, ServiceError> {
        let txn = self
            .db_pool
            .begin()
            .await
            .map_err(|e| ServiceError::db("Failed to begin completion transaction", e))?;

        let production = fulfillment_repository::find_production_order(&txn, id).await?;
        fulfillment_repository::transition_production_status(
            &txn,
            id,
            production.status,
            ProductionOrderStatus::Completed,
        )
        .await?;

        let order = sales_order_repository::find_or_404(&txn, production.sales_order_id).await?;
        sales_order_repository::transition_status(
            &txn,
            order.id,
            order.status,
            SalesOrderStatus::ReadyForDelivery,
        )
        .await?;

        let updated = fulfillment_repository::find_production_order(&txn, id).await?;
        txn.commit()
            .await
            .map_err(|e| ServiceError::db("Failed to commit production completion", e))?;

        info!(
            production_order_id = id,
            sales_order_id = order.id,
            "Production completed; sales order ready for delivery"
        );
        self.emit(Event::ProductionStatusChanged {
            production_order_id: id,
            sales_order_id: order.id,
            from: production.status,
            to: ProductionOrderStatus::Completed,
        });
        self.emit(Event::OrderStatusChanged {
            order_id: order.id,
            from: order.status,
            to: SalesOrderStatus::ReadyForDelivery,
        });
        Ok(updated)
    }

    /// Cancels a planned or running production order. A sales order still in
    /// production is cancelled with it.
    #[instrument(skip(self), fields(production_order_id = id))]
    pub async fn cancel(&self, id: i32) -> Result<production_order::Model, ServiceError> {
        let txn = self
            .db_pool
            .begin()
            .await
            .map_err(|e| ServiceError::db("Failed to begin cancellation transaction", e))?;

        let production = fulfillment_repository::find_production_order(&txn, id).await?;
        fulfillment_repository::transition_production_status(
            &txn,
            id,
            production.status,
            ProductionOrderStatus::Cancelled,
        )
        .await?;

        let order = sales_order_repository::find_or_404(&txn, production.sales_order_id).await?;
        let order_cancelled = order.status == SalesOrderStatus::InProduction;
        if order_cancelled {
            sales_order_repository::transition_status(
                &txn,
                order.id,
                SalesOrderStatus::InProduction,
                SalesOrderStatus::Cancelled,
            )
            .await?;
        }

        let updated = fulfillment_repository::find_production_order(&txn, id).await?;
        txn.commit()
            .await
            .map_err(|e| ServiceError::db("Failed to commit production cancellation", e))?;

        info!(
            production_order_id = id,
            sales_order_id = order.id,
            order_cancelled,
            "Production order cancelled"
        );
        self.emit(Event::ProductionStatusChanged {
            production_order_id: id,
            sales_order_id: order.id,
            from: production.status,
            to: ProductionOrderStatus::Cancelled,
        });
        if order_cancelled {
            self.emit(Event::OrderStatusChanged {
                order_id: order.id,
                from: SalesOrderStatus::InProduction,
                to: SalesOrderStatus::Cancelled,
            });
        }
        Ok(updated)
    }
}
