use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use super::ensure_row_updated;
use crate::entities::delivery::{self, DeliveryStatus, Entity as DeliveryEntity};
use crate::entities::production_order::{
    self, Entity as ProductionOrderEntity, ProductionOrderStatus,
};
use crate::errors::ServiceError;
use crate::lifecycle::Lifecycle;

pub async fn find_production_order<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<production_order::Model, ServiceError> {
    ProductionOrderEntity::find_by_id(id)
        .one(conn)
        .await
        .map_err(|e| ServiceError::db("Failed to fetch production order", e))?
        .ok_or_else(|| ServiceError::not_found("Production order", id))
}

pub async fn find_delivery<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<delivery::Model, ServiceError> {
    DeliveryEntity::find_by_id(id)
        .one(conn)
        .await
        .map_err(|e| ServiceError::db("Failed to fetch delivery", e))?
        .ok_or_else(|| ServiceError::not_found("Delivery", id))
}

/// Compare-and-set on a production order's status. Entering `in_progress`
/// stamps `start_date`; entering `completed` stamps `end_date`.
pub async fn transition_production_status<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    expected: ProductionOrderStatus,
    next: ProductionOrderStatus,
) -> Result<(), ServiceError> {
    expected.ensure_transition(next)?;

    let now = Utc::now();
    let mut update = ProductionOrderEntity::update_many()
        .col_expr(production_order::Column::Status, Expr::value(next));
    update = match next {
        ProductionOrderStatus::InProgress => {
            update.col_expr(production_order::Column::StartDate, Expr::value(now))
        }
        ProductionOrderStatus::Completed => {
            update.col_expr(production_order::Column::EndDate, Expr::value(now))
        }
        _ => update,
    };

    let result = update
        .filter(production_order::Column::Id.eq(id))
        .filter(production_order::Column::Status.eq(expected))
        .exec(conn)
        .await
        .map_err(|e| ServiceError::db("Failed to update production order status", e))?;

    ensure_row_updated(result.rows_affected, "Production order", id, &expected)
}

/// Compare-and-set on a delivery's status. Entering `delivered` records the
/// completion time as `delivery_date`.
pub async fn transition_delivery_status<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    expected: DeliveryStatus,
    next: DeliveryStatus,
) -> Result<(), ServiceError> {
    expected.ensure_transition(next)?;

    let mut update =
        DeliveryEntity::update_many().col_expr(delivery::Column::Status, Expr::value(next));
    if next == DeliveryStatus::Delivered {
        update = update.col_expr(delivery::Column::DeliveryDate, Expr::value(Utc::now()));
    }

    let result = update
        .filter(delivery::Column::Id.eq(id))
        .filter(delivery::Column::Status.eq(expected))
        .exec(conn)
        .await
        .map_err(|e| ServiceError::db("Failed to update delivery status", e))?;

    ensure_row_updated(result.rows_affected, "Delivery", id, &expected)
}
