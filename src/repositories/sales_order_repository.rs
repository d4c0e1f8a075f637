use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use super::ensure_row_updated;
use crate::entities::sales_order::{self, Entity as SalesOrderEntity, SalesOrderStatus};
use crate::errors::ServiceError;
use crate::lifecycle::Lifecycle;

/// Loads a sales order or fails with `NotFound`.
pub async fn find_or_404<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<sales_order::Model, ServiceError> {
    SalesOrderEntity::find_by_id(id)
        .one(conn)
        .await
        .map_err(|e| ServiceError::db("Failed to fetch sales order", e))?
        .ok_or_else(|| ServiceError::not_found("Sales order", id))
}

/// Moves a sales order from `expected` to `next` if the lifecycle allows it
/// and nobody else changed the status in between.
pub async fn transition_status<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    expected: SalesOrderStatus,
    next: SalesOrderStatus,
) -> Result<(), ServiceError> {
    expected.ensure_transition(next)?;

    let result = SalesOrderEntity::update_many()
        .col_expr(sales_order::Column::Status, Expr::value(next))
        .col_expr(sales_order::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(sales_order::Column::Id.eq(id))
        .filter(sales_order::Column::Status.eq(expected))
        .exec(conn)
        .await
        .map_err(|e| ServiceError::db("Failed to update sales order status", e))?;

    ensure_row_updated(result.rows_affected, "Sales order", id, &expected)
}
