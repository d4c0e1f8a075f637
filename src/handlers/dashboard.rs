use axum::{extract::State, routing::get, Json, Router};

use crate::{
    handlers::common::ApiPath,
    services::dashboard::{CustomerOrderSummary, DashboardSummary, ProductionStatusSummary},
    ApiResponse, ApiResult, AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/summary", get(summary))
        .route("/dashboard/production-status", get(production_status))
        .route(
            "/dashboard/customers/:customer_id/orders-summary",
            get(customer_orders_summary),
        )
}

#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    summary = "Admin dashboard KPIs",
    responses(
        (status = 200, description = "Order counts, top products and recent orders", body = ApiResponse<DashboardSummary>)
    ),
    tag = "dashboard"
)]
pub async fn summary(State(state): State<AppState>) -> ApiResult<DashboardSummary> {
    let summary = state.services.dashboard.summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/production-status",
    summary = "Production orders by status",
    responses(
        (status = 200, description = "Status counts and the newest production orders", body = ApiResponse<ProductionStatusSummary>)
    ),
    tag = "dashboard"
)]
pub async fn production_status(
    State(state): State<AppState>,
) -> ApiResult<ProductionStatusSummary> {
    let summary = state.services.dashboard.production_status_summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/customers/{customer_id}/orders-summary",
    summary = "Order history totals for one customer",
    params(("customer_id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Order counts by status and revenue", body = ApiResponse<CustomerOrderSummary>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "dashboard"
)]
pub async fn customer_orders_summary(
    State(state): State<AppState>,
    ApiPath(customer_id): ApiPath<i32>,
) -> ApiResult<CustomerOrderSummary> {
    let summary = state
        .services
        .dashboard
        .customer_order_summary(customer_id)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}
