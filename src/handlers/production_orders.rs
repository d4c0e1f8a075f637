use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::common::{ApiJson, ApiPath, ApiQuery};
use crate::{
    entities::{production_order, ProductionOrderStatus},
    errors::ServiceError,
    services::production::StartProductionRequest,
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductionListParams {
    pub status: Option<ProductionOrderStatus>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/production-orders",
            get(list_production_orders).post(start_production),
        )
        .route("/production-orders/:id", get(get_production_order))
        .route("/production-orders/:id/start", patch(mark_in_progress))
        .route("/production-orders/:id/complete", patch(mark_complete))
        .route("/production-orders/:id/cancel", patch(cancel_production))
}

#[utoipa::path(
    get,
    path = "/api/production-orders",
    params(ProductionListParams),
    responses(
        (status = 200, description = "Production orders", body = ApiResponse<Vec<production_order::Model>>),
        (status = 400, description = "Unknown status value", body = crate::errors::ErrorResponse)
    ),
    tag = "production"
)]
pub async fn list_production_orders(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ProductionListParams>,
) -> ApiResult<Vec<production_order::Model>> {
    let orders = state
        .services
        .production
        .list_production_orders(params.status)
        .await?;
    Ok(Json(ApiResponse::success(orders)))
}

#[utoipa::path(
    get,
    path = "/api/production-orders/{id}",
    params(("id" = i32, Path, description = "Production order ID")),
    responses(
        (status = 200, description = "Production order", body = ApiResponse<production_order::Model>),
        (status = 404, description = "Production order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "production"
)]
pub async fn get_production_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<production_order::Model> {
    let order = state.services.production.get_production_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    post,
    path = "/api/production-orders",
    summary = "Start production for a sales order",
    request_body = StartProductionRequest,
    responses(
        (status = 201, description = "Planned production order created", body = ApiResponse<production_order::Model>),
        (status = 400, description = "Order is not in 'created' or work center unknown", body = crate::errors::ErrorResponse),
        (status = 404, description = "Sales order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "production"
)]
pub async fn start_production(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<StartProductionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<production_order::Model>>), ServiceError> {
    let order = state
        .services
        .production
        .start_production_for_order(payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

#[utoipa::path(
    patch,
    path = "/api/production-orders/{id}/start",
    params(("id" = i32, Path, description = "Production order ID")),
    responses(
        (status = 200, description = "Production in progress", body = ApiResponse<production_order::Model>),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse),
        (status = 409, description = "Changed concurrently", body = crate::errors::ErrorResponse)
    ),
    tag = "production"
)]
pub async fn mark_in_progress(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<production_order::Model> {
    let order = state.services.production.mark_in_progress(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    patch,
    path = "/api/production-orders/{id}/complete",
    params(("id" = i32, Path, description = "Production order ID")),
    responses(
        (status = 200, description = "Production completed; sales order ready for delivery", body = ApiResponse<production_order::Model>),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse),
        (status = 409, description = "Changed concurrently", body = crate::errors::ErrorResponse)
    ),
    tag = "production"
)]
pub async fn mark_complete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<production_order::Model> {
    let order = state.services.production.mark_complete(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    patch,
    path = "/api/production-orders/{id}/cancel",
    params(("id" = i32, Path, description = "Production order ID")),
    responses(
        (status = 200, description = "Production cancelled", body = ApiResponse<production_order::Model>),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse)
    ),
    tag = "production"
)]
pub async fn cancel_production(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<production_order::Model> {
    let order = state.services.production.cancel(id).await?;
    Ok(Json(ApiResponse::success(order)))
}
