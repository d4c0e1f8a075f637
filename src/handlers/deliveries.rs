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
    entities::{delivery, DeliveryStatus},
    errors::ServiceError,
    services::deliveries::CreateDeliveryRequest,
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeliveryListParams {
    pub status: Option<DeliveryStatus>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/deliveries", get(list_deliveries).post(create_delivery))
        .route("/deliveries/:id", get(get_delivery))
        .route("/deliveries/:id/complete", patch(mark_delivered))
        .route("/deliveries/:id/cancel", patch(cancel_delivery))
}

#[utoipa::path(
    get,
    path = "/api/deliveries",
    params(DeliveryListParams),
    responses(
        (status = 200, description = "Deliveries", body = ApiResponse<Vec<delivery::Model>>),
        (status = 400, description = "Unknown status value", body = crate::errors::ErrorResponse)
    ),
    tag = "deliveries"
)]
pub async fn list_deliveries(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DeliveryListParams>,
) -> ApiResult<Vec<delivery::Model>> {
    let deliveries = state.services.deliveries.list_deliveries(params.status).await?;
    Ok(Json(ApiResponse::success(deliveries)))
}

#[utoipa::path(
    get,
    path = "/api/deliveries/{id}",
    params(("id" = i32, Path, description = "Delivery ID")),
    responses(
        (status = 200, description = "Delivery", body = ApiResponse<delivery::Model>),
        (status = 404, description = "Delivery not found", body = crate::errors::ErrorResponse)
    ),
    tag = "deliveries"
)]
pub async fn get_delivery(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<delivery::Model> {
    let delivery = state.services.deliveries.get_delivery(id).await?;
    Ok(Json(ApiResponse::success(delivery)))
}

#[utoipa::path(
    post,
    path = "/api/deliveries",
    request_body = CreateDeliveryRequest,
    responses(
        (status = 201, description = "Pending delivery scheduled", body = ApiResponse<delivery::Model>),
        (status = 400, description = "Order is not ready for delivery", body = crate::errors::ErrorResponse),
        (status = 404, description = "Sales order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "deliveries"
)]
pub async fn create_delivery(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateDeliveryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<delivery::Model>>), ServiceError> {
    let delivery = state
        .services
        .deliveries
        .create_delivery_for_order(payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(delivery))))
}

#[utoipa::path(
    patch,
    path = "/api/deliveries/{id}/complete",
    params(("id" = i32, Path, description = "Delivery ID")),
    responses(
        (status = 200, description = "Delivered; sales order moves to delivered", body = ApiResponse<delivery::Model>),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse),
        (status = 409, description = "Changed concurrently", body = crate::errors::ErrorResponse)
    ),
    tag = "deliveries"
)]
pub async fn mark_delivered(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<delivery::Model> {
    let delivery = state.services.deliveries.mark_delivered(id).await?;
    Ok(Json(ApiResponse::success(delivery)))
}

#[utoipa::path(
    patch,
    path = "/api/deliveries/{id}/cancel",
    params(("id" = i32, Path, description = "Delivery ID")),
    responses(
        (status = 200, description = "Delivery cancelled", body = ApiResponse<delivery::Model>),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse)
    ),
    tag = "deliveries"
)]
pub async fn cancel_delivery(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<delivery::Model> {
    let delivery = state.services.deliveries.cancel(id).await?;
    Ok(Json(ApiResponse::success(delivery)))
}
