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
    entities::{sales_order, SalesOrderStatus},
    errors::ServiceError,
    services::orders::{
        CreateOrderRequest, OrderDetails, OrderFilter, OrderSummary, UpdateOrderStatusRequest,
    },
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListParams {
    pub status: Option<SalesOrderStatus>,
    pub customer_id: Option<i32>,
}

impl From<OrderListParams> for OrderFilter {
    fn from(params: OrderListParams) -> Self {
        OrderFilter {
            status: params.status,
            customer_id: params.customer_id,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(get_order).delete(delete_order))
        .route("/orders/:id/status", patch(update_order_status))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    summary = "List orders",
    description = "Order summaries, newest first, optionally filtered by status and customer",
    params(OrderListParams),
    responses(
        (status = 200, description = "Orders", body = ApiResponse<Vec<OrderSummary>>),
        (status = 400, description = "Unknown status value", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<OrderListParams>,
) -> ApiResult<Vec<OrderSummary>> {
    let orders = state.services.orders.list_orders(params.into()).await?;
    Ok(Json(ApiResponse::success(orders)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = i32, Path, description = "Sales order ID")),
    responses(
        (status = 200, description = "Order with items, production, deliveries and billing", body = ApiResponse<OrderDetails>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<OrderDetails> {
    let order = state.services.orders.get_order_details(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    summary = "Create order",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderDetails>),
        (status = 400, description = "Invalid order", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderDetails>>), ServiceError> {
    let order = state.services.orders.create_order(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    params(("id" = i32, Path, description = "Sales order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<sales_order::Model>),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order changed concurrently", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateOrderStatusRequest>,
) -> ApiResult<sales_order::Model> {
    let order = state
        .services
        .orders
        .update_order_status(id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = i32, Path, description = "Sales order ID")),
    responses(
        (status = 200, description = "Order and its downstream records deleted"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<()> {
    state.services.orders.delete_order(id).await?;
    Ok(Json(ApiResponse::message(format!("Sales order {} deleted", id))))
}
