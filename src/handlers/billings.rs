use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use super::common::{ApiJson, ApiPath};
use crate::{
    entities::billing,
    errors::ServiceError,
    services::billing::{BillingOutcome, GenerateBillingRequest},
    ApiResponse, ApiResult, AppState,
};

type BillingReply = (StatusCode, Json<ApiResponse<billing::Model>>);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/billings", get(list_billings).post(generate_billing))
        .route("/billings/send-invoice", post(send_invoice))
        .route("/billings/by-order/:sales_order_id", get(get_billing_for_order))
        .route("/billings/:id", get(get_billing))
}

fn reply(outcome: BillingOutcome, message: Option<String>) -> BillingReply {
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let body = match message {
        Some(message) => ApiResponse::with_message(outcome.billing, message),
        None if !outcome.created => {
            ApiResponse::with_message(outcome.billing, "Billing already exists for this order")
        }
        None => ApiResponse::success(outcome.billing),
    };
    (status, Json(body))
}

#[utoipa::path(
    get,
    path = "/api/billings",
    responses(
        (status = 200, description = "Billings, newest first", body = ApiResponse<Vec<billing::Model>>)
    ),
    tag = "billings"
)]
pub async fn list_billings(State(state): State<AppState>) -> ApiResult<Vec<billing::Model>> {
    let billings = state.services.billing.list_billings().await?;
    Ok(Json(ApiResponse::success(billings)))
}

#[utoipa::path(
    get,
    path = "/api/billings/{id}",
    params(("id" = i32, Path, description = "Billing ID")),
    responses(
        (status = 200, description = "Billing", body = ApiResponse<billing::Model>),
        (status = 404, description = "Billing not found", body = crate::errors::ErrorResponse)
    ),
    tag = "billings"
)]
pub async fn get_billing(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<billing::Model> {
    let billing = state.services.billing.get_billing(id).await?;
    Ok(Json(ApiResponse::success(billing)))
}

#[utoipa::path(
    get,
    path = "/api/billings/by-order/{sales_order_id}",
    params(("sales_order_id" = i32, Path, description = "Sales order ID")),
    responses(
        (status = 200, description = "Billing of the order", body = ApiResponse<billing::Model>),
        (status = 404, description = "Order has no billing", body = crate::errors::ErrorResponse)
    ),
    tag = "billings"
)]
pub async fn get_billing_for_order(
    State(state): State<AppState>,
    ApiPath(sales_order_id): ApiPath<i32>,
) -> ApiResult<billing::Model> {
    let billing = state
        .services
        .billing
        .get_billing_for_order(sales_order_id)
        .await?;
    Ok(Json(ApiResponse::success(billing)))
}

#[utoipa::path(
    post,
    path = "/api/billings",
    summary = "Bill a delivered order",
    description = "Creates the billing and moves the order to 'billed'. Repeating the call returns the existing billing with 200.",
    request_body = GenerateBillingRequest,
    responses(
        (status = 201, description = "Billing created", body = ApiResponse<billing::Model>),
        (status = 200, description = "Billing already existed", body = ApiResponse<billing::Model>),
        (status = 400, description = "Order is not delivered", body = crate::errors::ErrorResponse),
        (status = 404, description = "Sales order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "billings"
)]
pub async fn generate_billing(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<GenerateBillingRequest>,
) -> Result<BillingReply, ServiceError> {
    let outcome = state
        .services
        .billing
        .generate_billing_for_order(payload.sales_order_id)
        .await?;
    Ok(reply(outcome, None))
}

#[utoipa::path(
    post,
    path = "/api/billings/send-invoice",
    summary = "Bill an order and email the invoice",
    request_body = GenerateBillingRequest,
    responses(
        (status = 201, description = "Billing created and invoice sent", body = ApiResponse<billing::Model>),
        (status = 200, description = "Existing billing re-sent", body = ApiResponse<billing::Model>),
        (status = 400, description = "Order is not delivered", body = crate::errors::ErrorResponse),
        (status = 502, description = "Invoice email could not be delivered", body = crate::errors::ErrorResponse)
    ),
    tag = "billings"
)]
pub async fn send_invoice(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<GenerateBillingRequest>,
) -> Result<BillingReply, ServiceError> {
    let outcome = state
        .services
        .billing
        .generate_billing_and_send_invoice(payload.sales_order_id)
        .await?;
    let message = format!("Invoice {} sent", outcome.billing.invoice_number);
    Ok(reply(outcome, Some(message)))
}
