use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::common::{
    default_page, default_size, ApiJson, ApiPath, ApiQuery, SearchParams,
};
use crate::{
    entities::customer,
    errors::ServiceError,
    services::customers::{CreateCustomerRequest, CustomerPage},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerListParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_size")]
    pub size: u64,
    /// Matches name or email, case-insensitive
    pub search: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers))
        .route(
            "/v1/customers",
            get(list_customers_paginated).post(create_customer),
        )
        .route("/v1/customers/:id", get(get_customer))
}

#[utoipa::path(
    get,
    path = "/api/customers",
    params(SearchParams),
    responses(
        (status = 200, description = "Customers ordered by name", body = ApiResponse<Vec<customer::Model>>)
    ),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> ApiResult<Vec<customer::Model>> {
    let customers = state.services.customers.list_customers(params.search).await?;
    Ok(Json(ApiResponse::success(customers)))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers",
    params(CustomerListParams),
    responses(
        (status = 200, description = "One page of customers", body = ApiResponse<CustomerPage>),
        (status = 400, description = "Invalid page or size", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn list_customers_paginated(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CustomerListParams>,
) -> ApiResult<CustomerPage> {
    let page = state
        .services
        .customers
        .list_customers_paginated(params.page, params.size, params.search)
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer", body = ApiResponse<customer::Model>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<customer::Model> {
    let customer = state.services.customers.get_customer(id).await?;
    Ok(Json(ApiResponse::success(customer)))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = ApiResponse<customer::Model>),
        (status = 400, description = "Invalid customer data", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<customer::Model>>), ServiceError> {
    let customer = state.services.customers.create_customer(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(customer))))
}
