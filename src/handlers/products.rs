use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};

use super::common::{ApiJson, ApiPath, ApiQuery, SearchParams};
use crate::{
    entities::product,
    errors::ServiceError,
    services::products::{CreateProductRequest, RestockRequest, UpdateProductRequest},
    ApiResponse, ApiResult, AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/:id/restock", patch(restock_product))
}

#[utoipa::path(
    get,
    path = "/api/products",
    summary = "List products",
    params(SearchParams),
    responses(
        (status = 200, description = "Products ordered by id", body = ApiResponse<Vec<product::Model>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> ApiResult<Vec<product::Model>> {
    let products = state.services.products.list_products(params.search).await?;
    Ok(Json(ApiResponse::success(products)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product", body = ApiResponse<product::Model>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<product::Model> {
    let product = state.services.products.get_product(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<product::Model>),
        (status = 400, description = "Invalid product data", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<product::Model>>), ServiceError> {
    let product = state.services.products.create_product(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<product::Model>),
        (status = 400, description = "Invalid product data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateProductRequest>,
) -> ApiResult<product::Model> {
    let product = state.services.products.update_product(id, payload).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    patch,
    path = "/api/products/{id}/restock",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = RestockRequest,
    responses(
        (status = 200, description = "Stock increased", body = ApiResponse<product::Model>),
        (status = 400, description = "Quantity must be positive", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn restock_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<RestockRequest>,
) -> ApiResult<product::Model> {
    let product = state.services.products.restock_product(id, payload).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product is referenced by orders", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<()> {
    state.services.products.delete_product(id).await?;
    Ok(Json(ApiResponse::message(format!("Product {} deleted", id))))
}
