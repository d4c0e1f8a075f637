use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};

use super::common::{ApiJson, ApiPath, ApiQuery, PaginationParams};
use crate::{
    entities::work_center,
    errors::ServiceError,
    services::work_centers::{CreateWorkCenterRequest, UpdateWorkCenterRequest, WorkCenterPage},
    ApiResponse, ApiResult, AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/work-centers",
            get(list_work_centers).post(create_work_center),
        )
        .route(
            "/v1/work-centers/:id",
            get(get_work_center)
                .put(update_work_center)
                .delete(delete_work_center),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/work-centers",
    params(PaginationParams),
    responses(
        (status = 200, description = "One page of work centers", body = ApiResponse<WorkCenterPage>),
        (status = 400, description = "Invalid page or size", body = crate::errors::ErrorResponse)
    ),
    tag = "work-centers"
)]
pub async fn list_work_centers(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> ApiResult<WorkCenterPage> {
    let page = state
        .services
        .work_centers
        .list_work_centers(params.page, params.size)
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/work-centers/{id}",
    params(("id" = i32, Path, description = "Work center ID")),
    responses(
        (status = 200, description = "Work center", body = ApiResponse<work_center::Model>),
        (status = 404, description = "Work center not found", body = crate::errors::ErrorResponse)
    ),
    tag = "work-centers"
)]
pub async fn get_work_center(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<work_center::Model> {
    let work_center = state.services.work_centers.get_work_center(id).await?;
    Ok(Json(ApiResponse::success(work_center)))
}

#[utoipa::path(
    post,
    path = "/api/v1/work-centers",
    request_body = CreateWorkCenterRequest,
    responses(
        (status = 201, description = "Work center created", body = ApiResponse<work_center::Model>),
        (status = 400, description = "Invalid work center", body = crate::errors::ErrorResponse)
    ),
    tag = "work-centers"
)]
pub async fn create_work_center(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateWorkCenterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<work_center::Model>>), ServiceError> {
    let work_center = state.services.work_centers.create_work_center(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(work_center))))
}

#[utoipa::path(
    put,
    path = "/api/v1/work-centers/{id}",
    params(("id" = i32, Path, description = "Work center ID")),
    request_body = UpdateWorkCenterRequest,
    responses(
        (status = 200, description = "Work center updated", body = ApiResponse<work_center::Model>),
        (status = 404, description = "Work center not found", body = crate::errors::ErrorResponse)
    ),
    tag = "work-centers"
)]
pub async fn update_work_center(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateWorkCenterRequest>,
) -> ApiResult<work_center::Model> {
    let work_center = state
        .services
        .work_centers
        .update_work_center(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(work_center)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/work-centers/{id}",
    params(("id" = i32, Path, description = "Work center ID")),
    responses(
        (status = 200, description = "Work center deleted"),
        (status = 404, description = "Work center not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Work center has production orders", body = crate::errors::ErrorResponse)
    ),
    tag = "work-centers"
)]
pub async fn delete_work_center(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<()> {
    state.services.work_centers.delete_work_center(id).await?;
    Ok(Json(ApiResponse::message(format!("Work center {} deleted", id))))
}
