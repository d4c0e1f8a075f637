use crate::{
    db::DbPool,
    entities::production_order::{self, Entity as ProductionOrderEntity},
    entities::work_center::{self, ActiveModel as WorkCenterActiveModel, Entity as WorkCenterEntity},
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use super::{check_page, page_count};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateWorkCenterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateWorkCenterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WorkCenterPage {
    pub work_centers: Vec<work_center::Model>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
    pub pages: u64,
}

#[derive(Clone)]
pub struct WorkCenterService {
    db_pool: Arc<DbPool>,
}

impl WorkCenterService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_work_centers(
        &self,
        page: u64,
        size: u64,
    ) -> Result<WorkCenterPage, ServiceError> {
        check_page(page, size)?;

        let paginator = WorkCenterEntity::find()
            .order_by_asc(work_center::Column::Id)
            .paginate(&*self.db_pool, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| ServiceError::db("Failed to count work centers", e))?;
        let work_centers = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch work centers page", e))?;

        Ok(WorkCenterPage {
            work_centers,
            total,
            page,
            size,
            pages: page_count(total, size),
        })
    }

    #[instrument(skip(self), fields(work_center_id = id))]
    pub async fn get_work_center(&self, id: i32) -> Result<work_center::Model, ServiceError> {
        WorkCenterEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch work center", e))?
            .ok_or_else(|| ServiceError::not_found("Work center", id))
    }

    #[instrument(skip(self, request))]
    pub async fn create_work_center(
        &self,
        request: CreateWorkCenterRequest,
    ) -> Result<work_center::Model, ServiceError> {
        request.validate()?;

        let model = WorkCenterActiveModel {
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            address: Set(request.address),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::db("Failed to create work center", e))?;

        info!(work_center_id = model.id, "Work center created");
        Ok(model)
    }

    #[instrument(skip(self, request), fields(work_center_id = id))]
    pub async fn update_work_center(
        &self,
        id: i32,
        request: UpdateWorkCenterRequest,
    ) -> Result<work_center::Model, ServiceError> {
        request.validate()?;

        let mut active: WorkCenterActiveModel = self.get_work_center(id).await?.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(address) = request.address {
            active.address = Set(Some(address));
        }

        active
            .update(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to update work center", e))
    }

    /// Refuses while any production order is routed to the work center.
    #[instrument(skip(self), fields(work_center_id = id))]
    pub async fn delete_work_center(&self, id: i32) -> Result<(), ServiceError> {
        let work_center = self.get_work_center(id).await?;

        let in_use = ProductionOrderEntity::find()
            .filter(production_order::Column::WorkCenterId.eq(id))
            .count(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to check work center usage", e))?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(format!(
                "Work center {} is assigned to {} production order(s)",
                id, in_use
            )));
        }

        work_center
            .delete(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to delete work center", e))?;
        info!("Work center deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_length_is_bounded() {
        let ok = CreateWorkCenterRequest {
            name: "Print Shop".into(),
            description: None,
            address: Some("Building C".into()),
        };
        assert!(ok.validate().is_ok());

        let empty = CreateWorkCenterRequest {
            name: String::new(),
            ..ok.clone()
        };
        assert!(empty.validate().is_err());

        let long = UpdateWorkCenterRequest {
            name: Some("x".repeat(101)),
            ..Default::default()
        };
        assert!(long.validate().is_err());
        assert!(UpdateWorkCenterRequest::default().validate().is_ok());
    }
}
