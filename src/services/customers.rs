use crate::{
    db::DbPool,
    entities::customer::{self, ActiveModel as CustomerActiveModel, CustomerRole, Entity as CustomerEntity},
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use super::{check_page, contains_ci, page_count};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: CustomerRole,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

fn default_role() -> CustomerRole {
    CustomerRole::Student
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerPage {
    pub customers: Vec<customer::Model>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
    pub pages: u64,
}

#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    fn search_query(search: Option<&str>, include_email: bool) -> Select<CustomerEntity> {
        let mut query = CustomerEntity::find();
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            let mut condition =
                Condition::any().add(contains_ci(CustomerEntity, customer::Column::Name, term));
            if include_email {
                condition =
                    condition.add(contains_ci(CustomerEntity, customer::Column::Email, term));
            }
            query = query.filter(condition);
        }
        query
    }

    /// All customers, optionally filtered by a case-insensitive name match.
    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        search: Option<String>,
    ) -> Result<Vec<customer::Model>, ServiceError> {
        Self::search_query(search.as_deref(), false)
            .order_by_asc(customer::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to list customers", e))
    }

    /// One page of customers, searching both name and email.
    #[instrument(skip(self))]
    pub async fn list_customers_paginated(
        &self,
        page: u64,
        size: u64,
        search: Option<String>,
    ) -> Result<CustomerPage, ServiceError> {
        check_page(page, size)?;

        let paginator = Self::search_query(search.as_deref(), true)
            .order_by_asc(customer::Column::Id)
            .paginate(&*self.db_pool, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| ServiceError::db("Failed to count customers", e))?;
        let customers = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch customers page", e))?;

        Ok(CustomerPage {
            customers,
            total,
            page,
            size,
            pages: page_count(total, size),
        })
    }

    #[instrument(skip(self), fields(customer_id = id))]
    pub async fn get_customer(&self, id: i32) -> Result<customer::Model, ServiceError> {
        CustomerEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch customer", e))?
            .ok_or_else(|| ServiceError::not_found("Customer", id))
    }

    #[instrument(skip(self, request), fields(role = %request.role))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;

        let model = CustomerActiveModel {
            name: Set(request.name.trim().to_string()),
            email: Set(request.email.trim().to_lowercase()),
            role: Set(request.role),
            phone: Set(request.phone),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::db("Failed to create customer", e))?;

        info!(customer_id = model.id, "Customer created");
        Ok(model)
    }
}
