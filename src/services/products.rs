use crate::{
    db::DbPool,
    entities::product::{self, ActiveModel as ProductActiveModel, Entity as ProductEntity},
    entities::sales_order_item::{self, Entity as SalesOrderItemEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::contains_ci;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom = "validate_price")]
    #[schema(value_type = f64, example = 19.99)]
    pub price: Decimal,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(range(min = 0))]
    pub stock_qty: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom = "validate_price")]
    #[schema(value_type = f64, example = 24.5)]
    pub price: Decimal,
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RestockRequest {
    #[validate(range(min = 1, message = "Restock quantity must be greater than zero"))]
    pub quantity: i32,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO {
        let mut err = ValidationError::new("price");
        err.message = Some("Price must be greater than zero".into());
        return Err(err);
    }
    Ok(())
}

/// Catalog maintenance.
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        search: Option<String>,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let mut query = ProductEntity::find();
        if let Some(term) = search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(contains_ci(ProductEntity, product::Column::Name, term));
        }

        query
            .order_by_asc(product::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to list products", e))
    }

    #[instrument(skip(self), fields(product_id = id))]
    pub async fn get_product(&self, id: i32) -> Result<product::Model, ServiceError> {
        ProductEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch product", e))?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;

        let model = ProductActiveModel {
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            price: Set(request.price),
            stock_qty: Set(request.stock_qty.unwrap_or(0)),
            image_url: Set(request.image_url),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::db("Failed to create product", e))?;

        info!(product_id = model.id, "Product created");
        Ok(model)
    }

    #[instrument(skip(self, request), fields(product_id = id))]
    pub async fn update_product(
        &self,
        id: i32,
        request: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;

        let existing = self.get_product(id).await?;
        let mut active: ProductActiveModel = existing.into();
        active.name = Set(request.name.trim().to_string());
        active.description = Set(request.description);
        active.price = Set(request.price);
        active.image_url = Set(request.image_url);

        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to update product", e))?;

        info!(product_id = id, "Product updated");
        Ok(updated)
    }

    /// Adds `quantity` units to stock with a single relative update.
    #[instrument(skip(self, request), fields(product_id = id, quantity = request.quantity))]
    pub async fn restock_product(
        &self,
        id: i32,
        request: RestockRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;

        let txn = self
            .db_pool
            .begin()
            .await
            .map_err(|e| ServiceError::db("Failed to begin restock transaction", e))?;

        let result = ProductEntity::update_many()
            .col_expr(
                product::Column::StockQty,
                Expr::col(product::Column::StockQty).add(request.quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(product::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| ServiceError::db("Failed to restock product", e))?;

        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Product", id));
        }

        let updated = ProductEntity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| ServiceError::db("Failed to reload product", e))?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;

        txn.commit()
            .await
            .map_err(|e| ServiceError::db("Failed to commit restock", e))?;

        info!(product_id = id, stock_qty = updated.stock_qty, "Product restocked");
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::ProductRestocked {
                product_id: id,
                quantity: request.quantity,
                stock_qty: updated.stock_qty,
            });
        }
        Ok(updated)
    }

    /// Deletes a product that no order line refers to.
    #[instrument(skip(self), fields(product_id = id))]
    pub async fn delete_product(&self, id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.get_product(id).await?;

        let references = SalesOrderItemEntity::find()
            .filter(sales_order_item::Column::ProductId.eq(id))
            .count(db)
            .await
            .map_err(|e| ServiceError::db("Failed to count product references", e))?;
        if references > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product {} is referenced by {} order item(s)",
                id, references
            )));
        }

        ProductEntity::delete_by_id(id)
            .exec(db)
            .await
            .map_err(|e| ServiceError::db("Failed to delete product", e))?;

        info!(product_id = id, "Product deleted");
        Ok(())
    }
}
