use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::product::{self, Entity as ProductEntity, ProductType},
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 64, message = "sku must be 1-64 characters"))]
    pub sku: String,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    #[validate(length(min = 1, message = "unit must not be empty"))]
    pub unit: String,
    #[serde(default)]
    pub initial_stock: Decimal,
    #[serde(default)]
    pub min_stock: Decimal,
    #[serde(default)]
    pub cost_price: Decimal,
}

/// Fields that may change after creation. `current_stock` is deliberately
/// absent: the cached balance only moves through the stock ledger.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProductInput {
    pub description: Option<String>,
    pub unit: Option<String>,
    pub min_stock: Option<Decimal>,
    pub cost_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Matches against SKU or description, case-insensitive substring.
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<ProductType>,
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;

        if input.initial_stock < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "initial_stock must not be negative".to_string(),
            ));
        }
        if input.min_stock < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "min_stock must not be negative".to_string(),
            ));
        }
        if input.cost_price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "cost_price must not be negative".to_string(),
            ));
        }

        let existing = ProductEntity::find()
            .filter(product::Column::Sku.eq(input.sku.clone()))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product with SKU {} already exists",
                input.sku
            )));
        }

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(input.sku),
            description: Set(input.description),
            product_type: Set(input.product_type.to_string()),
            unit: Set(input.unit),
            current_stock: Set(input.initial_stock),
            min_stock: Set(input.min_stock),
            cost_price: Set(input.cost_price),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let created = model.insert(&*self.db).await.map_err(ServiceError::db_error)?;

        metrics::counter!("products_created_total", 1);
        info!(product_id = %created.id, sku = %created.sku, "Product created");

        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;

        if matches!(input.min_stock, Some(v) if v < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "min_stock must not be negative".to_string(),
            ));
        }
        if matches!(input.cost_price, Some(v) if v < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "cost_price must not be negative".to_string(),
            ));
        }

        let product = self.get_product(product_id).await?;

        let mut active: product::ActiveModel = product.into();
        if let Some(description) = input.description {
            if description.is_empty() {
                return Err(ServiceError::ValidationError(
                    "description must not be empty".to_string(),
                ));
            }
            active.description = Set(description);
        }
        if let Some(unit) = input.unit {
            active.unit = Set(unit);
        }
        if let Some(min_stock) = input.min_stock {
            active.min_stock = Set(min_stock);
        }
        if let Some(cost_price) = input.cost_price {
            active.cost_price = Set(cost_price);
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await.map_err(ServiceError::db_error)?;
        info!(product_id = %updated.id, "Product updated");

        Ok(updated)
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or(ServiceError::ProductNotFound(product_id))
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut query = ProductEntity::find();

        if let Some(search) = filter.search.filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(product::Column::Sku.like(pattern.clone()))
                    .add(product::Column::Description.like(pattern)),
            );
        }
        if let Some(product_type) = filter.product_type {
            query = query.filter(product::Column::ProductType.eq(product_type.to_string()));
        }

        let paginator = query
            .order_by_asc(product::Column::Sku)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let products = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((products, total))
    }
}
