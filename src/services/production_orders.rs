use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        product::{Entity as ProductEntity, ProductType},
        production_order::{self, Entity as ProductionOrderEntity, OrderStatus, Priority},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::LockMap,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
    #[serde(default)]
    pub priority: Option<Priority>,
    pub planned_start_date: Option<NaiveDate>,
    pub planned_end_date: Option<NaiveDate>,
    pub gauge: Option<Decimal>,
    #[validate(length(max = 120))]
    pub measures: Option<String>,
    #[validate(length(max = 120))]
    pub machine: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    /// Substring match on the order number.
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    pub product_id: Option<Uuid>,
}

/// Owns the production-order lifecycle: creation in PENDING and the four
/// legal status transitions. Status never changes outside [`transition`].
///
/// [`transition`]: Self::transition
#[derive(Clone)]
pub struct ProductionOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    order_locks: LockMap,
}

impl ProductionOrderService {
    /// `order_locks` is shared with the recording service so that status
    /// transitions and recording operations on the same order serialize.
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender, order_locks: LockMap) -> Self {
        Self {
            db,
            event_sender,
            order_locks,
        }
    }

    pub async fn lock_order(&self, order_id: Uuid) -> OwnedMutexGuard<()> {
        self.order_locks.lock(order_id).await
    }

    fn generate_order_number() -> String {
        let token = Uuid::new_v4().simple().to_string();
        format!(
            "OP-{}-{}",
            Utc::now().format("%Y%m%d"),
            token[..6].to_uppercase()
        )
    }

    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn create_order(
        &self,
        input: CreateOrderInput,
    ) -> Result<production_order::Model, ServiceError> {
        input.validate()?;

        if input.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Order quantity must be positive".to_string(),
            ));
        }

        let product = ProductEntity::find_by_id(input.product_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or(ServiceError::ProductNotFound(input.product_id))?;

        if product.product_type() != Some(ProductType::FinishedProduct) {
            return Err(ServiceError::ValidationError(format!(
                "Product {} is not a finished product",
                product.sku
            )));
        }

        let order = production_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(Self::generate_order_number()),
            product_id: Set(input.product_id),
            quantity: Set(input.quantity),
            status: Set(OrderStatus::Pending.to_string()),
            priority: Set(input.priority.unwrap_or(Priority::Medium).to_string()),
            planned_start_date: Set(input.planned_start_date),
            planned_end_date: Set(input.planned_end_date),
            gauge: Set(input.gauge),
            measures: Set(input.measures),
            machine: Set(input.machine),
            notes: Set(input.notes),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let created = order.insert(&*self.db).await.map_err(ServiceError::db_error)?;

        metrics::counter!("production_orders_created_total", 1);
        info!(
            order_id = %created.id,
            order_number = %created.order_number,
            "Production order created"
        );

        self.event_sender
            .send_or_log(Event::ProductionOrderCreated {
                order_id: created.id,
                order_number: created.order_number.clone(),
                product_id: created.product_id,
                quantity: created.quantity,
            })
            .await;

        Ok(created)
    }

    /// Moves an order along one edge of the lifecycle graph. Held under the
    /// per-order lock so a concurrent recording call cannot observe a
    /// half-applied transition.
    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        order_id: Uuid,
        target: OrderStatus,
    ) -> Result<production_order::Model, ServiceError> {
        let _guard = self.lock_order(order_id).await;

        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let order = ProductionOrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or(ServiceError::OrderNotFound(order_id))?;

        let current = order.status().ok_or_else(|| {
            ServiceError::InternalError(format!("Order {} has corrupt status", order.order_number))
        })?;

        if !current.can_transition_to(target) {
            return Err(ServiceError::InvalidTransition(format!(
                "Order {} cannot move from {} to {}",
                order.order_number, current, target
            )));
        }

        let order_number = order.order_number.clone();
        let mut active: production_order::ActiveModel = order.into();
        active.status = Set(target.to_string());
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        metrics::counter!("production_order_transitions_total", 1);
        info!(
            order_id = %updated.id,
            order_number = %order_number,
            from = %current,
            to = %target,
            "Production order status changed"
        );

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id: updated.id,
                old_status: current.to_string(),
                new_status: target.to_string(),
            })
            .await;

        Ok(updated)
    }

    pub async fn get_order(
        &self,
        order_id: Uuid,
    ) -> Result<production_order::Model, ServiceError> {
        ProductionOrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or(ServiceError::OrderNotFound(order_id))
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        filter: OrderFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<production_order::Model>, u64), ServiceError> {
        let mut query = ProductionOrderEntity::find();

        if let Some(search) = filter.search.filter(|s| !s.is_empty()) {
            query = query
                .filter(production_order::Column::OrderNumber.like(format!("%{}%", search)));
        }
        if let Some(status) = filter.status {
            query = query.filter(production_order::Column::Status.eq(status.to_string()));
        }
        if let Some(product_id) = filter.product_id {
            query = query.filter(production_order::Column::ProductId.eq(product_id));
        }

        let paginator = query
            .order_by_desc(production_order::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((orders, total))
    }
}
