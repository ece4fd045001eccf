use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        product::{self, Entity as ProductEntity},
        stock_movement::{self, Entity as StockMovementEntity, MovementKind},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::LockMap,
};

/// Request to post one movement against a product.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_id: Uuid,
    pub kind: MovementKind,
    /// Magnitude for directional kinds; signed delta for WASTE_ADJUSTMENT.
    pub quantity: Decimal,
    pub order_id: Option<Uuid>,
    pub reference_document: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: Option<Uuid>,
}

impl NewMovement {
    pub fn new(product_id: Uuid, kind: MovementKind, quantity: Decimal) -> Self {
        Self {
            product_id,
            kind,
            quantity,
            order_id: None,
            reference_document: None,
            notes: None,
            recorded_by: None,
        }
    }
}

/// Single entry point for every stock mutation. All writes to
/// `products.current_stock` go through here, paired with an append-only
/// movement row in the same transaction, so the ledger always reconciles
/// with the cached balance.
#[derive(Clone)]
pub struct StockLedgerService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    product_locks: LockMap,
}

impl StockLedgerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db,
            event_sender,
            product_locks: LockMap::new(),
        }
    }

    /// Acquires the per-product mutation lock. Callers composing a wider
    /// transaction (e.g. consumption row + movement) take this first, then
    /// open their transaction and call [`apply_movement_in`].
    ///
    /// [`apply_movement_in`]: Self::apply_movement_in
    pub async fn lock_product(&self, product_id: Uuid) -> OwnedMutexGuard<()> {
        self.product_locks.lock(product_id).await
    }

    /// Converts a movement request into the signed delta applied to stock.
    fn signed_delta(kind: MovementKind, quantity: Decimal) -> Result<Decimal, ServiceError> {
        match kind {
            MovementKind::Entry | MovementKind::BatchProduction => {
                if quantity <= Decimal::ZERO {
                    return Err(ServiceError::ValidationError(
                        "Movement quantity must be positive".to_string(),
                    ));
                }
                Ok(quantity)
            }
            MovementKind::ExitProduction | MovementKind::Consumption => {
                if quantity <= Decimal::ZERO {
                    return Err(ServiceError::ValidationError(
                        "Movement quantity must be positive".to_string(),
                    ));
                }
                Ok(-quantity)
            }
            MovementKind::WasteAdjustment => {
                if quantity == Decimal::ZERO {
                    return Err(ServiceError::ValidationError(
                        "Adjustment quantity must be non-zero".to_string(),
                    ));
                }
                Ok(quantity)
            }
        }
    }

    /// Applies one movement inside the caller's transaction: re-reads the
    /// product, rejects any delta that would leave stock negative, updates the
    /// cached balance and appends the ledger row. The caller must hold the
    /// product lock from [`lock_product`](Self::lock_product) and commits (or
    /// rolls back) both writes as one unit.
    pub async fn apply_movement_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        input: NewMovement,
    ) -> Result<(stock_movement::Model, product::Model), ServiceError> {
        let delta = Self::signed_delta(input.kind, input.quantity)?;

        let product = ProductEntity::find_by_id(input.product_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or(ServiceError::ProductNotFound(input.product_id))?;

        let new_stock = product.current_stock + delta;
        if new_stock < Decimal::ZERO {
            error!(
                product_id = %product.id,
                sku = %product.sku,
                available = %product.current_stock,
                requested = %delta,
                "Movement rejected: would drive stock negative"
            );
            return Err(ServiceError::InsufficientStock(format!(
                "Insufficient stock for {}: available {}, requested {}",
                product.sku, product.current_stock, delta.abs()
            )));
        }

        let mut active: product::ActiveModel = product.into();
        active.current_stock = Set(new_stock);
        active.updated_at = Set(Some(Utc::now()));
        let updated_product = active.update(conn).await.map_err(ServiceError::db_error)?;

        let movement = stock_movement::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            kind: Set(input.kind.to_string()),
            quantity: Set(delta),
            order_id: Set(input.order_id),
            reference_document: Set(input.reference_document),
            notes: Set(input.notes),
            recorded_by: Set(input.recorded_by),
            created_at: Set(Utc::now()),
        };
        let movement = movement.insert(conn).await.map_err(ServiceError::db_error)?;

        Ok((movement, updated_product))
    }

    /// Emits the post-commit events for an applied movement. Callers invoke
    /// this only after their transaction has committed.
    pub async fn emit_movement_events(
        &self,
        movement: &stock_movement::Model,
        product: &product::Model,
    ) {
        self.event_sender
            .send_or_log(Event::StockMovementApplied {
                movement_id: movement.id,
                product_id: product.id,
                kind: movement.kind.clone(),
                quantity: movement.quantity,
                new_stock: product.current_stock,
            })
            .await;

        if product.current_stock <= product.min_stock {
            self.event_sender
                .send_or_log(Event::LowStockDetected {
                    product_id: product.id,
                    sku: product.sku.clone(),
                    current_stock: product.current_stock,
                    min_stock: product.min_stock,
                })
                .await;
        }
    }

    /// Posts a standalone movement (warehouse entry, production exit, manual
    /// adjustment) in its own transaction.
    #[instrument(skip(self), fields(product_id = %input.product_id, kind = %input.kind))]
    pub async fn apply_movement(
        &self,
        input: NewMovement,
    ) -> Result<stock_movement::Model, ServiceError> {
        let _guard = self.lock_product(input.product_id).await;

        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let (movement, product) = self.apply_movement_in(&txn, input).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        metrics::counter!("stock_movements_applied_total", 1);
        info!(
            movement_id = %movement.id,
            product_id = %product.id,
            kind = %movement.kind,
            delta = %movement.quantity,
            new_stock = %product.current_stock,
            "Stock movement applied"
        );

        self.emit_movement_events(&movement, &product).await;

        Ok(movement)
    }

    /// Movement history for a product, in insertion order, so the running
    /// sum of deltas reproduces `current_stock`.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        product_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        // Ensure the product exists so callers get a 404, not an empty page.
        ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or(ServiceError::ProductNotFound(product_id))?;

        let paginator = StockMovementEntity::find()
            .filter(stock_movement::Column::ProductId.eq(product_id))
            .order_by_asc(stock_movement::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let movements = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((movements, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn entry_and_batch_production_are_positive_deltas() {
        assert_eq!(
            StockLedgerService::signed_delta(MovementKind::Entry, dec!(5)).unwrap(),
            dec!(5)
        );
        assert_eq!(
            StockLedgerService::signed_delta(MovementKind::BatchProduction, dec!(50)).unwrap(),
            dec!(50)
        );
    }

    #[test]
    fn exit_and_consumption_are_negative_deltas() {
        assert_eq!(
            StockLedgerService::signed_delta(MovementKind::ExitProduction, dec!(5)).unwrap(),
            dec!(-5)
        );
        assert_eq!(
            StockLedgerService::signed_delta(MovementKind::Consumption, dec!(7)).unwrap(),
            dec!(-7)
        );
    }

    #[test]
    fn adjustments_keep_their_sign() {
        assert_eq!(
            StockLedgerService::signed_delta(MovementKind::WasteAdjustment, dec!(-3)).unwrap(),
            dec!(-3)
        );
        assert_eq!(
            StockLedgerService::signed_delta(MovementKind::WasteAdjustment, dec!(3)).unwrap(),
            dec!(3)
        );
    }

    #[test]
    fn zero_and_negative_magnitudes_are_rejected() {
        assert!(StockLedgerService::signed_delta(MovementKind::Entry, dec!(0)).is_err());
        assert!(StockLedgerService::signed_delta(MovementKind::Consumption, dec!(-2)).is_err());
        assert!(StockLedgerService::signed_delta(MovementKind::WasteAdjustment, dec!(0)).is_err());
    }
}
