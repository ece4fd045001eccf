use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        consumption::{self, Entity as ConsumptionEntity},
        product::{Entity as ProductEntity, ProductType},
        production_batch::{self, Entity as ProductionBatchEntity, QualityFlag},
        production_order::{self, Entity as ProductionOrderEntity},
        stock_movement::MovementKind,
        waste_record::{self, Entity as WasteRecordEntity, ProcessStep},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{stock_ledger::NewMovement, LockMap, StockLedgerService},
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordConsumptionInput {
    pub material_id: Uuid,
    pub consumed_quantity: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordBatchInput {
    #[validate(length(min = 1, max = 64, message = "batch_number must be 1-64 characters"))]
    pub batch_number: String,
    pub quantity_produced: Decimal,
    pub production_date: NaiveDate,
    pub quality: QualityFlag,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordWasteInput {
    pub process: ProcessStep,
    pub quantity: Decimal,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WasteReportFilter {
    pub order_id: Option<Uuid>,
    pub process: Option<ProcessStep>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Records what actually happened on the shop floor against an open order:
/// material consumptions, finished batches and waste. Every stock effect is
/// committed in the same transaction as the row that caused it.
#[derive(Clone)]
pub struct ProductionRecordingService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    ledger: StockLedgerService,
    order_locks: LockMap,
}

impl ProductionRecordingService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        ledger: StockLedgerService,
        order_locks: LockMap,
    ) -> Self {
        Self {
            db,
            event_sender,
            ledger,
            order_locks,
        }
    }

    /// Loads the order and rejects recording against a closed one. Runs
    /// inside the caller's transaction so the check and the writes that
    /// follow see the same snapshot.
    async fn open_order_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
    ) -> Result<production_order::Model, ServiceError> {
        let order = ProductionOrderEntity::find_by_id(order_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or(ServiceError::OrderNotFound(order_id))?;

        let status = order.status().ok_or_else(|| {
            ServiceError::InternalError(format!("Order {} has corrupt status", order.order_number))
        })?;

        if status.is_terminal() {
            return Err(ServiceError::OrderClosed(format!(
                "Order {} is {}",
                order.order_number, status
            )));
        }

        Ok(order)
    }

    /// Books raw-material usage: one consumption row plus one CONSUMPTION
    /// stock movement, atomically. Fails without side effects when the
    /// material's stock cannot cover the quantity.
    #[instrument(skip(self, input), fields(material_id = %input.material_id))]
    pub async fn record_consumption(
        &self,
        order_id: Uuid,
        input: RecordConsumptionInput,
    ) -> Result<consumption::Model, ServiceError> {
        input.validate()?;

        if input.consumed_quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "consumed_quantity must be positive".to_string(),
            ));
        }

        // Lock order first, then material. Every composite path uses this
        // order, so the two registries cannot deadlock against each other.
        let _order_guard = self.order_locks.lock(order_id).await;
        let _material_guard = self.ledger.lock_product(input.material_id).await;

        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let order = self.open_order_in(&txn, order_id).await?;

        let material = ProductEntity::find_by_id(input.material_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or(ServiceError::ProductNotFound(input.material_id))?;

        if material.product_type() != Some(ProductType::RawMaterial) {
            return Err(ServiceError::ValidationError(format!(
                "Product {} is not a raw material",
                material.sku
            )));
        }

        let row = consumption::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            material_id: Set(input.material_id),
            quantity: Set(input.consumed_quantity),
            created_at: Set(Utc::now()),
        };
        let row = row.insert(&txn).await.map_err(ServiceError::db_error)?;

        let mut movement = NewMovement::new(
            input.material_id,
            MovementKind::Consumption,
            input.consumed_quantity,
        );
        movement.order_id = Some(order_id);
        movement.reference_document = Some(order.order_number.clone());

        let (movement, product) = self.ledger.apply_movement_in(&txn, movement).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        metrics::counter!("consumptions_recorded_total", 1);
        info!(
            order_number = %order.order_number,
            material = %product.sku,
            quantity = %row.quantity,
            remaining_stock = %product.current_stock,
            "Consumption recorded"
        );

        self.ledger.emit_movement_events(&movement, &product).await;
        self.event_sender
            .send_or_log(Event::ConsumptionRecorded {
                order_id,
                material_id: row.material_id,
                quantity: row.quantity,
            })
            .await;

        Ok(row)
    }

    /// Registers a finished batch. RELEASED batches add to the finished
    /// product's stock in the same transaction; QUARANTINE and REJECTED
    /// batches are recorded without touching stock. The quality flag is
    /// final once written.
    #[instrument(skip(self, input), fields(batch_number = %input.batch_number))]
    pub async fn record_batch(
        &self,
        order_id: Uuid,
        input: RecordBatchInput,
    ) -> Result<production_batch::Model, ServiceError> {
        input.validate()?;

        if input.quantity_produced <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "quantity_produced must be positive".to_string(),
            ));
        }

        let _order_guard = self.order_locks.lock(order_id).await;

        // The product lock is only needed when the batch will move stock.
        let order = self.open_order_in(&*self.db, order_id).await?;
        let _product_guard = if input.quality.moves_stock() {
            Some(self.ledger.lock_product(order.product_id).await)
        } else {
            None
        };

        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        // Re-check under the transaction; the pre-read only sized the locks.
        let order = self.open_order_in(&txn, order_id).await?;

        let duplicate = ProductionBatchEntity::find()
            .filter(production_batch::Column::OrderId.eq(order_id))
            .filter(production_batch::Column::BatchNumber.eq(input.batch_number.clone()))
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::DuplicateBatch(format!(
                "Batch {} already recorded for order {}",
                input.batch_number, order.order_number
            )));
        }

        let batch = production_batch::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            batch_number: Set(input.batch_number.clone()),
            quantity_produced: Set(input.quantity_produced),
            production_date: Set(input.production_date),
            quality: Set(input.quality.to_string()),
            created_at: Set(Utc::now()),
        };
        let batch = batch.insert(&txn).await.map_err(ServiceError::db_error)?;

        let moved = if input.quality.moves_stock() {
            let mut movement = NewMovement::new(
                order.product_id,
                MovementKind::BatchProduction,
                input.quantity_produced,
            );
            movement.order_id = Some(order_id);
            movement.reference_document = Some(input.batch_number.clone());
            Some(self.ledger.apply_movement_in(&txn, movement).await?)
        } else {
            None
        };

        txn.commit().await.map_err(ServiceError::db_error)?;

        metrics::counter!("batches_recorded_total", 1);
        info!(
            order_number = %order.order_number,
            batch_number = %batch.batch_number,
            quantity = %batch.quantity_produced,
            quality = %batch.quality,
            moved_stock = moved.is_some(),
            "Production batch recorded"
        );

        if let Some((movement, product)) = &moved {
            self.ledger.emit_movement_events(movement, product).await;
        }
        self.event_sender
            .send_or_log(Event::BatchRecorded {
                order_id,
                batch_number: batch.batch_number.clone(),
                quantity_produced: batch.quantity_produced,
                quality: batch.quality.clone(),
            })
            .await;

        Ok(batch)
    }

    /// Documents process waste against an open order. Waste never moves
    /// stock; it only feeds cost analysis.
    #[instrument(skip(self, input), fields(process = %input.process))]
    pub async fn record_waste(
        &self,
        order_id: Uuid,
        input: RecordWasteInput,
    ) -> Result<waste_record::Model, ServiceError> {
        input.validate()?;

        if input.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Waste quantity must be positive".to_string(),
            ));
        }

        let _order_guard = self.order_locks.lock(order_id).await;

        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let order = self.open_order_in(&txn, order_id).await?;

        let record = waste_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            process: Set(input.process.to_string()),
            quantity: Set(input.quantity),
            reason: Set(input.reason),
            created_at: Set(Utc::now()),
        };
        let record = record.insert(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        metrics::counter!("wastes_recorded_total", 1);
        info!(
            order_number = %order.order_number,
            process = %record.process,
            quantity = %record.quantity,
            "Waste recorded"
        );

        self.event_sender
            .send_or_log(Event::WasteRecorded {
                order_id,
                process: record.process.clone(),
                quantity: record.quantity,
            })
            .await;

        Ok(record)
    }

    async fn ensure_order_exists(&self, order_id: Uuid) -> Result<(), ServiceError> {
        ProductionOrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or(ServiceError::OrderNotFound(order_id))?;
        Ok(())
    }

    pub async fn list_consumptions(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<consumption::Model>, ServiceError> {
        self.ensure_order_exists(order_id).await?;
        ConsumptionEntity::find()
            .filter(consumption::Column::OrderId.eq(order_id))
            .order_by_asc(consumption::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn list_batches(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<production_batch::Model>, ServiceError> {
        self.ensure_order_exists(order_id).await?;
        ProductionBatchEntity::find()
            .filter(production_batch::Column::OrderId.eq(order_id))
            .order_by_asc(production_batch::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn list_wastes(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<waste_record::Model>, ServiceError> {
        self.ensure_order_exists(order_id).await?;
        WasteRecordEntity::find()
            .filter(waste_record::Column::OrderId.eq(order_id))
            .order_by_asc(waste_record::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Plant-wide waste report, newest first, optionally narrowed by process
    /// step and recording date.
    #[instrument(skip(self))]
    pub async fn waste_report(
        &self,
        filter: WasteReportFilter,
    ) -> Result<Vec<waste_record::Model>, ServiceError> {
        let mut query = WasteRecordEntity::find();

        if let Some(order_id) = filter.order_id {
            query = query.filter(waste_record::Column::OrderId.eq(order_id));
        }
        if let Some(process) = filter.process {
            query = query.filter(waste_record::Column::Process.eq(process.to_string()));
        }
        if let Some(from) = filter.from {
            let start = from.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
            query = query.filter(waste_record::Column::CreatedAt.gte(start));
        }
        if let Some(to) = filter.to {
            let end = to
                .succ_opt()
                .unwrap_or(to)
                .and_hms_opt(0, 0, 0)
                .unwrap_or_default()
                .and_utc();
            query = query.filter(waste_record::Column::CreatedAt.lt(end));
        }

        query
            .order_by_desc(waste_record::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }
}
