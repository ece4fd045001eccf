use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        consumption::{self, Entity as ConsumptionEntity},
        costing::{self, Entity as CostingEntity},
        product::{self, Entity as ProductEntity},
        production_batch::{self, Entity as ProductionBatchEntity, QualityFlag},
        production_order::Entity as ProductionOrderEntity,
        waste_record::{self, Entity as WasteRecordEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Derived cost breakdown for one production order. Computed on demand from
/// the recorded consumptions, wastes and batches; never stored, so repeated
/// calls over unchanged data return identical numbers.
#[derive(Debug, Clone, Serialize)]
pub struct CostAnalysis {
    pub order_id: Uuid,
    pub order_number: String,
    pub product_id: Uuid,
    pub material_cost: Decimal,
    pub waste_cost: Decimal,
    pub total_cost: Decimal,
    /// Sum of RELEASED batch quantities.
    pub quantity_produced: Decimal,
    /// `total_cost / quantity_produced`, absent while nothing is released.
    pub unit_cost: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCostingInput {
    pub product_id: Uuid,
    pub calculation_date: NaiveDate,
    pub material_cost: Decimal,
    pub waste_cost: Decimal,
    pub labor_cost: Decimal,
}

/// Aggregates recorded production activity into money. Costing snapshots are
/// append-only history; corrections are new rows, never updates.
#[derive(Clone)]
pub struct CostingService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl CostingService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Prices an order's activity at current cost prices: consumptions at
    /// each material's `cost_price`, waste at the finished product's
    /// `cost_price`.
    #[instrument(skip(self))]
    pub async fn compute_cost_analysis(
        &self,
        order_id: Uuid,
    ) -> Result<CostAnalysis, ServiceError> {
        let order = ProductionOrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or(ServiceError::OrderNotFound(order_id))?;

        let consumptions = ConsumptionEntity::find()
            .filter(consumption::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let material_ids: Vec<Uuid> = consumptions.iter().map(|c| c.material_id).collect();
        let prices: HashMap<Uuid, Decimal> = if material_ids.is_empty() {
            HashMap::new()
        } else {
            ProductEntity::find()
                .filter(product::Column::Id.is_in(material_ids))
                .all(&*self.db)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|p| (p.id, p.cost_price))
                .collect()
        };

        let mut material_cost = Decimal::ZERO;
        for c in &consumptions {
            match prices.get(&c.material_id) {
                Some(price) => material_cost += c.quantity * price,
                None => {
                    // A consumed material was deleted from the catalog;
                    // price it at zero rather than failing the report.
                    warn!(material_id = %c.material_id, "Consumed material missing from catalog");
                }
            }
        }

        let finished_price = ProductEntity::find_by_id(order.product_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .map(|p| p.cost_price)
            .unwrap_or(Decimal::ZERO);

        let wastes = WasteRecordEntity::find()
            .filter(waste_record::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;
        let waste_cost: Decimal = wastes.iter().map(|w| w.quantity * finished_price).sum();

        let batches = ProductionBatchEntity::find()
            .filter(production_batch::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;
        let quantity_produced: Decimal = batches
            .iter()
            .filter(|b| b.quality.parse::<QualityFlag>().is_ok_and(QualityFlag::moves_stock))
            .map(|b| b.quantity_produced)
            .sum();

        let total_cost = material_cost + waste_cost;
        let unit_cost = if quantity_produced > Decimal::ZERO {
            Some(total_cost / quantity_produced)
        } else {
            None
        };

        Ok(CostAnalysis {
            order_id,
            order_number: order.order_number,
            product_id: order.product_id,
            material_cost,
            waste_cost,
            total_cost,
            quantity_produced,
            unit_cost,
        })
    }

    /// Stores a costing snapshot for a product. `total` is computed here, not
    /// trusted from the caller.
    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn create_costing(
        &self,
        input: CreateCostingInput,
    ) -> Result<costing::Model, ServiceError> {
        input.validate()?;

        if input.material_cost < Decimal::ZERO
            || input.waste_cost < Decimal::ZERO
            || input.labor_cost < Decimal::ZERO
        {
            return Err(ServiceError::ValidationError(
                "Cost components must not be negative".to_string(),
            ));
        }

        ProductEntity::find_by_id(input.product_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or(ServiceError::ProductNotFound(input.product_id))?;

        let total = input.material_cost + input.waste_cost + input.labor_cost;

        let model = costing::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            calculation_date: Set(input.calculation_date),
            material_cost: Set(input.material_cost),
            waste_cost: Set(input.waste_cost),
            labor_cost: Set(input.labor_cost),
            total: Set(total),
            created_at: Set(Utc::now()),
        };

        let created = model.insert(&*self.db).await.map_err(ServiceError::db_error)?;

        metrics::counter!("costings_created_total", 1);
        info!(
            costing_id = %created.id,
            product_id = %created.product_id,
            total = %created.total,
            "Costing snapshot created"
        );

        self.event_sender
            .send_or_log(Event::CostingCreated {
                costing_id: created.id,
                product_id: created.product_id,
                total: created.total,
                calculation_date: created.calculation_date,
            })
            .await;

        Ok(created)
    }

    /// Costing history for a product, newest calculation first.
    #[instrument(skip(self))]
    pub async fn list_costings(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<costing::Model>, ServiceError> {
        ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or(ServiceError::ProductNotFound(product_id))?;

        CostingEntity::find()
            .filter(costing::Column::ProductId.eq(product_id))
            .order_by_desc(costing::Column::CalculationDate)
            .order_by_desc(costing::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }
}
