pub mod costings;
pub mod inventory;
pub mod production_orders;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    CostingService, LockMap, ProductService, ProductionOrderService, ProductionRecordingService,
    StockLedgerService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: ProductService,
    pub stock_ledger: StockLedgerService,
    pub production_orders: ProductionOrderService,
    pub production_recording: ProductionRecordingService,
    pub costing: CostingService,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        // One shared registry so transitions and recording calls against the
        // same order take the same lock.
        let order_locks = LockMap::new();

        let stock_ledger = StockLedgerService::new(db_pool.clone(), event_sender.clone());
        let products = ProductService::new(db_pool.clone());
        let production_orders = ProductionOrderService::new(
            db_pool.clone(),
            event_sender.clone(),
            order_locks.clone(),
        );
        let production_recording = ProductionRecordingService::new(
            db_pool.clone(),
            event_sender.clone(),
            stock_ledger.clone(),
            order_locks,
        );
        let costing = CostingService::new(db_pool, event_sender);

        Self {
            products,
            stock_ledger,
            production_orders,
            production_recording,
            costing,
        }
    }
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    25
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, params: &PaginationParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }
}
