pub mod consumption;
pub mod costing;
pub mod product;
pub mod production_batch;
pub mod production_order;
pub mod stock_movement;
pub mod waste_record;
