use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::product::ProductType;
use crate::entities::stock_movement::MovementKind;
use crate::errors::ServiceError;
use crate::handlers::{AppState, PaginatedResponse, PaginationParams};
use crate::services::products::{CreateProductInput, ProductFilter, UpdateProductInput};
use crate::services::stock_ledger::NewMovement;

// Query deserialization cannot flatten nested structs, so filter and
// pagination fields live side by side here.
#[derive(Debug, Deserialize)]
struct ProductListParams {
    search: Option<String>,
    #[serde(rename = "type")]
    product_type: Option<ProductType>,
    page: Option<u64>,
    per_page: Option<u64>,
}

impl ProductListParams {
    fn split(self) -> (ProductFilter, PaginationParams) {
        let mut pagination = PaginationParams::default();
        if let Some(page) = self.page {
            pagination.page = page;
        }
        if let Some(per_page) = self.per_page {
            pagination.per_page = per_page;
        }
        (
            ProductFilter {
                search: self.search,
                product_type: self.product_type,
            },
            pagination,
        )
    }
}

/// Body for the warehouse entry and production exit endpoints. The movement
/// direction comes from the route, never from the payload.
#[derive(Debug, Deserialize)]
struct MovementRequest {
    product_id: Uuid,
    quantity: Decimal,
    reference_document: Option<String>,
    notes: Option<String>,
}

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", get(get_product).put(update_product))
        .route("/products/{id}/movements", get(list_movements))
        .route("/movements/entry", post(record_entry))
        .route("/movements/exit-production", post(record_exit_production))
}

async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.create_product(payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.get_product(id).await?;
    Ok(Json(product))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.update_product(id, payload).await?;
    Ok(Json(product))
}

async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (filter, pagination) = params.split();
    let (products, total) = state
        .services
        .products
        .list_products(filter, pagination.page, pagination.per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(products, total, &pagination)))
}

async fn list_movements(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (movements, total) = state
        .services
        .stock_ledger
        .list_movements(id, pagination.page, pagination.per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(movements, total, &pagination)))
}

async fn record_entry(
    State(state): State<AppState>,
    Json(payload): Json<MovementRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    apply_movement(state, MovementKind::Entry, payload).await
}

async fn record_exit_production(
    State(state): State<AppState>,
    Json(payload): Json<MovementRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    apply_movement(state, MovementKind::ExitProduction, payload).await
}

async fn apply_movement(
    state: AppState,
    kind: MovementKind,
    payload: MovementRequest,
) -> Result<impl IntoResponse, ServiceError> {
    let mut movement = NewMovement::new(payload.product_id, kind, payload.quantity);
    movement.reference_document = payload.reference_document;
    movement.notes = payload.notes;

    let recorded = state.services.stock_ledger.apply_movement(movement).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}
