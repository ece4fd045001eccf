use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::production_order::OrderStatus;
use crate::entities::waste_record::ProcessStep;
use crate::errors::ServiceError;
use crate::handlers::{AppState, PaginatedResponse, PaginationParams};
use crate::services::production_orders::{CreateOrderInput, OrderFilter};
use crate::services::production_recording::{
    RecordBatchInput, RecordConsumptionInput, RecordWasteInput, WasteReportFilter,
};

#[derive(Debug, Deserialize)]
struct OrderListParams {
    search: Option<String>,
    status: Option<OrderStatus>,
    product_id: Option<Uuid>,
    page: Option<u64>,
    per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct StatusChangeRequest {
    status: OrderStatus,
}

#[derive(Debug, Deserialize)]
struct WasteReportParams {
    order_id: Option<Uuid>,
    process: Option<ProcessStep>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

pub fn production_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/status", patch(change_status))
        .route(
            "/orders/{id}/consumptions",
            get(list_consumptions).post(record_consumption),
        )
        .route("/orders/{id}/batches", get(list_batches).post(record_batch))
        .route("/orders/{id}/wastes", get(list_wastes).post(record_waste))
        .route("/orders/{id}/cost-analysis", get(cost_analysis))
        .route("/wastes", get(waste_report))
}

async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .production_orders
        .create_order(payload)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.production_orders.get_order(id).await?;
    Ok(Json(order))
}

async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let mut pagination = PaginationParams::default();
    if let Some(page) = params.page {
        pagination.page = page;
    }
    if let Some(per_page) = params.per_page {
        pagination.per_page = per_page;
    }
    let filter = OrderFilter {
        search: params.search,
        status: params.status,
        product_id: params.product_id,
    };

    let (orders, total) = state
        .services
        .production_orders
        .list_orders(filter, pagination.page, pagination.per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(orders, total, &pagination)))
}

async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusChangeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .production_orders
        .transition(id, payload.status)
        .await?;
    Ok(Json(order))
}

async fn record_consumption(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordConsumptionInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let row = state
        .services
        .production_recording
        .record_consumption(id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn list_consumptions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state
        .services
        .production_recording
        .list_consumptions(id)
        .await?;
    Ok(Json(rows))
}

async fn record_batch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordBatchInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let batch = state
        .services
        .production_recording
        .record_batch(id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

async fn list_batches(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let batches = state.services.production_recording.list_batches(id).await?;
    Ok(Json(batches))
}

async fn record_waste(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordWasteInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state
        .services
        .production_recording
        .record_waste(id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_wastes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let wastes = state.services.production_recording.list_wastes(id).await?;
    Ok(Json(wastes))
}

async fn waste_report(
    State(state): State<AppState>,
    Query(params): Query<WasteReportParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state
        .services
        .production_recording
        .waste_report(WasteReportFilter {
            order_id: params.order_id,
            process: params.process,
            from: params.from,
            to: params.to,
        })
        .await?;
    Ok(Json(report))
}

async fn cost_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let analysis = state.services.costing.compute_cost_analysis(id).await?;
    Ok(Json(analysis))
}
