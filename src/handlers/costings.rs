use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::costing::CreateCostingInput;

pub fn costings_routes() -> Router<AppState> {
    Router::new()
        .route("/costings", post(create_costing))
        .route("/costings/{product_id}", get(list_costings))
}

async fn create_costing(
    State(state): State<AppState>,
    Json(payload): Json<CreateCostingInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let costing = state.services.costing.create_costing(payload).await?;
    Ok((StatusCode::CREATED, Json(costing)))
}

async fn list_costings(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let costings = state.services.costing.list_costings(product_id).await?;
    Ok(Json(costings))
}
