mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

use common::TestApp;
use fabrica_api::entities::product::ProductType;

async fn setup_recorded_order(app: &TestApp) -> (Uuid, Uuid) {
    let product_id = app
        .seed_product("BAG-300", ProductType::FinishedProduct, dec!(0), dec!(5))
        .await;
    let material_id = app
        .seed_product("RESIN-300", ProductType::RawMaterial, dec!(100), dec!(2))
        .await;
    let order_id = app.seed_order(product_id, dec!(500)).await;

    app.request_json(
        Method::PATCH,
        &format!("/api/v1/production/orders/{}/status", order_id),
        Some(json!({ "status": "IN_PROGRESS" })),
        StatusCode::OK,
    )
    .await;

    // 30 kg of resin at 2.00 and 4 kg of waste priced at the finished
    // product's 5.00.
    app.request_json(
        Method::POST,
        &format!("/api/v1/production/orders/{}/consumptions", order_id),
        Some(json!({ "material_id": material_id, "consumed_quantity": "30" })),
        StatusCode::CREATED,
    )
    .await;
    app.request_json(
        Method::POST,
        &format!("/api/v1/production/orders/{}/wastes", order_id),
        Some(json!({ "process": "PRINTING", "quantity": "4" })),
        StatusCode::CREATED,
    )
    .await;
    app.request_json(
        Method::POST,
        &format!("/api/v1/production/orders/{}/batches", order_id),
        Some(json!({
            "batch_number": "L-300",
            "quantity_produced": "40",
            "production_date": "2026-08-10",
            "quality": "RELEASED",
        })),
        StatusCode::CREATED,
    )
    .await;

    (order_id, product_id)
}

#[tokio::test]
async fn cost_analysis_prices_consumptions_and_waste() {
    let app = TestApp::new().await;
    let (order_id, _) = setup_recorded_order(&app).await;

    let analysis = app
        .request_json(
            Method::GET,
            &format!("/api/v1/production/orders/{}/cost-analysis", order_id),
            None,
            StatusCode::OK,
        )
        .await;

    assert_eq!(analysis["material_cost"], "60");
    assert_eq!(analysis["waste_cost"], "20");
    assert_eq!(analysis["total_cost"], "80");
    assert_eq!(analysis["quantity_produced"], "40");
    assert_eq!(analysis["unit_cost"], "2");
}

#[tokio::test]
async fn cost_analysis_is_idempotent_over_unchanged_data() {
    let app = TestApp::new().await;
    let (order_id, _) = setup_recorded_order(&app).await;
    let uri = format!("/api/v1/production/orders/{}/cost-analysis", order_id);

    let first = app.request_json(Method::GET, &uri, None, StatusCode::OK).await;
    let second = app.request_json(Method::GET, &uri, None, StatusCode::OK).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn cost_analysis_without_released_batches_has_no_unit_cost() {
    let app = TestApp::new().await;
    let product_id = app
        .seed_product("BAG-301", ProductType::FinishedProduct, dec!(0), dec!(5))
        .await;
    let order_id = app.seed_order(product_id, dec!(100)).await;

    let analysis = app
        .request_json(
            Method::GET,
            &format!("/api/v1/production/orders/{}/cost-analysis", order_id),
            None,
            StatusCode::OK,
        )
        .await;

    assert_eq!(analysis["material_cost"], "0");
    assert_eq!(analysis["unit_cost"], serde_json::Value::Null);
}

#[tokio::test]
async fn costing_total_is_computed_server_side() {
    let app = TestApp::new().await;
    let product_id = app
        .seed_product("BAG-302", ProductType::FinishedProduct, dec!(0), dec!(5))
        .await;

    let costing = app
        .request_json(
            Method::POST,
            "/api/v1/finances/costings",
            Some(json!({
                "product_id": product_id,
                "calculation_date": "2026-08-15",
                "material_cost": "60.00",
                "waste_cost": "20.00",
                "labor_cost": "15.50",
            })),
            StatusCode::CREATED,
        )
        .await;

    assert_eq!(costing["total"], "95.50");
}

#[tokio::test]
async fn negative_cost_components_are_rejected() {
    let app = TestApp::new().await;
    let product_id = app
        .seed_product("BAG-303", ProductType::FinishedProduct, dec!(0), dec!(5))
        .await;

    let error = app
        .request_json(
            Method::POST,
            "/api/v1/finances/costings",
            Some(json!({
                "product_id": product_id,
                "calculation_date": "2026-08-15",
                "material_cost": "-1",
                "waste_cost": "0",
                "labor_cost": "0",
            })),
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn costing_history_is_append_only() {
    let app = TestApp::new().await;
    let product_id = app
        .seed_product("BAG-304", ProductType::FinishedProduct, dec!(0), dec!(5))
        .await;

    for (date, labor) in [("2026-08-01", "10"), ("2026-08-15", "12")] {
        app.request_json(
            Method::POST,
            "/api/v1/finances/costings",
            Some(json!({
                "product_id": product_id,
                "calculation_date": date,
                "material_cost": "50",
                "waste_cost": "5",
                "labor_cost": labor,
            })),
            StatusCode::CREATED,
        )
        .await;
    }

    let history = app
        .request_json(
            Method::GET,
            &format!("/api/v1/finances/costings/{}", product_id),
            None,
            StatusCode::OK,
        )
        .await;

    let items = history.as_array().unwrap();
    assert_eq!(items.len(), 2);
    // Newest calculation first.
    assert_eq!(items[0]["calculation_date"], "2026-08-15");
    assert_eq!(items[1]["calculation_date"], "2026-08-01");
}

#[tokio::test]
async fn costings_for_unknown_product_are_not_found() {
    let app = TestApp::new().await;

    let error = app
        .request_json(
            Method::GET,
            &format!("/api/v1/finances/costings/{}", Uuid::new_v4()),
            None,
            StatusCode::NOT_FOUND,
        )
        .await;
    assert_eq!(error["code"], "PRODUCT_NOT_FOUND");
}
