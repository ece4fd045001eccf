mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::TestApp;
use fabrica_api::entities::product::ProductType;

#[tokio::test]
async fn products_are_created_through_the_api() {
    let app = TestApp::new().await;

    let product = app
        .request_json(
            Method::POST,
            "/api/v1/inventory/products",
            Some(json!({
                "sku": "FILM-500",
                "description": "LDPE film 500mm",
                "type": "RAW_MATERIAL",
                "unit": "kg",
                "initial_stock": "120",
                "min_stock": "20",
                "cost_price": "1.85",
            })),
            StatusCode::CREATED,
        )
        .await;

    assert_eq!(product["sku"], "FILM-500");
    assert_eq!(product["type"], "RAW_MATERIAL");
    assert_eq!(product["current_stock"], "120");
}

#[tokio::test]
async fn duplicate_skus_conflict() {
    let app = TestApp::new().await;
    app.seed_product("FILM-501", ProductType::RawMaterial, dec!(0), dec!(1))
        .await;

    let error = app
        .request_json(
            Method::POST,
            "/api/v1/inventory/products",
            Some(json!({
                "sku": "FILM-501",
                "description": "Duplicate",
                "type": "RAW_MATERIAL",
                "unit": "kg",
            })),
            StatusCode::CONFLICT,
        )
        .await;
    assert_eq!(error["code"], "CONFLICT");
}

#[tokio::test]
async fn product_list_filters_by_type_and_search() {
    let app = TestApp::new().await;
    app.seed_product("FILM-502", ProductType::RawMaterial, dec!(0), dec!(1))
        .await;
    app.seed_product("BAG-502", ProductType::FinishedProduct, dec!(0), dec!(1))
        .await;
    app.seed_product("GLOVE-502", ProductType::IndirectSupply, dec!(0), dec!(1))
        .await;

    let page = app
        .request_json(
            Method::GET,
            "/api/v1/inventory/products?type=FINISHED_PRODUCT",
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["sku"], "BAG-502");

    let page = app
        .request_json(
            Method::GET,
            "/api/v1/inventory/products?search=film",
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["sku"], "FILM-502");
}

#[tokio::test]
async fn negative_initial_stock_is_rejected() {
    let app = TestApp::new().await;

    app.request_json(
        Method::POST,
        "/api/v1/inventory/products",
        Some(json!({
            "sku": "FILM-503",
            "description": "Bad seed",
            "type": "RAW_MATERIAL",
            "unit": "kg",
            "initial_stock": "-5",
        })),
        StatusCode::BAD_REQUEST,
    )
    .await;
}
