mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;

use common::TestApp;
use fabrica_api::entities::product::ProductType;
use fabrica_api::errors::ServiceError;
use fabrica_api::services::production_recording::RecordConsumptionInput;

#[tokio::test]
async fn concurrent_consumptions_never_overdraw() {
    let app = TestApp::new().await;
    let product_id = app
        .seed_product("BAG-400", ProductType::FinishedProduct, dec!(0), dec!(5))
        .await;
    let material_id = app
        .seed_product("RESIN-400", ProductType::RawMaterial, dec!(10), dec!(2))
        .await;
    let order_id = app.seed_order(product_id, dec!(100)).await;

    let recording = app.state.services.production_recording.clone();
    let a = recording.record_consumption(
        order_id,
        RecordConsumptionInput {
            material_id,
            consumed_quantity: dec!(7),
        },
    );
    let b = recording.record_consumption(
        order_id,
        RecordConsumptionInput {
            material_id,
            consumed_quantity: dec!(7),
        },
    );

    let (ra, rb) = tokio::join!(a, b);

    // Exactly one of the two 7 kg draws fits into 10 kg of stock.
    let successes = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let failure = if ra.is_err() { ra } else { rb };
    assert!(matches!(
        failure,
        Err(ServiceError::InsufficientStock(_))
    ));

    assert_eq!(app.current_stock(material_id).await, dec!(3));

    let rows = app
        .request_json(
            Method::GET,
            &format!("/api/v1/production/orders/{}/consumptions", order_id),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(rows.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_transition_and_recording_serialize() {
    let app = TestApp::new().await;
    let product_id = app
        .seed_product("BAG-401", ProductType::FinishedProduct, dec!(0), dec!(5))
        .await;
    let material_id = app
        .seed_product("RESIN-401", ProductType::RawMaterial, dec!(50), dec!(2))
        .await;
    let order_id = app.seed_order(product_id, dec!(100)).await;

    let orders = app.state.services.production_orders.clone();
    let recording = app.state.services.production_recording.clone();

    let cancel = orders.transition(
        order_id,
        fabrica_api::entities::production_order::OrderStatus::Cancelled,
    );
    let consume = recording.record_consumption(
        order_id,
        RecordConsumptionInput {
            material_id,
            consumed_quantity: dec!(5),
        },
    );

    let (cancelled, consumed) = tokio::join!(cancel, consume);
    assert!(cancelled.is_ok());

    // Either the consumption landed before the cancel, or it was refused;
    // both orders of events leave the books consistent.
    match consumed {
        Ok(_) => assert_eq!(app.current_stock(material_id).await, dec!(45)),
        Err(ServiceError::OrderClosed(_)) => {
            assert_eq!(app.current_stock(material_id).await, dec!(50));
        }
        Err(other) => panic!("unexpected error: {other}"),
    }

    let rows = app
        .request_json(
            Method::GET,
            &format!("/api/v1/production/orders/{}/consumptions", order_id),
            None,
            StatusCode::OK,
        )
        .await;
    let consumption_count = rows.as_array().unwrap().len();
    let stock = app.current_stock(material_id).await;
    assert_eq!(stock == dec!(45), consumption_count == 1);
}

#[tokio::test]
async fn concurrent_duplicate_batches_record_once() {
    let app = TestApp::new().await;
    let product_id = app
        .seed_product("BAG-402", ProductType::FinishedProduct, dec!(0), dec!(5))
        .await;
    let order_id = app.seed_order(product_id, dec!(100)).await;

    let recording = app.state.services.production_recording.clone();
    let input = fabrica_api::services::production_recording::RecordBatchInput {
        batch_number: "L-777".to_string(),
        quantity_produced: dec!(25),
        production_date: chrono::NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(),
        quality: fabrica_api::entities::production_batch::QualityFlag::Released,
    };

    let a = recording.record_batch(order_id, input.clone());
    let b = recording.record_batch(order_id, input.clone());
    let (ra, rb) = tokio::join!(a, b);

    let successes = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let failure = if ra.is_err() { ra } else { rb };
    assert!(matches!(failure, Err(ServiceError::DuplicateBatch(_))));

    // Stock moved exactly once.
    assert_eq!(app.current_stock(product_id).await, dec!(25));
}
