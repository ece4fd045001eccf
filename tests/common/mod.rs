use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use fabrica_api::{
    app_router,
    config::AppConfig,
    db::{establish_connection_with_config, run_migrations, DbConfig},
    entities::product::ProductType,
    events::{process_events, EventSender},
    services::products::CreateProductInput,
    AppState,
};

/// Helper harness for spinning up an application state backed by an
/// in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let cfg = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 18080,
            log_level: "warn".to_string(),
            db_max_connections: 1,
            db_min_connections: 1,
            db_connect_timeout_secs: 5,
            db_idle_timeout_secs: 600,
            db_acquire_timeout_secs: 5,
            event_channel_capacity: 256,
        };

        // A single pooled connection keeps the in-memory database alive and
        // serializes SQLite access across concurrent test tasks.
        let db_cfg = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(5),
        };

        let pool = establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");
        run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        let router = app_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Send a request and decode the JSON body, asserting the status code.
    pub async fn request_json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        expected: StatusCode,
    ) -> Value {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read response body")
            .to_bytes();
        assert_eq!(
            status, expected,
            "unexpected status, body: {}",
            String::from_utf8_lossy(&bytes)
        );
        if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is not valid json")
        }
    }

    /// Seed a product directly through the service layer.
    pub async fn seed_product(
        &self,
        sku: &str,
        product_type: ProductType,
        initial_stock: Decimal,
        cost_price: Decimal,
    ) -> Uuid {
        let product = self
            .state
            .services
            .products
            .create_product(CreateProductInput {
                sku: sku.to_string(),
                description: format!("Test product {}", sku),
                product_type,
                unit: "kg".to_string(),
                initial_stock,
                min_stock: Decimal::ZERO,
                cost_price,
            })
            .await
            .expect("seed product for tests");
        product.id
    }

    /// Seed a PENDING production order for a finished product.
    pub async fn seed_order(&self, product_id: Uuid, quantity: Decimal) -> Uuid {
        let body = serde_json::json!({
            "product_id": product_id,
            "quantity": quantity,
        });
        let order = self
            .request_json(
                Method::POST,
                "/api/v1/production/orders",
                Some(body),
                StatusCode::CREATED,
            )
            .await;
        order["id"]
            .as_str()
            .expect("order id in response")
            .parse()
            .expect("order id is a uuid")
    }

    /// Current stock for a product, read through the API.
    pub async fn current_stock(&self, product_id: Uuid) -> Decimal {
        let product = self
            .request_json(
                Method::GET,
                &format!("/api/v1/inventory/products/{}", product_id),
                None,
                StatusCode::OK,
            )
            .await;
        product["current_stock"]
            .as_str()
            .expect("current_stock serialized as string")
            .parse()
            .expect("current_stock is a decimal")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
