//! Common test utilities for invoice-ledger-service integration tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use invoice_ledger_service::config::{IdStrategy, LedgerConfig, LedgerSettings};
use invoice_ledger_service::services::ids::{ManualClock, SequentialIdGenerator};
use invoice_ledger_service::services::Ledger;
use invoice_ledger_service::startup::Application;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use service_core::config::Config as CommonConfig;
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,invoice_ledger_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub ledger: Arc<Ledger>,
}

/// Spawn the application on a random port with sequential ids and a clock
/// fixed at 2025-07-18 10:00 UTC.
pub async fn spawn_app() -> TestApp {
    init_tracing();

    let settings = LedgerSettings {
        id_strategy: IdStrategy::Sequential,
        ..LedgerSettings::default()
    };
    let config = LedgerConfig {
        common: CommonConfig { port: 0 },
        service_name: "invoice-ledger-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        ledger: settings.clone(),
    };

    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 7, 18, 10, 0, 0).unwrap());
    let ledger = Ledger::new(
        settings,
        Arc::new(SequentialIdGenerator::new()),
        Arc::new(clock),
    )
    .expect("Failed to build ledger");

    let app = Application::build_with_ledger(config, ledger)
        .await
        .expect("Failed to build application");

    let address = format!("http://127.0.0.1:{}", app.port());
    let ledger = app.ledger();

    // Start the application in the background
    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
        ledger,
    }
}

impl TestApp {
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn create_invoice(&self, body: &Value) -> Value {
        let response = self.post("/invoices", body).await;
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Invalid invoice body")
    }

    pub async fn set_status(&self, id: &str, status: &str) -> reqwest::Response {
        self.post(
            &format!("/invoices/{}/status", id),
            &json!({ "status": status }),
        )
        .await
    }
}

/// Two bags of maize at 50 and one of beans at 30: total 130.
pub fn maize_and_beans() -> Value {
    invoice_request("F001", "B001", json!([
        { "name": "Maize", "quantity": 2, "unit": "bag", "price_per_unit": 50 },
        { "name": "Beans", "quantity": 1, "unit": "bag", "price_per_unit": 30 }
    ]))
}

pub fn invoice_request(farmer_id: &str, buyer_id: &str, items: Value) -> Value {
    json!({
        "farmer": {
            "id": farmer_id,
            "name": "Mwila Banda",
            "location": "Chongwe",
            "phone": "+260971234567"
        },
        "buyer": {
            "id": buyer_id,
            "name": "Lusaka Millers",
            "location": "Lusaka"
        },
        "items": items
    })
}

/// Parse a decimal rendered as a JSON string.
pub fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("decimal should be serialized as a string")
        .parse()
        .expect("invalid decimal")
}
