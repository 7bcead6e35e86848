//! Supply-chain traceability over HTTP.

mod common;

use common::spawn_app;
use serde_json::{json, Value};

fn event(product_id: &str, event_type: &str, timestamp: Option<&str>) -> Value {
    let mut body = json!({
        "product_id": product_id,
        "farmer_id": "F001",
        "event_type": event_type,
        "location": "Chongwe",
        "details": "Grade A"
    });
    if let Some(ts) = timestamp {
        body["timestamp"] = json!(ts);
    }
    body
}

#[tokio::test]
async fn test_record_and_trace_product() {
    let app = spawn_app().await;

    let response = app
        .post("/supply-chain/events", &event("P001", "harvest", Some("2025-07-15T06:00:00Z")))
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let harvest: Value = response.json().await.unwrap();
    assert_eq!(harvest["id"], "EVT-001");
    assert!(harvest["content_hash"].as_str().unwrap().starts_with("0x"));

    let mut transport = event("P001", "transport", Some("2025-07-16T09:30:00Z"));
    transport["buyer_id"] = json!("B001");
    assert_eq!(
        app.post("/supply-chain/events", &transport).await.status().as_u16(),
        201
    );

    let trace: Value = app
        .get("/supply-chain/products/P001/events")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(trace["product_id"], "P001");
    let types: Vec<_> = trace["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["harvest", "transport"]);
    assert_eq!(trace["events"][1]["buyer_id"], "B001");
}

#[tokio::test]
async fn test_event_timestamp_defaults_to_clock() {
    let app = spawn_app().await;

    let response = app.post("/supply-chain/events", &event("P001", "storage", None)).await;
    assert_eq!(response.status().as_u16(), 201);
    let recorded: Value = response.json().await.unwrap();
    assert_eq!(recorded["timestamp"], "2025-07-18T10:00:00Z");
}

#[tokio::test]
async fn test_out_of_order_event_rejected() {
    let app = spawn_app().await;
    app.post("/supply-chain/events", &event("P001", "harvest", Some("2025-07-16T06:00:00Z")))
        .await;

    let response = app
        .post("/supply-chain/events", &event("P001", "planting", Some("2025-03-01T06:00:00Z")))
        .await;
    assert_eq!(response.status().as_u16(), 422);

    // Other products are unaffected.
    let response = app
        .post("/supply-chain/events", &event("P002", "planting", Some("2025-03-01T06:00:00Z")))
        .await;
    assert_eq!(response.status().as_u16(), 201);

    assert_eq!(app.ledger.product_trace("P001").len(), 1);
}

#[tokio::test]
async fn test_missing_fields_rejected() {
    let app = spawn_app().await;
    let response = app.post("/supply-chain/events", &event("", "harvest", None)).await;
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn test_unknown_product_has_empty_trace() {
    let app = spawn_app().await;
    let trace: Value = app
        .get("/supply-chain/products/P404/events")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(trace["events"], json!([]));
}

#[tokio::test]
async fn test_free_form_event_types_do_not_add_metric_series() {
    let app = spawn_app().await;

    for (hour, kind) in ["06", "07", "08"].iter().zip(["kiln-dry-a1", "kiln-dry-b2", "kiln-dry-c3"]) {
        let ts = format!("2025-07-15T{}:00:00Z", hour);
        let response = app
            .post("/supply-chain/events", &event("P900", kind, Some(&ts)))
            .await;
        assert_eq!(response.status().as_u16(), 201);
    }

    let exposition = app.get("/metrics").await.text().await.unwrap();
    assert!(!exposition.contains("kiln-dry"));
    assert!(exposition.contains("ledger_supply_chain_events_total{event_type=\"other\"}"));
}
