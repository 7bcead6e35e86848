//! Status transitions and settlement over HTTP.

mod common;

use common::{decimal, maize_and_beans, spawn_app};
use invoice_ledger_service::models::InvoiceStatus;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

#[tokio::test]
async fn test_approve_then_pay_emits_one_transaction() {
    let app = spawn_app().await;
    let created = app.create_invoice(&maize_and_beans()).await;

    let response = app.set_status("INV-001", "approved").await;
    assert_eq!(response.status().as_u16(), 200);
    let approved: Value = response.json().await.unwrap();
    assert_eq!(approved["previous_status"], "pending");
    assert_eq!(approved["invoice"]["status"], "approved");
    assert!(approved["transaction"].is_null());
    assert_ne!(approved["invoice"]["content_hash"], created["content_hash"]);

    let response = app
        .post(
            "/invoices/INV-001/status",
            &json!({ "status": "paid", "payment_method": "bank_transfer" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let paid: Value = response.json().await.unwrap();
    assert_eq!(paid["invoice"]["status"], "paid");
    assert_eq!(paid["invoice"]["next_statuses"], json!([]));

    let tx = &paid["transaction"];
    assert_eq!(tx["id"], "TX-001");
    assert_eq!(tx["invoice_id"], "INV-001");
    assert_eq!(decimal(&tx["amount"]), dec!(130));
    assert_eq!(tx["payment_method"], "bank_transfer");
    assert_eq!(tx["status"], "completed");

    let fetched: Value = app.get("/transactions/TX-001").await.json().await.unwrap();
    assert_eq!(fetched["content_hash"], tx["content_hash"]);

    let listed: Value = app
        .get("/invoices/INV-001/transactions")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_paying_twice_is_invalid_transition() {
    let app = spawn_app().await;
    app.create_invoice(&maize_and_beans()).await;
    app.set_status("INV-001", "approved").await;
    assert_eq!(app.set_status("INV-001", "paid").await.status().as_u16(), 200);

    let response = app.set_status("INV-001", "paid").await;
    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "invalid_transition");

    assert_eq!(app.ledger.store().transaction_count(), 1);
}

#[tokio::test]
async fn test_pending_cannot_jump_to_paid() {
    let app = spawn_app().await;
    let created = app.create_invoice(&maize_and_beans()).await;

    let response = app.set_status("INV-001", "paid").await;
    assert_eq!(response.status().as_u16(), 409);

    let invoice: Value = app.get("/invoices/INV-001").await.json().await.unwrap();
    assert_eq!(invoice["status"], "pending");
    assert_eq!(invoice["content_hash"], created["content_hash"]);
    assert_eq!(app.ledger.store().transaction_count(), 0);
}

#[tokio::test]
async fn test_rejected_is_terminal() {
    let app = spawn_app().await;
    app.create_invoice(&maize_and_beans()).await;

    assert_eq!(app.set_status("INV-001", "rejected").await.status().as_u16(), 200);
    for status in ["pending", "approved", "paid"] {
        assert_eq!(app.set_status("INV-001", status).await.status().as_u16(), 409);
    }
}

#[tokio::test]
async fn test_draft_must_be_submitted_first() {
    let app = spawn_app().await;
    let mut body = maize_and_beans();
    body["as_draft"] = json!(true);
    app.create_invoice(&body).await;

    assert_eq!(app.set_status("INV-001", "approved").await.status().as_u16(), 409);
    assert_eq!(app.set_status("INV-001", "pending").await.status().as_u16(), 200);
    assert_eq!(app.set_status("INV-001", "approved").await.status().as_u16(), 200);
}

#[tokio::test]
async fn test_status_change_on_unknown_invoice() {
    let app = spawn_app().await;
    let response = app.set_status("INV-404", "approved").await;
    assert_eq!(response.status().as_u16(), 404);

    let response = app.get("/invoices/INV-404/transactions").await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_concurrent_payments_settle_once() {
    let app = spawn_app().await;
    app.create_invoice(&maize_and_beans()).await;
    app.set_status("INV-001", "approved").await;

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let client = app.client.clone();
        let url = format!("{}/invoices/INV-001/status", app.address);
        tasks.spawn(async move {
            client
                .post(url)
                .json(&json!({ "status": "paid" }))
                .send()
                .await
                .expect("Failed to execute request")
                .status()
                .as_u16()
        });
    }

    let mut statuses = Vec::new();
    while let Some(status) = tasks.join_next().await {
        statuses.push(status.unwrap());
    }

    assert_eq!(statuses.iter().filter(|&&s| s == 200).count(), 1);
    assert_eq!(statuses.iter().filter(|&&s| s == 409).count(), 7);
    assert_eq!(app.ledger.store().transaction_count(), 1);

    let invoice = app.ledger.find_invoice("INV-001").unwrap();
    assert_eq!(invoice.status(), InvoiceStatus::Paid);
}
