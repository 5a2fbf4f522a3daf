//! Row-level endpoint behavior through the real router: tenant gating,
//! rejection payloads, and the suggestion endpoint.

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tatabuku::db::DatabaseManager;
use tatabuku::domain::*;
use tatabuku::server::create_server;
use tatabuku::storage::{SqliteStorage, Storage};
use tower::ServiceExt;

async fn test_app() -> Result<(Router, i64)> {
    let db = DatabaseManager::open_in_memory()?;
    db.run_migrations().await?;
    let storage = Arc::new(SqliteStorage::new(Arc::new(db)));

    let mut company = Company {
        id: None,
        code: "DEMO".to_string(),
        name: "Demo Pte".to_string(),
        created_at: Utc::now(),
    };
    storage.create_company(&mut company).await?;
    let company_id = company.id.unwrap();

    for (code, name, class) in [
        ("1100", "Kas", AccountClass::Asset),
        ("4100", "Penjualan", AccountClass::Revenue),
        ("6200", "Beban Sewa", AccountClass::OperatingExpense),
    ] {
        let mut account = Account {
            id: None,
            company_id,
            code: code.to_string(),
            name: name.to_string(),
            class,
            normal_balance: class.normal_balance(),
        };
        storage.upsert_account(&mut account).await?;
    }

    Ok((create_server(storage), company_id))
}

fn post_json(uri: &str, company_id: i64, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("X-Company-Id", company_id.to_string())
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_tenant(uri: &str, company_id: i64) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("X-Company-Id", company_id.to_string())
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Result<Value> {
    let bytes = hyper::body::to_bytes(response.into_body()).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn balanced_voucher() -> Value {
    json!({
        "kind": "cash_in",
        "voucher_date": "2025-06-05",
        "remark": "setoran penjualan",
        "lines": [
            {"account_code": "1100", "memo": "penjualan tunai", "debit": "250", "credit": "0"},
            {"account_code": "4100", "memo": "penjualan tunai", "debit": "0", "credit": "250"}
        ]
    })
}

#[tokio::test]
async fn requests_without_a_tenant_are_refused() -> Result<()> {
    let (app, _) = test_app().await?;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/vouchers")
                .body(Body::empty())
                .unwrap(),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn unknown_tenant_is_refused_before_queries() -> Result<()> {
    let (app, _) = test_app().await?;

    let response = app.oneshot(get_with_tenant("/api/vouchers", 999)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn tenant_cookie_works_like_the_header() -> Result<()> {
    let (app, company_id) = test_app().await?;

    let request = Request::builder()
        .method("GET")
        .uri("/api/accounts")
        .header("cookie", format!("theme=dark; company_id={company_id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn balanced_voucher_is_created_with_a_number() -> Result<()> {
    let (app, company_id) = test_app().await?;

    let response = app
        .oneshot(post_json("/api/vouchers", company_id, balanced_voucher()))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await?;
    assert_eq!(body["voucher"]["number"], "CI-2025-0001");
    assert_eq!(body["warnings"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn unbalanced_voucher_is_rejected_with_findings() -> Result<()> {
    let (app, company_id) = test_app().await?;

    let payload = json!({
        "kind": "cash_out",
        "voucher_date": "2025-06-05",
        "lines": [
            {"account_code": "6200", "debit": "300", "credit": "0"},
            {"account_code": "1100", "debit": "0", "credit": "250"}
        ]
    });
    let response = app
        .oneshot(post_json("/api/vouchers", company_id, payload))
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await?;
    let findings = body["findings"].as_array().unwrap();
    assert!(findings
        .iter()
        .any(|finding| finding["kind"] == "unbalanced_entry"));
    Ok(())
}

#[tokio::test]
async fn invoice_with_broken_arithmetic_is_rejected() -> Result<()> {
    let (app, company_id) = test_app().await?;

    let payload = json!({
        "invoice_number": "INV/2025/071",
        "supplier": "PT Sumber Makmur",
        "invoice_date": "2025-06-01",
        "dpp": "1000000",
        "ppn": "110000",
        "total": "1100000"
    });
    let response = app
        .oneshot(post_json("/api/invoices", company_id, payload))
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await?;
    let findings = body["findings"].as_array().unwrap();
    assert!(findings
        .iter()
        .any(|finding| finding["kind"] == "dpp_plus_tax_mismatch"));
    Ok(())
}

#[tokio::test]
async fn payment_endpoint_returns_the_allocation_breakdown() -> Result<()> {
    let (app, company_id) = test_app().await?;

    let invoice = json!({
        "invoice_number": "INV/2025/071",
        "supplier": "PT Sumber Makmur",
        "invoice_date": "2025-06-01",
        "dpp": "1000000",
        "ppn": "110000",
        "total": "1110000"
    });
    let response = app
        .clone()
        .oneshot(post_json("/api/invoices", company_id, invoice))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await?;
    let invoice_id = created["id"].as_str().unwrap().to_string();

    let payment = json!({
        "paid_at": "2025-06-15",
        "method": "transfer",
        "amount": "555000"
    });
    let response = app
        .oneshot(post_json(
            &format!("/api/invoices/{invoice_id}/payments"),
            company_id,
            payment,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await?;
    assert_eq!(body["invoice_status"], "partially_paid");
    let allocations = body["payment"]["allocations"].as_array().unwrap();
    assert_eq!(allocations.len(), 2);
    let slice = |component: &str| -> Decimal {
        allocations
            .iter()
            .find(|a| a["component"] == component)
            .and_then(|a| a["amount"].as_str())
            .unwrap()
            .parse()
            .unwrap()
    };
    assert_eq!(slice("dpp"), "500000".parse::<Decimal>().unwrap());
    assert_eq!(slice("ppn"), "55000".parse::<Decimal>().unwrap());
    Ok(())
}

#[tokio::test]
async fn suggestions_rank_accounts_by_remark_similarity() -> Result<()> {
    let (app, company_id) = test_app().await?;

    // Seed history through the voucher endpoint so the corpus is real.
    let rent = json!({
        "kind": "cash_out",
        "voucher_date": "2025-05-01",
        "lines": [
            {"account_code": "6200", "memo": "sewa kantor bulan mei", "debit": "500", "credit": "0"},
            {"account_code": "1100", "memo": "sewa kantor bulan mei", "debit": "0", "credit": "500"}
        ]
    });
    let response = app
        .clone()
        .oneshot(post_json("/api/vouchers", company_id, rent))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(get_with_tenant(
            "/api/suggestions?remark=sewa%20kantor%20bulan%20juni",
            company_id,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    let suggestions = body["suggestions"].as_array().unwrap();
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0]["account_code"], "6200");
    assert_eq!(suggestions[0]["account_name"], "Beban Sewa");
    Ok(())
}

#[tokio::test]
async fn profit_loss_requires_a_period() -> Result<()> {
    let (app, company_id) = test_app().await?;

    let response = app
        .oneshot(get_with_tenant("/api/reports/profit-loss", company_id))
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}
