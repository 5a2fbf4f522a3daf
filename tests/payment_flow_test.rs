//! The invoice payment flow end to end against storage: intake, partial
//! payment with proportional allocation, settlement, and the status flips
//! in between.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tatabuku::app::allocation::allocate_payment;
use tatabuku::db::DatabaseManager;
use tatabuku::domain::*;
use tatabuku::storage::{SqliteStorage, Storage};

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

async fn storage_with_company() -> Result<(SqliteStorage, i64)> {
    let db = DatabaseManager::open_in_memory()?;
    db.run_migrations().await?;
    let storage = SqliteStorage::new(Arc::new(db));

    let mut company = Company {
        id: None,
        code: "DEMO".to_string(),
        name: "Demo Pte".to_string(),
        created_at: Utc::now(),
    };
    storage.create_company(&mut company).await?;
    Ok((storage, company.id.unwrap()))
}

async fn intake_invoice(storage: &SqliteStorage, company_id: i64) -> Result<VendorInvoice> {
    let mut invoice = VendorInvoice {
        id: None,
        company_id,
        invoice_number: "INV/2025/071".to_string(),
        supplier: "PT Sumber Makmur".to_string(),
        invoice_date: date("2025-06-01"),
        due_date: Some(date("2025-07-01")),
        dpp: d("1000000"),
        ppn: d("110000"),
        total: d("1110000"),
        status: InvoiceStatus::Open,
        remark: Some("pembelian kertas".to_string()),
        purchase_order_id: None,
        created_at: Utc::now(),
    };
    storage.create_invoice(&mut invoice).await?;
    Ok(invoice)
}

/// Mirrors what the payment handler does for one payment.
async fn pay(
    storage: &SqliteStorage,
    company_id: i64,
    invoice: &VendorInvoice,
    amount: &str,
) -> Result<(InvoicePayment, InvoiceStatus)> {
    let invoice_id = invoice.id.unwrap();
    let (paid_dpp, paid_ppn) = storage.paid_components(company_id, invoice_id).await?;
    let outstanding_dpp = invoice.dpp - paid_dpp;
    let outstanding_ppn = invoice.ppn - paid_ppn;

    let breakdown = allocate_payment(outstanding_dpp, outstanding_ppn, d(amount))?;
    let settled = breakdown.dpp == outstanding_dpp && breakdown.ppn == outstanding_ppn;
    let status = if settled {
        InvoiceStatus::Paid
    } else {
        InvoiceStatus::PartiallyPaid
    };

    let mut payment = InvoicePayment {
        id: None,
        invoice_id,
        paid_at: date("2025-06-15"),
        method: "transfer".to_string(),
        amount: d(amount),
        allocations: breakdown.into_allocations(),
        created_at: Utc::now(),
    };
    storage.record_payment(company_id, &mut payment, status).await?;
    Ok((payment, status))
}

#[tokio::test]
async fn partial_payment_allocates_and_flips_status() -> Result<()> {
    let (storage, company_id) = storage_with_company().await?;
    let invoice = intake_invoice(&storage, company_id).await?;

    let (payment, status) = pay(&storage, company_id, &invoice, "555000").await?;
    assert_eq!(status, InvoiceStatus::PartiallyPaid);

    let dpp_slice = payment
        .allocations
        .iter()
        .find(|a| a.component == PaymentComponent::Dpp)
        .unwrap();
    let ppn_slice = payment
        .allocations
        .iter()
        .find(|a| a.component == PaymentComponent::Ppn)
        .unwrap();
    assert_eq!(dpp_slice.amount, d("500000"));
    assert_eq!(ppn_slice.amount, d("55000"));

    let reloaded = storage
        .get_invoice(company_id, invoice.id.unwrap())
        .await?
        .unwrap();
    assert_eq!(reloaded.status, InvoiceStatus::PartiallyPaid);

    let (paid_dpp, paid_ppn) = storage
        .paid_components(company_id, invoice.id.unwrap())
        .await?;
    assert_eq!(paid_dpp, d("500000"));
    assert_eq!(paid_ppn, d("55000"));
    Ok(())
}

#[tokio::test]
async fn second_payment_settles_the_invoice_exactly() -> Result<()> {
    let (storage, company_id) = storage_with_company().await?;
    let invoice = intake_invoice(&storage, company_id).await?;

    pay(&storage, company_id, &invoice, "555000").await?;
    let (_, status) = pay(&storage, company_id, &invoice, "555000").await?;
    assert_eq!(status, InvoiceStatus::Paid);

    let (paid_dpp, paid_ppn) = storage
        .paid_components(company_id, invoice.id.unwrap())
        .await?;
    assert_eq!(paid_dpp, invoice.dpp);
    assert_eq!(paid_ppn, invoice.ppn);

    // Nothing left to allocate against.
    assert!(pay(&storage, company_id, &invoice, "1").await.is_err());
    Ok(())
}

#[tokio::test]
async fn overpayment_is_rejected_before_anything_is_written() -> Result<()> {
    let (storage, company_id) = storage_with_company().await?;
    let invoice = intake_invoice(&storage, company_id).await?;

    assert!(pay(&storage, company_id, &invoice, "2000000").await.is_err());

    let payments = storage
        .list_payments(company_id, invoice.id.unwrap())
        .await?;
    assert!(payments.is_empty());

    let reloaded = storage
        .get_invoice(company_id, invoice.id.unwrap())
        .await?
        .unwrap();
    assert_eq!(reloaded.status, InvoiceStatus::Open);
    Ok(())
}

#[tokio::test]
async fn awkward_amounts_still_reconcile_to_the_cent() -> Result<()> {
    let (storage, company_id) = storage_with_company().await?;
    let invoice = intake_invoice(&storage, company_id).await?;

    for amount in ["333333.33", "333333.33", "333333.33"] {
        pay(&storage, company_id, &invoice, amount).await?;
    }
    let (_, status) = pay(&storage, company_id, &invoice, "110000.01").await?;
    assert_eq!(status, InvoiceStatus::Paid);

    let payments = storage
        .list_payments(company_id, invoice.id.unwrap())
        .await?;
    let allocated: Decimal = payments
        .iter()
        .flat_map(|payment| payment.allocations.iter())
        .map(|allocation| allocation.amount)
        .sum();
    assert_eq!(allocated, invoice.total);
    Ok(())
}

#[tokio::test]
async fn payments_are_tenant_scoped() -> Result<()> {
    let (storage, company_id) = storage_with_company().await?;
    let invoice = intake_invoice(&storage, company_id).await?;

    let mut other = Company {
        id: None,
        code: "BETA".to_string(),
        name: "Beta Pte".to_string(),
        created_at: Utc::now(),
    };
    storage.create_company(&mut other).await?;
    let other_id = other.id.unwrap();

    let mut payment = InvoicePayment {
        id: None,
        invoice_id: invoice.id.unwrap(),
        paid_at: date("2025-06-15"),
        method: "transfer".to_string(),
        amount: d("100"),
        allocations: Vec::new(),
        created_at: Utc::now(),
    };
    // The wrong tenant cannot record against this invoice.
    assert!(storage
        .record_payment(other_id, &mut payment, InvoiceStatus::PartiallyPaid)
        .await
        .is_err());
    Ok(())
}
