use super::{require_company, AppState, Tenant};
use crate::app::allocation::allocate_payment;
use crate::app::rules::EntryRules;
use crate::domain::{InvoicePayment, InvoiceStatus, VendorInvoice};
use crate::error::{BackofficeError, Result};
use crate::observability::metrics;
use crate::storage::{InvoiceFilter, Page};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct InvoiceQuery {
    pub supplier: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub q: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct InvoicePayload {
    pub invoice_number: String,
    pub supplier: String,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub dpp: Decimal,
    pub ppn: Decimal,
    pub total: Decimal,
    pub remark: Option<String>,
    pub purchase_order_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentPayload {
    pub paid_at: NaiveDate,
    pub method: String,
    pub amount: Decimal,
}

/// The intake check: DPP + PPN must equal the invoice total.
fn check_header(payload: &InvoicePayload) -> Result<()> {
    let check = EntryRules::check_invoice_header(payload.dpp, payload.ppn, payload.total);
    if !check.is_accepted() {
        return Err(BackofficeError::Rejected {
            findings: check.findings,
        });
    }
    Ok(())
}

pub async fn list(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<InvoiceQuery>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let filter = InvoiceFilter {
        supplier: query.supplier,
        status: query.status,
        from: query.from,
        to: query.to,
        q: query.q,
    };
    let page = Page::clamped(query.limit, query.offset);
    let invoices = state.storage.list_invoices(tenant.0, &filter, page).await?;
    Ok(Json(serde_json::json!({ "invoices": invoices })))
}

pub async fn get(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let invoice = state
        .storage
        .get_invoice(tenant.0, id)
        .await?
        .ok_or(BackofficeError::NotFound("invoice"))?;
    Ok(Json(invoice))
}

pub async fn create(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(payload): Json<InvoicePayload>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    check_header(&payload)?;

    let mut invoice = VendorInvoice {
        id: None,
        company_id: tenant.0,
        invoice_number: payload.invoice_number,
        supplier: payload.supplier,
        invoice_date: payload.invoice_date,
        due_date: payload.due_date,
        dpp: payload.dpp,
        ppn: payload.ppn,
        total: payload.total,
        status: InvoiceStatus::Open,
        remark: payload.remark,
        purchase_order_id: payload.purchase_order_id,
        created_at: Utc::now(),
    };
    state.storage.create_invoice(&mut invoice).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn update(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<InvoicePayload>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let existing = state
        .storage
        .get_invoice(tenant.0, id)
        .await?
        .ok_or(BackofficeError::NotFound("invoice"))?;

    // Once money has moved against it the header amounts are frozen.
    if existing.status != InvoiceStatus::Open {
        return Err(BackofficeError::Validation(
            "an invoice with recorded payments cannot be edited".to_string(),
        ));
    }
    check_header(&payload)?;

    let invoice = VendorInvoice {
        id: existing.id,
        company_id: tenant.0,
        invoice_number: payload.invoice_number,
        supplier: payload.supplier,
        invoice_date: payload.invoice_date,
        due_date: payload.due_date,
        dpp: payload.dpp,
        ppn: payload.ppn,
        total: payload.total,
        status: existing.status,
        remark: payload.remark,
        purchase_order_id: payload.purchase_order_id,
        created_at: existing.created_at,
    };
    state.storage.update_invoice(&invoice).await?;
    Ok(Json(invoice))
}

pub async fn delete(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let invoice = state
        .storage
        .get_invoice(tenant.0, id)
        .await?
        .ok_or(BackofficeError::NotFound("invoice"))?;
    if invoice.status != InvoiceStatus::Open {
        return Err(BackofficeError::Validation(
            "an invoice with recorded payments cannot be deleted".to_string(),
        ));
    }
    state.storage.delete_invoice(tenant.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_payments(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    state
        .storage
        .get_invoice(tenant.0, id)
        .await?
        .ok_or(BackofficeError::NotFound("invoice"))?;
    let payments = state.storage.list_payments(tenant.0, id).await?;
    Ok(Json(serde_json::json!({ "payments": payments })))
}

/// Record a payment, splitting it across the outstanding DPP and PPN
/// components in proportion to what remains of each.
pub async fn record_payment(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentPayload>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let invoice = state
        .storage
        .get_invoice(tenant.0, id)
        .await?
        .ok_or(BackofficeError::NotFound("invoice"))?;

    let (paid_dpp, paid_ppn) = state.storage.paid_components(tenant.0, id).await?;
    let outstanding_dpp = invoice.dpp - paid_dpp;
    let outstanding_ppn = invoice.ppn - paid_ppn;

    let breakdown = allocate_payment(outstanding_dpp, outstanding_ppn, payload.amount)
        .map_err(|e| {
            metrics::payments::rejected();
            e
        })?;

    let settled = breakdown.dpp == outstanding_dpp && breakdown.ppn == outstanding_ppn;
    let new_status = if settled {
        InvoiceStatus::Paid
    } else {
        InvoiceStatus::PartiallyPaid
    };

    let mut payment = InvoicePayment {
        id: None,
        invoice_id: id,
        paid_at: payload.paid_at,
        method: payload.method,
        amount: payload.amount,
        allocations: breakdown.into_allocations(),
        created_at: Utc::now(),
    };
    state
        .storage
        .record_payment(tenant.0, &mut payment, new_status)
        .await?;

    metrics::payments::allocated();
    if settled {
        metrics::payments::invoice_settled();
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "payment": payment,
            "invoice_status": new_status,
        })),
    ))
}
