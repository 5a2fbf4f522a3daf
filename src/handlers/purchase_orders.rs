use super::{require_company, AppState, Tenant};
use crate::domain::{PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus};
use crate::error::{BackofficeError, Result};
use crate::storage::{Page, PurchaseOrderFilter};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct PurchaseOrderQuery {
    pub supplier: Option<String>,
    pub status: Option<PurchaseOrderStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub q: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseOrderPayload {
    pub supplier: String,
    pub order_date: NaiveDate,
    #[serde(default = "default_status")]
    pub status: PurchaseOrderStatus,
    pub remark: Option<String>,
    pub lines: Vec<LinePayload>,
}

fn default_status() -> PurchaseOrderStatus {
    PurchaseOrderStatus::Draft
}

#[derive(Debug, Deserialize)]
pub struct LinePayload {
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// Line amounts are always derived server-side: quantity × unit price,
/// rounded to cents.
fn build_lines(payloads: Vec<LinePayload>) -> Result<Vec<PurchaseOrderLine>> {
    if payloads.is_empty() {
        return Err(BackofficeError::Validation(
            "a purchase order needs at least one line".to_string(),
        ));
    }

    payloads
        .into_iter()
        .map(|line| {
            if line.item_name.trim().is_empty() {
                return Err(BackofficeError::Validation(
                    "line item name must not be empty".to_string(),
                ));
            }
            if line.quantity <= Decimal::ZERO {
                return Err(BackofficeError::Validation(
                    "line quantity must be positive".to_string(),
                ));
            }
            if line.unit_price < Decimal::ZERO {
                return Err(BackofficeError::Validation(
                    "line unit price must not be negative".to_string(),
                ));
            }
            let amount = (line.quantity * line.unit_price)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            Ok(PurchaseOrderLine {
                item_name: line.item_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                amount,
            })
        })
        .collect()
}

pub async fn list(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<PurchaseOrderQuery>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let filter = PurchaseOrderFilter {
        supplier: query.supplier,
        status: query.status,
        from: query.from,
        to: query.to,
        q: query.q,
    };
    let page = Page::clamped(query.limit, query.offset);
    let orders = state
        .storage
        .list_purchase_orders(tenant.0, &filter, page)
        .await?;
    Ok(Json(serde_json::json!({ "purchase_orders": orders })))
}

pub async fn get(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let order = state
        .storage
        .get_purchase_order(tenant.0, id)
        .await?
        .ok_or(BackofficeError::NotFound("purchase order"))?;
    Ok(Json(order))
}

pub async fn create(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(payload): Json<PurchaseOrderPayload>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let mut order = PurchaseOrder {
        id: None,
        company_id: tenant.0,
        po_number: None,
        supplier: payload.supplier,
        order_date: payload.order_date,
        status: payload.status,
        remark: payload.remark,
        lines: build_lines(payload.lines)?,
        created_at: Utc::now(),
    };
    state.storage.create_purchase_order(&mut order).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn update(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<PurchaseOrderPayload>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let existing = state
        .storage
        .get_purchase_order(tenant.0, id)
        .await?
        .ok_or(BackofficeError::NotFound("purchase order"))?;

    let order = PurchaseOrder {
        id: existing.id,
        company_id: tenant.0,
        po_number: existing.po_number,
        supplier: payload.supplier,
        order_date: payload.order_date,
        status: payload.status,
        remark: payload.remark,
        lines: build_lines(payload.lines)?,
        created_at: existing.created_at,
    };
    state.storage.update_purchase_order(&order).await?;
    Ok(Json(order))
}

pub async fn delete(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    state.storage.delete_purchase_order(tenant.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
