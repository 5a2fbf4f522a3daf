use super::{require_company, validate_entry, AppState, Tenant};
use crate::domain::{CashVoucher, JournalLine, VoucherKind};
use crate::error::{BackofficeError, Result};
use crate::storage::{Page, VoucherFilter};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct VoucherQuery {
    pub kind: Option<VoucherKind>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub q: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct VoucherPayload {
    pub kind: VoucherKind,
    pub voucher_date: NaiveDate,
    pub remark: Option<String>,
    pub lines: Vec<LinePayload>,
}

#[derive(Debug, Deserialize)]
pub struct LinePayload {
    pub account_code: String,
    pub memo: Option<String>,
    #[serde(default)]
    pub debit: Decimal,
    #[serde(default)]
    pub credit: Decimal,
}

impl LinePayload {
    fn into_line(self) -> JournalLine {
        JournalLine {
            account_code: self.account_code,
            memo: self.memo,
            debit: self.debit,
            credit: self.credit,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<VoucherQuery>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let filter = VoucherFilter {
        kind: query.kind,
        from: query.from,
        to: query.to,
        q: query.q,
    };
    let page = Page::clamped(query.limit, query.offset);
    let vouchers = state.storage.list_vouchers(tenant.0, &filter, page).await?;
    Ok(Json(serde_json::json!({ "vouchers": vouchers })))
}

pub async fn get(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let voucher = state
        .storage
        .get_voucher(tenant.0, id)
        .await?
        .ok_or(BackofficeError::NotFound("voucher"))?;
    Ok(Json(voucher))
}

pub async fn create(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(payload): Json<VoucherPayload>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let lines: Vec<JournalLine> = payload.lines.into_iter().map(LinePayload::into_line).collect();
    let warnings = validate_entry(&state, tenant.0, &lines).await?;

    let mut voucher = CashVoucher {
        id: None,
        company_id: tenant.0,
        number: None,
        kind: payload.kind,
        voucher_date: payload.voucher_date,
        remark: payload.remark,
        lines,
        created_at: Utc::now(),
    };
    state.storage.create_voucher(&mut voucher).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "voucher": voucher, "warnings": warnings })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoucherPayload>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let existing = state
        .storage
        .get_voucher(tenant.0, id)
        .await?
        .ok_or(BackofficeError::NotFound("voucher"))?;

    let lines: Vec<JournalLine> = payload.lines.into_iter().map(LinePayload::into_line).collect();
    let warnings = validate_entry(&state, tenant.0, &lines).await?;

    let voucher = CashVoucher {
        id: existing.id,
        company_id: tenant.0,
        number: existing.number,
        kind: payload.kind,
        voucher_date: payload.voucher_date,
        remark: payload.remark,
        lines,
        created_at: existing.created_at,
    };
    state.storage.update_voucher(&voucher).await?;
    Ok(Json(serde_json::json!({ "voucher": voucher, "warnings": warnings })))
}

pub async fn delete(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    state.storage.delete_voucher(tenant.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
