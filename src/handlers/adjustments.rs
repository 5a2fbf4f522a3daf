use super::{require_company, validate_entry, AppState, Tenant};
use crate::domain::{AdjustmentJournal, JournalLine};
use crate::error::{BackofficeError, Result};
use crate::storage::{AdjustmentFilter, Page};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AdjustmentQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub q: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustmentPayload {
    pub journal_date: NaiveDate,
    pub memo: Option<String>,
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
    Query(query): Query<AdjustmentQuery>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let filter = AdjustmentFilter {
        from: query.from,
        to: query.to,
        q: query.q,
    };
    let page = Page::clamped(query.limit, query.offset);
    let adjustments = state
        .storage
        .list_adjustments(tenant.0, &filter, page)
        .await?;
    Ok(Json(serde_json::json!({ "adjustments": adjustments })))
}

pub async fn get(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let journal = state
        .storage
        .get_adjustment(tenant.0, id)
        .await?
        .ok_or(BackofficeError::NotFound("adjustment journal"))?;
    Ok(Json(journal))
}

pub async fn create(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(payload): Json<AdjustmentPayload>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let lines: Vec<JournalLine> = payload.lines.into_iter().map(LinePayload::into_line).collect();
    let warnings = validate_entry(&state, tenant.0, &lines).await?;

    let mut journal = AdjustmentJournal {
        id: None,
        company_id: tenant.0,
        number: None,
        journal_date: payload.journal_date,
        memo: payload.memo,
        lines,
        created_at: Utc::now(),
    };
    state.storage.create_adjustment(&mut journal).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "adjustment": journal, "warnings": warnings })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustmentPayload>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let existing = state
        .storage
        .get_adjustment(tenant.0, id)
        .await?
        .ok_or(BackofficeError::NotFound("adjustment journal"))?;

    let lines: Vec<JournalLine> = payload.lines.into_iter().map(LinePayload::into_line).collect();
    let warnings = validate_entry(&state, tenant.0, &lines).await?;

    let journal = AdjustmentJournal {
        id: existing.id,
        company_id: tenant.0,
        number: existing.number,
        journal_date: payload.journal_date,
        memo: payload.memo,
        lines,
        created_at: existing.created_at,
    };
    state.storage.update_adjustment(&journal).await?;
    Ok(Json(serde_json::json!({ "adjustment": journal, "warnings": warnings })))
}

pub async fn delete(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    state.storage.delete_adjustment(tenant.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
