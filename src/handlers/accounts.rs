use super::{require_company, AppState, Tenant};
use crate::domain::{Account, AccountClass};
use crate::error::{BackofficeError, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AccountPayload {
    pub code: String,
    pub name: String,
    pub class: AccountClass,
}

pub async fn list(State(state): State<AppState>, tenant: Tenant) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let accounts = state.storage.list_accounts(tenant.0).await?;
    Ok(Json(serde_json::json!({ "accounts": accounts })))
}

pub async fn get(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let account = state
        .storage
        .get_account(tenant.0, &code)
        .await?
        .ok_or(BackofficeError::NotFound("account"))?;
    Ok(Json(account))
}

pub async fn create(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(payload): Json<AccountPayload>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    if payload.code.trim().is_empty() {
        return Err(BackofficeError::Validation(
            "account code must not be empty".to_string(),
        ));
    }

    let mut account = Account {
        id: None,
        company_id: tenant.0,
        code: payload.code.trim().to_string(),
        name: payload.name,
        class: payload.class,
        normal_balance: payload.class.normal_balance(),
    };
    state.storage.upsert_account(&mut account).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Rename/reclassify an existing account. The code in the path wins over
/// whatever the payload carries.
pub async fn update(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(code): Path<String>,
    Json(payload): Json<AccountPayload>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    state
        .storage
        .get_account(tenant.0, &code)
        .await?
        .ok_or(BackofficeError::NotFound("account"))?;

    let mut account = Account {
        id: None,
        company_id: tenant.0,
        code,
        name: payload.name,
        class: payload.class,
        normal_balance: payload.class.normal_balance(),
    };
    state.storage.upsert_account(&mut account).await?;
    Ok(Json(account))
}
