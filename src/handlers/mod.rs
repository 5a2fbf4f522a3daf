//! JSON handlers behind the row-level endpoints. Everything except the
//! company listing resolves the active tenant before touching a table.

pub mod accounts;
pub mod adjustments;
pub mod companies;
pub mod invoices;
pub mod purchase_orders;
pub mod reports;
pub mod suggestions;
pub mod vouchers;

use crate::app::rules::{EntryRules, Finding};
use crate::app::suggestion::AccountSuggester;
use crate::domain::{Company, JournalLine};
use crate::error::{BackofficeError, Result};
use crate::observability::metrics;
use crate::storage::Storage;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub suggester: Arc<AccountSuggester>,
}

/// The active company, taken from the `X-Company-Id` header or the
/// `company_id` cookie the tenant picker sets.
#[derive(Debug, Clone, Copy)]
pub struct Tenant(pub i64);

fn resolve_tenant(headers: &HeaderMap) -> Result<i64> {
    if let Some(raw) = headers.get("X-Company-Id").and_then(|v| v.to_str().ok()) {
        return raw
            .trim()
            .parse()
            .map_err(|_| BackofficeError::TenantRequired);
    }

    if let Some(cookies) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
        for pair in cookies.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                if name == "company_id" {
                    return value
                        .trim()
                        .parse()
                        .map_err(|_| BackofficeError::TenantRequired);
                }
            }
        }
    }

    Err(BackofficeError::TenantRequired)
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = BackofficeError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        resolve_tenant(&parts.headers).map(Tenant)
    }
}

/// Confirm the tenant actually exists before handlers run their queries.
pub async fn require_company(state: &AppState, tenant: Tenant) -> Result<Company> {
    state
        .storage
        .get_company(tenant.0)
        .await?
        .ok_or(BackofficeError::NotFound("company"))
}

/// Run the journal-entry rules for the tenant's chart. A rejection becomes
/// an error; warnings come back so the response can surface them.
pub async fn validate_entry(
    state: &AppState,
    company_id: i64,
    lines: &[JournalLine],
) -> Result<Vec<Finding>> {
    let accounts = state.storage.list_accounts(company_id).await?;
    let rules = EntryRules::new(accounts.into_iter().map(|account| account.code));
    let check = rules.check_lines(lines);

    metrics::vouchers::findings(check.findings.len());
    if !check.is_accepted() {
        metrics::vouchers::rejected();
        return Err(BackofficeError::Rejected {
            findings: check.findings,
        });
    }
    metrics::vouchers::accepted();
    Ok(check.findings)
}

impl IntoResponse for BackofficeError {
    fn into_response(self) -> Response {
        let status = match &self {
            BackofficeError::NotFound(_) => StatusCode::NOT_FOUND,
            BackofficeError::TenantRequired => StatusCode::BAD_REQUEST,
            BackofficeError::Validation(_) | BackofficeError::Rejected { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match self {
            BackofficeError::Rejected { findings } => serde_json::json!({
                "error": "entry rejected",
                "findings": findings,
            }),
            other => serde_json::json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Company-Id", HeaderValue::from_static("7"));
        headers.insert(header::COOKIE, HeaderValue::from_static("company_id=9"));
        assert_eq!(resolve_tenant(&headers).unwrap(), 7);
    }

    #[test]
    fn cookie_is_parsed_from_the_jar() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; company_id=42; lang=id"),
        );
        assert_eq!(resolve_tenant(&headers).unwrap(), 42);
    }

    #[test]
    fn missing_tenant_is_an_error() {
        let headers = HeaderMap::new();
        assert!(resolve_tenant(&headers).is_err());
    }

    #[test]
    fn garbage_tenant_is_an_error() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Company-Id", HeaderValue::from_static("acme"));
        assert!(resolve_tenant(&headers).is_err());
    }
}
