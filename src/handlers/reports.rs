use super::{require_company, AppState, Tenant};
use crate::app::profit_loss;
use crate::error::{BackofficeError, Result};
use crate::observability::metrics;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl PeriodQuery {
    fn bounds(&self) -> Result<(NaiveDate, NaiveDate)> {
        let (from, to) = match (self.from, self.to) {
            (Some(from), Some(to)) => (from, to),
            _ => {
                return Err(BackofficeError::Validation(
                    "both 'from' and 'to' dates are required".to_string(),
                ))
            }
        };
        if from > to {
            return Err(BackofficeError::Validation(
                "'from' must not be after 'to'".to_string(),
            ));
        }
        Ok((from, to))
    }
}

pub async fn trial_balance(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let (from, to) = query.bounds()?;

    let accounts = state.storage.list_accounts(tenant.0).await?;
    let movement = state.storage.account_movement(tenant.0, from, to).await?;
    let rows = profit_loss::trial_balance(&accounts, &movement);

    metrics::reports::trial_balance_built();
    Ok(Json(serde_json::json!({
        "from": from,
        "to": to,
        "rows": rows,
    })))
}

pub async fn profit_and_loss(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;
    let (from, to) = query.bounds()?;

    let accounts = state.storage.list_accounts(tenant.0).await?;
    let movement = state.storage.account_movement(tenant.0, from, to).await?;
    let rows = profit_loss::trial_balance(&accounts, &movement);
    let statement = profit_loss::income_statement(from, to, &rows);

    metrics::reports::income_statement_built();
    Ok(Json(statement))
}
