use super::{require_company, AppState, Tenant};
use crate::app::suggestion::MemoRecord;
use crate::error::Result;
use crate::observability::metrics;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    pub remark: String,
}

/// Rank the tenant's accounts by remark similarity against its recent
/// journal memos.
pub async fn suggest(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<SuggestionQuery>,
) -> Result<impl IntoResponse> {
    require_company(&state, tenant).await?;

    let history: Vec<MemoRecord> = state
        .storage
        .recent_journal_memos(tenant.0, state.suggester.corpus_limit())
        .await?
        .into_iter()
        .map(|(account_code, memo)| MemoRecord { account_code, memo })
        .collect();

    let account_names: HashMap<String, String> = state
        .storage
        .list_accounts(tenant.0)
        .await?
        .into_iter()
        .map(|account| (account.code, account.name))
        .collect();

    let suggestions = state
        .suggester
        .suggest(&query.remark, &history, &account_names);

    metrics::suggestions::queried();
    if let Some(best) = suggestions.first() {
        metrics::suggestions::score_recorded(best.score);
        if best.auto_apply {
            metrics::suggestions::auto_apply();
        }
    }

    Ok(Json(serde_json::json!({ "suggestions": suggestions })))
}
