use super::AppState;
use crate::error::Result;
use axum::extract::State;
use axum::Json;

/// The only tenant-free listing: the picker the client uses to choose a
/// company before anything else.
pub async fn list(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let companies = state.storage.list_companies().await?;
    Ok(Json(serde_json::json!({ "companies": companies })))
}
