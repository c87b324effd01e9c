use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::auth::ServerState;
use crate::errors::ApiError;

#[derive(Deserialize, Debug)]
pub struct KeyQuery {
    #[serde(default)]
    pub key: Option<String>,
}

impl KeyQuery {
    fn require(self) -> Result<String, ApiError> {
        match self.key {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ApiError::bad_request("key is required")),
        }
    }
}

/// Apply each field of the body object as an independent set. There is no
/// rollback: when a later pair fails, earlier pairs stay applied and
/// persisted, and the response names the failing key.
pub async fn set_entries(
    State(state): State<ServerState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let entries = body
        .as_object()
        .ok_or_else(|| ApiError::bad_request("request body must be a JSON object"))?;

    for (key, value) in entries {
        state
            .engine
            .set(key, value)
            .await
            .map_err(|e| ApiError::internal(format!("set {}: {}", key, e)))?;
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

/// Look up one key and return its stored payload verbatim.
pub async fn get_entry(
    State(state): State<ServerState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<Value>, ApiError> {
    let key = query.require()?;
    let value: Value = state.engine.get(&key).await?;
    Ok(Json(value))
}

/// Delete one key; deleting an absent key succeeds.
pub async fn delete_entry(
    State(state): State<ServerState>,
    Query(query): Query<KeyQuery>,
) -> Result<StatusCode, ApiError> {
    let key = query.require()?;
    state.engine.delete(&key).await?;
    Ok(StatusCode::OK)
}

/// Drop every stored entry.
pub async fn delete_all_entries(
    State(state): State<ServerState>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_all().await?;
    Ok(StatusCode::OK)
}
