// --------------------------------------------------
// Handles API endpoints for saved custom views and the
// notification configuration.
// -------------------------------------------------

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
};

use crate::AppState;
use crate::error::{ApplicationError, Result};
use crate::models::{CustomView, NotifyConfig};

// -----------------------------
// GET /api/views
// Returns every saved view by name
// -----------------------------
pub async fn list_views(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, CustomView>>> {
    Ok(Json(state.store.load_views()?))
}

// -----------------------------
// PUT /api/views/:name
// Saves (or replaces) a named view
// -----------------------------
pub async fn put_view(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(view): Json<CustomView>,
) -> Result<Json<CustomView>> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ApplicationError::BadRequest("view name required".into()));
    }

    let mut views = state.store.load_views()?;
    views.insert(name, view.clone());
    state.store.save_views(&views)?;

    Ok(Json(view))
}

// -----------------------------
// DELETE /api/views/:name
// -----------------------------
pub async fn delete_view(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let mut views = state.store.load_views()?;

    if views.remove(&name).is_none() {
        return Err(ApplicationError::NotFound("view"));
    }

    state.store.save_views(&views)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

// -----------------------------
// GET /api/config
// Returns the notification configuration
// -----------------------------
pub async fn get_config(State(state): State<AppState>) -> Result<Json<NotifyConfig>> {
    let config = state
        .notify
        .read()
        .map_err(|_| ApplicationError::Internal)?
        .clone();
    Ok(Json(config))
}

// -----------------------------
// PUT /api/config
// Replaces the notification configuration wholesale; the running
// scheduler sees the new value on its next cycle
// -----------------------------
pub async fn put_config(
    State(state): State<AppState>,
    Json(config): Json<NotifyConfig>,
) -> Result<Json<NotifyConfig>> {
    state.store.save_notify_config(&config)?;

    let mut shared = state
        .notify
        .write()
        .map_err(|_| ApplicationError::Internal)?;
    *shared = config.clone();

    Ok(Json(config))
}
