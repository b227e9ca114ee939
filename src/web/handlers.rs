//! HTTP request handlers.

use super::AppState;
use crate::settings::{keys, validate_field, CountdownSettings};
use crate::timezones::timezone_options;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// Settings surface
// ============================================================================

pub async fn handle_get_settings(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.snapshot())
}

#[derive(Debug, Serialize)]
pub struct FieldResponse {
    pub key: String,
    pub value: Value,
}

pub async fn handle_get_field(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    let Some(default) = CountdownSettings::default_value(&key) else {
        return (StatusCode::NOT_FOUND, "Unknown settings key").into_response();
    };

    let value = state.store.get(&key).unwrap_or(default);
    Json(FieldResponse { key, value }).into_response()
}

pub async fn handle_put_field(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> impl IntoResponse {
    if CountdownSettings::default_value(&key).is_none() {
        return (StatusCode::NOT_FOUND, "Unknown settings key").into_response();
    }

    match validate_field(&key, value) {
        Ok(normalized) => {
            state.store.set(&key, normalized.clone());
            tracing::info!("Settings: {} updated", key);
            Json(FieldResponse {
                key,
                value: normalized,
            })
            .into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, e).into_response(),
    }
}

pub async fn handle_get_timezones() -> impl IntoResponse {
    Json(timezone_options(Utc::now()))
}

// ============================================================================
// Render surface
// ============================================================================

pub async fn handle_get_render(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.renderer.snapshot())
}

pub async fn handle_get_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.media.get_by_id(&id).await {
        Some(media) => Json(media).into_response(),
        None => (StatusCode::NOT_FOUND, "Media not found").into_response(),
    }
}

// ============================================================================
// Service status
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub scope: &'static str,
    pub key_count: i64,
    pub field_count: usize,
    pub uptime_seconds: i64,
}

pub async fn handle_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        scope: state.store.scope().as_str(),
        key_count: state.store.key_count(),
        field_count: keys::ALL.len(),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
    })
}
