use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::{
    db::{Fields, StoreError},
    error::{AppError, AppResult},
    models::{item_param, parse_item, parse_item_quantity},
    AppState,
};

// ── Read ──────────────────────────────────────────────────────────────────────

pub async fn read(
    State(state): State<AppState>,
    method: Method,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Response> {
    require_method(&method, Method::GET)?;
    info!("GET request received");

    let Some(item) = item_param(params) else {
        info!("Get all items");
        let docs = state.items.stream().await?;
        info!(count = docs.len(), "Found items");

        let entries: Vec<Value> = docs
            .into_iter()
            .map(|doc| {
                let mut entry = Fields::new();
                entry.insert(doc.key, Value::Object(doc.fields));
                Value::Object(entry)
            })
            .collect();
        return Ok((StatusCode::OK, Json(Value::Array(entries))).into_response());
    };

    info!(item = %item, "Item requested");
    match state.items.get(&item).await? {
        Some(doc) => {
            info!(item = %item, fields = ?doc.fields, "Item found");
            Ok((StatusCode::OK, Json(Value::Object(doc.fields))).into_response())
        }
        None => {
            info!(item = %item, "Item not found");
            Err(AppError::NotFound(format!("Item not found {item}")))
        }
    }
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    require_method(&method, Method::POST)?;
    info!("POST request received");

    let payload = parse_item_quantity(&headers, &body)?;

    if state.items.exists(&payload.item).await? {
        info!(item = %payload.item, "Item already exists, ignoring");
        return Err(already_exists(&payload.item));
    }

    info!(item = %payload.item, quantity = payload.quantity, "Adding item");
    state
        .items
        .create(&payload.item, payload.fields())
        .await
        .map_err(|err| match err {
            StoreError::AlreadyExists { .. } => already_exists(&payload.item),
            other => other.into(),
        })?;

    let stored = reread(&state, &payload.item).await?;
    Ok((StatusCode::CREATED, Json(Value::Object(stored))).into_response())
}

// ── Update ────────────────────────────────────────────────────────────────────

pub async fn update(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    require_method(&method, Method::PUT)?;
    info!("PUT request received");

    let payload = parse_item_quantity(&headers, &body)?;

    info!(item = %payload.item, quantity = payload.quantity, "Updating item");
    state
        .items
        .update(&payload.item, payload.fields())
        .await
        .map_err(not_found_as_404)?;

    let stored = reread(&state, &payload.item).await?;
    Ok((StatusCode::OK, Json(Value::Object(stored))).into_response())
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    require_method(&method, Method::DELETE)?;
    info!("DELETE request received");

    let item = parse_item(&headers, &body)?;

    state.items.delete(&item).await.map_err(not_found_as_404)?;
    info!(item = %item, "Item deleted");

    Ok((StatusCode::OK, "OK").into_response())
}

/// Fallback for verbs the `/items` route does not map to an operation.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn require_method(actual: &Method, expected: Method) -> AppResult<()> {
    if *actual != expected {
        return Err(AppError::MethodNotAllowed);
    }
    Ok(())
}

fn already_exists(item: &str) -> AppError {
    AppError::Conflict(format!("Item already exists {item}"))
}

fn not_found_as_404(err: StoreError) -> AppError {
    match err {
        StoreError::NotFound { .. } => AppError::NotFound(format!("Error {err}")),
        other => other.into(),
    }
}

async fn reread(state: &AppState, item: &str) -> AppResult<Fields> {
    state
        .items
        .get(item)
        .await?
        .map(|doc| doc.fields)
        .ok_or_else(|| AppError::NotFound(format!("Item not found {item}")))
}
