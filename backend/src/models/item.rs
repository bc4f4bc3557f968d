use axum::http::{header, HeaderMap};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::Fields;
use crate::error::{AppError, AppResult};

pub const JSON_CONTENT_TYPE: &str = "application/json";

const INVALID_PAYLOAD: &str = "JSON is invalid, or missing property item or quantity";

// ── Query parameters ──────────────────────────────────────────────────────────

/// First `item` value in the query string. Repeats are ignored.
pub fn item_param(params: Vec<(String, String)>) -> Option<String> {
    params
        .into_iter()
        .find(|(key, _)| key == "item")
        .map(|(_, value)| value)
}

// ── Request payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawPayload {
    item: Option<String>,
    quantity: Option<i64>,
}

/// Body of a create or update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuantity {
    pub item: String,
    pub quantity: i64,
}

impl ItemQuantity {
    /// The only field an item document carries.
    pub fn fields(&self) -> Fields {
        quantity_fields(self.quantity)
    }
}

pub fn quantity_fields(quantity: i64) -> Fields {
    let mut fields = Fields::new();
    fields.insert("quantity".to_string(), json!(quantity));
    fields
}

/// Extracts `item` and `quantity`; both are required.
pub fn parse_item_quantity(headers: &HeaderMap, body: &[u8]) -> AppResult<ItemQuantity> {
    let raw = parse_payload(headers, body)?;
    match (raw.item, raw.quantity) {
        (Some(item), Some(quantity)) => Ok(ItemQuantity { item, quantity }),
        _ => Err(AppError::Validation(INVALID_PAYLOAD.to_string())),
    }
}

/// Extracts `item` alone; `quantity` is ignored if present.
pub fn parse_item(headers: &HeaderMap, body: &[u8]) -> AppResult<String> {
    parse_payload(headers, body)?
        .item
        .ok_or_else(|| AppError::Validation(INVALID_PAYLOAD.to_string()))
}

fn parse_payload(headers: &HeaderMap, body: &[u8]) -> AppResult<RawPayload> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default();
    if content_type != JSON_CONTENT_TYPE {
        return Err(AppError::ContentType(content_type));
    }

    let invalid = || AppError::Validation(INVALID_PAYLOAD.to_string());

    let value: Value = serde_json::from_slice(body).map_err(|_| invalid())?;
    if !value.is_object() {
        return Err(invalid());
    }
    let mut raw: RawPayload = serde_json::from_value(value).map_err(|_| invalid())?;

    // An empty name can never be a document key.
    if raw.item.as_deref().is_some_and(str::is_empty) {
        raw.item = None;
    }
    Ok(raw)
}
