// ── API → domain conversion ──
//
// PRTG table rows are JSON maps whose column set depends on the request.
// Built-in columns (`objid`, `parentid`, `name`) become typed fields;
// everything else becomes a property, typed by the `PropertySchema`.

use prtgly_api::TableRow;
use serde_json::Value;

use crate::error::CoreError;
use crate::model::{ContentType, Entity, ObjectId, PropertySchema};

/// Columns that map to typed `Entity` fields rather than properties.
const BUILTIN_COLUMNS: &[&str] = &["objid", "parentid", "name"];

/// Convert one table row into an entity of the given content type.
pub fn entity_from_row(
    row: &TableRow,
    content_type: ContentType,
    schema: &PropertySchema,
) -> Result<Entity, CoreError> {
    let id = row
        .get("objid")
        .and_then(object_id)
        .ok_or_else(|| CoreError::Internal(format!("{content_type} row without objid")))?;

    let name = row.get("name").and_then(text).unwrap_or_default();
    let mut entity = Entity::new(id, content_type, name);
    entity.parent_id = row.get("parentid").and_then(object_id);

    for (column, value) in row {
        // `_raw` twins duplicate the display columns.
        if BUILTIN_COLUMNS.contains(&column.as_str()) || column.ends_with("_raw") {
            continue;
        }
        if let Some(raw) = text(value) {
            entity
                .properties
                .insert(column.clone(), schema.value_for(column, &raw));
        }
    }

    Ok(entity)
}

/// Scalar JSON value as a string; `null` and containers are skipped.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Object ids arrive as numbers or numeric strings.
fn object_id(value: &Value) -> Option<ObjectId> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Flatten a status payload into displayable strings.
pub fn status_from_payload(
    payload: prtgly_api::StatusPayload,
) -> std::collections::BTreeMap<String, String> {
    payload
        .into_iter()
        .map(|(k, v)| {
            let s = text(&v).unwrap_or_else(|| if v.is_null() { String::new() } else { v.to_string() });
            (k, s)
        })
        .collect()
}
