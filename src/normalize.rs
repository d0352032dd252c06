//! Reduces raw SportMonks payloads to the field sets the frontend relies on.
//!
//! Only the large reference collections are projected; everything else is
//! passed through untouched.

use serde_json::{json, Map, Value};

use crate::error::FetchError;
use crate::resources::{Normalization, ResourceType};

/// A single cached record.
pub type Record = Value;

const MISSING_POSITION: &str = "N/A";

/// Extract the `data` collection from an upstream payload and normalize it for
/// the given resource.
pub fn normalize(resource: ResourceType, payload: &Value) -> Result<Vec<Record>, FetchError> {
    let raw = extract_collection(payload)?;

    let records = match resource.normalization() {
        Normalization::Identity => raw,
        Normalization::Country => raw.iter().map(project_country).collect(),
        Normalization::Team => raw.iter().map(project_team).collect(),
        Normalization::Player => raw.iter().map(project_player).collect(),
    };
    Ok(records)
}

fn extract_collection(payload: &Value) -> Result<Vec<Value>, FetchError> {
    let Some(obj) = payload.as_object() else {
        return Err(FetchError::Malformed("payload is not a JSON object".into()));
    };
    match obj.get("data") {
        Some(Value::Array(items)) => Ok(items.clone()),
        // Single-entity endpoints answer with an object
        Some(Value::Object(_)) => Ok(vec![obj["data"].clone()]),
        Some(Value::Null) => Ok(vec![]),
        Some(other) => Err(FetchError::Malformed(format!(
            "unexpected `data` type: {}",
            type_name(other)
        ))),
        None => Err(FetchError::Malformed("payload has no `data` field".into())),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn pick(raw: &Value, fields: &[&str]) -> Map<String, Value> {
    fields
        .iter()
        .map(|f| (f.to_string(), raw.get(*f).cloned().unwrap_or(Value::Null)))
        .collect()
}

fn project_country(raw: &Value) -> Record {
    Value::Object(pick(raw, &["id", "name"]))
}

fn project_team(raw: &Value) -> Record {
    Value::Object(pick(
        raw,
        &["id", "name", "code", "image_path", "country_id"],
    ))
}

fn project_player(raw: &Value) -> Record {
    let mut out = pick(
        raw,
        &[
            "id",
            "fullname",
            "firstname",
            "lastname",
            "dateofbirth",
            "gender",
            "battingstyle",
            "bowlingstyle",
        ],
    );

    // `position` is an include; a bare player or an empty name falls back
    let position = raw
        .get("position")
        .and_then(|p| p.get("name"))
        .and_then(|n| n.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(MISSING_POSITION);
    out.insert("position".into(), json!(position));
    out.insert(
        "country_id".into(),
        raw.get("country_id").cloned().unwrap_or(Value::Null),
    );
    out.insert(
        "image_path".into(),
        raw.get("image_path").cloned().unwrap_or(Value::Null),
    );
    Value::Object(out)
}
