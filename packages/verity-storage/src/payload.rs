use std::collections::HashMap;

use qdrant_client::qdrant::{PointId, ScoredPoint, Value, point_id::PointIdOptions, value::Kind};
use serde_json::{Map, Number, Value as JsonValue};

/// Payload field holding the stable evidence key written by the indexer.
pub const KEY_FIELD: &str = "key";
/// Payload field holding the evidence text.
pub const TEXT_FIELD: &str = "text";

/// Stable key of a point: the payload `key` when present and non-blank, else the point id.
pub fn point_key(point: &ScoredPoint) -> Option<String> {
	payload_string(&point.payload, KEY_FIELD)
		.filter(|key| !key.trim().is_empty())
		.or_else(|| point.id.as_ref().and_then(point_id_to_string))
}

pub fn point_id_to_string(point_id: &PointId) -> Option<String> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Some(id.clone()),
		Some(PointIdOptions::Num(id)) => Some(id.to_string()),
		None => None,
	}
}

pub fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}

/// Converts a point payload into a JSON object, keeping every field.
pub fn payload_to_json(payload: &HashMap<String, Value>) -> Map<String, JsonValue> {
	let mut keys: Vec<&String> = payload.keys().collect();

	keys.sort();

	keys.into_iter().map(|key| (key.clone(), value_to_json(&payload[key]))).collect()
}

pub fn value_to_json(value: &Value) -> JsonValue {
	match &value.kind {
		None | Some(Kind::NullValue(_)) => JsonValue::Null,
		Some(Kind::BoolValue(flag)) => JsonValue::Bool(*flag),
		Some(Kind::IntegerValue(number)) => JsonValue::from(*number),
		Some(Kind::DoubleValue(number)) =>
			Number::from_f64(*number).map(JsonValue::Number).unwrap_or(JsonValue::Null),
		Some(Kind::StringValue(text)) => JsonValue::String(text.clone()),
		Some(Kind::ListValue(list)) =>
			JsonValue::Array(list.values.iter().map(value_to_json).collect()),
		Some(Kind::StructValue(inner)) => JsonValue::Object(payload_to_json(&inner.fields)),
	}
}
