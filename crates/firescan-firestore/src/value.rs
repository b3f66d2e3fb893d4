//! Firestore typed values and their plain-JSON rendering.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Number, Value};

use firescan_core::{Error, Result};

/// A field value as encoded by the Firestore REST API.
///
/// Every value is a single-key object naming its type, e.g.
/// `{"integerValue": "42"}` or `{"mapValue": {"fields": {...}}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FirestoreValue {
    NullValue(()),
    BooleanValue(bool),
    /// 64-bit integers travel as strings.
    IntegerValue(Value),
    /// Non-finite doubles travel as `"NaN"`, `"Infinity"`, `"-Infinity"`.
    DoubleValue(Value),
    TimestampValue(String),
    StringValue(String),
    /// Base64-encoded bytes.
    BytesValue(String),
    /// Full resource name of the referenced document.
    ReferenceValue(String),
    GeoPointValue(LatLng),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LatLng {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<FirestoreValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, FirestoreValue>,
}

impl FirestoreValue {
    /// Parse a timestamp value; `None` for every other type.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FirestoreValue::TimestampValue(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|ts| ts.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// Return the integer payload, accepting both string and number forms.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FirestoreValue::IntegerValue(Value::String(s)) => s.parse().ok(),
            FirestoreValue::IntegerValue(Value::Number(n)) => n.as_i64(),
            _ => None,
        }
    }

    /// Convert to plain JSON.
    ///
    /// Timestamps become RFC 3339 strings, references become document
    /// paths, geo points become `{"latitude", "longitude"}` objects.
    pub fn to_json(&self) -> Result<Value> {
        Ok(match self {
            FirestoreValue::NullValue(()) => Value::Null,
            FirestoreValue::BooleanValue(b) => Value::Bool(*b),
            FirestoreValue::IntegerValue(_) => {
                let n = self
                    .as_integer()
                    .ok_or_else(|| Error::decode(format!("invalid integerValue: {:?}", self)))?;
                Value::Number(n.into())
            }
            FirestoreValue::DoubleValue(Value::Number(n)) => Value::Number(n.clone()),
            FirestoreValue::DoubleValue(Value::String(s)) => match s.parse::<f64>() {
                Ok(f) => Number::from_f64(f)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(s.clone())),
                Err(_) => Value::String(s.clone()),
            },
            FirestoreValue::DoubleValue(other) => {
                return Err(Error::decode(format!("invalid doubleValue: {}", other)));
            }
            FirestoreValue::TimestampValue(s) => match DateTime::parse_from_rfc3339(s) {
                Ok(ts) => Value::String(
                    ts.with_timezone(&Utc)
                        .to_rfc3339_opts(SecondsFormat::AutoSi, true),
                ),
                Err(_) => Value::String(s.clone()),
            },
            FirestoreValue::StringValue(s) => Value::String(s.clone()),
            FirestoreValue::BytesValue(s) => Value::String(s.clone()),
            FirestoreValue::ReferenceValue(name) => {
                Value::String(document_path(name).unwrap_or(name).to_string())
            }
            FirestoreValue::GeoPointValue(point) => {
                let mut map = Map::new();
                map.insert("latitude".to_string(), json_f64(point.latitude));
                map.insert("longitude".to_string(), json_f64(point.longitude));
                Value::Object(map)
            }
            FirestoreValue::ArrayValue(array) => Value::Array(
                array
                    .values
                    .iter()
                    .map(FirestoreValue::to_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            FirestoreValue::MapValue(map) => Value::Object(fields_to_json(&map.fields)?),
        })
    }
}

/// Convert a document's field map to a plain JSON object.
pub fn fields_to_json(fields: &BTreeMap<String, FirestoreValue>) -> Result<Map<String, Value>> {
    fields
        .iter()
        .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
        .collect()
}

/// Strip `projects/<p>/databases/<d>/documents/` from a resource name.
pub fn document_path(name: &str) -> Option<&str> {
    name.split_once("/documents/").map(|(_, path)| path)
}

fn json_f64(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> FirestoreValue {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn scalars() {
        assert_eq!(parse(json!({"nullValue": null})).to_json().unwrap(), Value::Null);
        assert_eq!(parse(json!({"booleanValue": true})).to_json().unwrap(), json!(true));
        assert_eq!(parse(json!({"integerValue": "42"})).to_json().unwrap(), json!(42));
        assert_eq!(parse(json!({"doubleValue": 1.5})).to_json().unwrap(), json!(1.5));
        assert_eq!(parse(json!({"stringValue": "hi"})).to_json().unwrap(), json!("hi"));
        assert_eq!(parse(json!({"bytesValue": "AAE="})).to_json().unwrap(), json!("AAE="));
    }

    #[test]
    fn non_finite_double_keeps_its_spelling() {
        assert_eq!(
            parse(json!({"doubleValue": "NaN"})).to_json().unwrap(),
            json!("NaN")
        );
    }

    #[test]
    fn bad_integer_is_a_decode_error() {
        let err = parse(json!({"integerValue": "forty"})).to_json().unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn timestamp_normalizes_to_utc() {
        let value = parse(json!({"timestampValue": "2024-05-01T10:00:00.500+02:00"}));
        assert_eq!(value.to_json().unwrap(), json!("2024-05-01T08:00:00.500Z"));
        assert_eq!(
            value.as_timestamp().unwrap().to_rfc3339_opts(SecondsFormat::Secs, true),
            "2024-05-01T08:00:00Z"
        );
        assert!(parse(json!({"stringValue": "2024-05-01T10:00:00Z"})).as_timestamp().is_none());
    }

    #[test]
    fn reference_becomes_document_path() {
        let value = parse(json!({
            "referenceValue": "projects/p/databases/(default)/documents/users/alice"
        }));
        assert_eq!(value.to_json().unwrap(), json!("users/alice"));
    }

    #[test]
    fn nested_structures() {
        let value = parse(json!({
            "mapValue": {"fields": {
                "tags": {"arrayValue": {"values": [
                    {"stringValue": "a"},
                    {"integerValue": "2"}
                ]}},
                "where": {"geoPointValue": {"latitude": 51.5, "longitude": -0.1}},
                "empty": {"arrayValue": {}}
            }}
        }));

        assert_eq!(
            value.to_json().unwrap(),
            json!({
                "empty": [],
                "tags": ["a", 2],
                "where": {"latitude": 51.5, "longitude": -0.1}
            })
        );
    }

    #[test]
    fn empty_map_value() {
        assert_eq!(parse(json!({"mapValue": {}})).to_json().unwrap(), json!({}));
    }
}
