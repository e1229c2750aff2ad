//! Response body decoding.
//!
//! The tracking API is loosely specified, so a few shapes are accepted:
//!
//! ```text
//! [ {"id": "t1", "latitude": 40.1, "longitude": -73.9}, ... ]
//! { "trucks": [ {"id": 7, "lat": 40.1, "lon": -73.9}, ... ] }
//! ```
//!
//! The wrapper key may be `trucks`, `entities`, `vehicles` or `data`.
//! Any record with invalid coordinates rejects the whole body.

use serde::Deserialize;
use serde_json::Value;

use super::types::SourceError;
use crate::geo::LatLon;
use crate::store::{EntityId, PositionRecord};

/// Object keys that may wrap the record list.
const WRAPPER_KEYS: &[&str] = &["trucks", "entities", "vehicles", "data"];

#[derive(Debug, Deserialize)]
struct WireRecord {
    id: EntityId,
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    longitude: f64,
}

/// Decode a response body into position records.
pub fn parse_positions(body: &[u8]) -> Result<Vec<PositionRecord>, SourceError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| SourceError::Malformed(format!("invalid JSON: {}", e)))?;

    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => WRAPPER_KEYS
            .iter()
            .find_map(|key| map.remove(*key))
            .ok_or_else(|| {
                SourceError::Malformed(format!(
                    "expected an array or an object with one of {:?}",
                    WRAPPER_KEYS
                ))
            })?,
        other => {
            return Err(SourceError::Malformed(format!(
                "unexpected top-level JSON value: {}",
                json_kind(&other)
            )))
        }
    };

    let records: Vec<WireRecord> = serde_json::from_value(list)
        .map_err(|e| SourceError::Malformed(format!("invalid record list: {}", e)))?;

    records
        .into_iter()
        .map(|record| {
            let position = LatLon::try_new(record.latitude, record.longitude).map_err(|e| {
                SourceError::Malformed(format!("record {}: {}", record.id, e))
            })?;
            Ok(PositionRecord {
                id: record.id,
                position,
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let body = br#"[{"id":"t1","latitude":40.1,"longitude":-73.9}]"#;
        let records = parse_positions(body).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_str(), "t1");
        assert_eq!(records[0].position, LatLon::new(40.1, -73.9));
    }

    #[test]
    fn test_parse_wrapped_with_short_names() {
        let body = br#"{"trucks":[{"id":7,"lat":1.5,"lon":2.5},{"id":8,"lat":3.0,"lng":4.0}]}"#;
        let records = parse_positions(body).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_str(), "7");
        assert_eq!(records[1].position, LatLon::new(3.0, 4.0));
    }

    #[test]
    fn test_parse_alternative_wrapper_key() {
        let body = br#"{"vehicles":[]}"#;
        assert!(parse_positions(body).unwrap().is_empty());
    }

    #[test]
    fn test_empty_body_is_malformed() {
        assert!(matches!(
            parse_positions(b""),
            Err(SourceError::Malformed(_))
        ));
    }

    #[test]
    fn test_unknown_wrapper_is_malformed() {
        let err = parse_positions(br#"{"items":[]}"#).unwrap_err();
        assert!(err.to_string().contains("trucks"));
    }

    #[test]
    fn test_scalar_body_is_malformed() {
        let err = parse_positions(b"42").unwrap_err();
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn test_missing_coordinate_is_malformed() {
        let body = br#"[{"id":"t1","latitude":40.1}]"#;
        assert!(matches!(
            parse_positions(body),
            Err(SourceError::Malformed(_))
        ));
    }

    #[test]
    fn test_out_of_range_rejects_whole_body() {
        let body = br#"[{"id":"ok","lat":1.0,"lon":1.0},{"id":"bad","lat":91.0,"lon":1.0}]"#;
        let err = parse_positions(body).unwrap_err();
        assert!(err.to_string().contains("bad"));
    }
}
