use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::any::type_name;
use thiserror::Error;

/// Top-level JSON object as produced by [`decode`]
pub type JsonObject = Map<String, Value>;

/// Errors raised while translating between typed values and their wire representation
#[derive(Debug, Error)]
pub enum CodecError {
    /// Value can not be represented as JSON (e.g. a map with non-string keys)
    #[error("value can not be represented as json")]
    Serialization(#[source] serde_json::Error),
    /// Input is not valid JSON
    #[error("payload is not valid json")]
    Decode(#[source] serde_json::Error),
    /// Input is valid JSON but the top-level value is not an object
    #[error("payload is a json {0} instead of an object")]
    NotAnObject(&'static str),
    /// Input is a JSON object whose shape does not match the expected type
    #[error("payload does not match the shape of {expected}")]
    Validation {
        /// Name of the type the payload was validated against
        expected: &'static str,
        /// Underlying mismatch
        #[source]
        source: serde_json::Error,
    },
}

impl CodecError {
    /// Whether the input could not be decoded at all (as opposed to failing validation)
    pub fn is_decode_error(&self) -> bool {
        matches!(self, CodecError::Decode(_) | CodecError::NotAnObject(_))
    }
}

/// Serializes a value into canonical JSON bytes
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(CodecError::Serialization)
}

/// Parses JSON bytes into an untyped object
///
/// Well-formed objects never fail regardless of their fields, validating the shape
/// is done separately by [`validate`].
pub fn decode(bytes: &[u8]) -> Result<JsonObject, CodecError> {
    match serde_json::from_slice::<Value>(bytes).map_err(CodecError::Decode)? {
        Value::Object(object) => Ok(object),
        Value::Null => Err(CodecError::NotAnObject("null")),
        Value::Bool(_) => Err(CodecError::NotAnObject("boolean")),
        Value::Number(_) => Err(CodecError::NotAnObject("number")),
        Value::String(_) => Err(CodecError::NotAnObject("string")),
        Value::Array(_) => Err(CodecError::NotAnObject("array")),
    }
}

/// Converts an untyped object into a concrete type
pub fn validate<T: DeserializeOwned>(object: JsonObject) -> Result<T, CodecError> {
    serde_json::from_value(Value::Object(object)).map_err(|source| CodecError::Validation {
        expected: type_name::<T>(),
        source,
    })
}

/// Shorthand for [`decode`] followed by [`validate`]
pub fn decode_as<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    validate(decode(bytes)?)
}

#[cfg(test)]
mod does {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Parcel {
        label: String,
        weight: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    }

    #[test]
    fn round_trip_typed_payloads() {
        let parcels = vec![
            Parcel {
                label: "books".into(),
                weight: 2.5,
                note: None,
            },
            Parcel {
                label: "ünïcödé ✓".into(),
                weight: 0.0,
                note: Some("fragile".into()),
            },
        ];

        for parcel in parcels {
            let bytes = encode(&parcel).unwrap();
            assert_eq!(decode_as::<Parcel>(&bytes).unwrap(), parcel);
        }
    }

    #[test]
    fn round_trip_untyped_objects() {
        let value = json!({ "nested": { "list": [1, "two", null, true] }, "empty": {} });
        let bytes = encode(&value).unwrap();

        assert_eq!(Value::Object(decode(&bytes).unwrap()), value);
    }

    #[test]
    fn omit_absent_fields() {
        let bytes = encode(&Parcel {
            label: "x".into(),
            weight: 1.0,
            note: None,
        })
        .unwrap();

        assert!(!String::from_utf8(bytes).unwrap().contains("note"));
    }

    #[test]
    fn reject_unrepresentable_values() {
        let mut map = HashMap::new();
        map.insert(vec![1u8], "value");

        assert!(matches!(encode(&map), Err(CodecError::Serialization(_))));
    }

    #[test]
    fn reject_invalid_json() {
        let error = decode(b"{ not json").unwrap_err();
        assert!(matches!(error, CodecError::Decode(_)));
        assert!(error.is_decode_error());
    }

    #[test]
    fn reject_non_objects() {
        assert!(matches!(decode(b"[1, 2]"), Err(CodecError::NotAnObject("array"))));
        assert!(matches!(decode(b"42"), Err(CodecError::NotAnObject("number"))));
    }

    #[test]
    fn accept_unexpected_shapes_until_validated() {
        let object = decode(br#"{"label": 5}"#).unwrap();
        let error = validate::<Parcel>(object).unwrap_err();

        assert!(matches!(error, CodecError::Validation { .. }));
        assert!(!error.is_decode_error());
    }
}
