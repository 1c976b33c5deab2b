// JSON codec helpers
//
// The gateway answers with loosely-typed `result` objects, and passthrough
// replies nest the device's own JSON reply inside a string. These helpers
// turn both into typed values in one place.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

/// Key under which the gateway relays a device reply as a JSON string.
pub const RESPONSE_DATA: &str = "responseData";

/// Decode an already-parsed JSON value into a typed struct.
///
/// Deserializes from a borrow so the value is still around to quote in the
/// error, without copying it up front.
pub fn transcode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    T::deserialize(&value).map_err(|e| Error::decode(&e, value.to_string()))
}

/// Decode a JSON document carried as a string inside another JSON value.
///
/// Objects and arrays pass through untouched, so callers can feed either
/// shape the gateway happens to return.
pub fn decode_embedded(value: Value) -> Result<Value, Error> {
    match value {
        Value::String(raw) => serde_json::from_str(&raw).map_err(|e| Error::decode(&e, raw)),
        other => Ok(other),
    }
}

/// Extract the device reply from a passthrough `result`.
///
/// When `result.responseData` holds a non-empty string it is itself JSON
/// and is decoded a second time. Otherwise the raw `result` object is the
/// reply.
pub fn unwrap_passthrough(result: Value) -> Result<Value, Error> {
    let Value::Object(mut map) = result else {
        return Err(Error::Deserialization {
            message: format!("passthrough result is not an object: {result}"),
            body: result.to_string(),
        });
    };

    match map.remove(RESPONSE_DATA) {
        Some(Value::String(raw)) if raw.is_empty() => Ok(Value::Object(map)),
        Some(Value::Null) | None => Ok(Value::Object(map)),
        Some(data) => decode_embedded(data),
    }
}
