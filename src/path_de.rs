//! Typed deserialization with JSON-path context in error messages.
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SchemaError;

fn with_path<T>(result: Result<T, serde_path_to_error::Error<serde_json::Error>>) -> Result<T, SchemaError> {
    result.map_err(|err| {
        let path = err.path().to_string();
        SchemaError::Deserialize { path, message: err.into_inner().to_string() }
    })
}

/// Used on already-normalized output, so every declared key is present.
pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, SchemaError> {
    with_path(serde_path_to_error::deserialize::<_, T>(value))
}

pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, SchemaError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    with_path(serde_path_to_error::deserialize::<_, T>(de))
}
