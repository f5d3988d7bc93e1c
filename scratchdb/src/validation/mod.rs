use crate::error::{Result, ScratchDbError};
use serde_json::{Map, Value};

/// Decode an inbound payload as an item body: a non-null, non-array
/// JSON object. Arrays, primitives, and null are rejected. This is the
/// only structural validation performed; fields inside the object are
/// caller-owned.
pub fn into_object(payload: Value) -> Result<Map<String, Value>> {
    match payload {
        Value::Object(map) => Ok(map),
        other => Err(ScratchDbError::InvalidBody(format!(
            "expected a JSON object, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_objects_including_empty() {
        assert!(into_object(json!({})).is_ok());
        assert!(into_object(json!({"name": "A"})).is_ok());
    }

    #[test]
    fn test_rejects_arrays_primitives_and_null() {
        for payload in [
            json!([1, 2, 3]),
            json!("hello"),
            json!(42),
            json!(true),
            json!(null),
        ] {
            let err = into_object(payload).unwrap_err();
            assert!(matches!(err, ScratchDbError::InvalidBody(_)));
        }
    }

    #[test]
    fn test_error_message_names_the_shape() {
        let err = into_object(json!("hello")).unwrap_err();
        assert!(err.to_string().contains("a string"));
    }
}
