//! Shape checks for the free-form inspection answer payload.
//!
//! Individual answers are template-defined and stay untyped; only the
//! top-level shape is enforced before anything is persisted.

use serde_json::Value;

use crate::error::CoreError;

/// Require `results` to be present and a non-empty JSON object.
pub fn validate_results(results: Option<&Value>) -> Result<(), CoreError> {
    match results {
        None | Some(Value::Null) => Err(CoreError::Validation("results are required".into())),
        Some(Value::Object(map)) if map.is_empty() => {
            Err(CoreError::Validation("results must not be empty".into()))
        }
        Some(Value::Object(_)) => Ok(()),
        Some(other) => Err(CoreError::Validation(format!(
            "results must be a JSON object, got {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
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
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_object() {
        assert!(validate_results(Some(&json!({"tyres": "ok", "lights": {"ok": false}}))).is_ok());
    }

    #[test]
    fn rejects_missing_and_null() {
        assert!(validate_results(None).is_err());
        assert!(validate_results(Some(&Value::Null)).is_err());
    }

    #[test]
    fn rejects_empty_object() {
        assert!(validate_results(Some(&json!({}))).is_err());
    }

    #[test]
    fn rejects_non_objects_with_type_name() {
        let err = validate_results(Some(&json!(["tyres"]))).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: results must be a JSON object, got array");
        assert!(validate_results(Some(&json!("ok"))).is_err());
    }
}
