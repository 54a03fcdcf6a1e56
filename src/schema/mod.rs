//! JSON Schema contracts for structured generation payloads.
//!
//! The generation service is asked to honour a response shape, but its
//! output is still checked here at runtime before any entry is trusted.

pub(crate) mod rating_response;

use jsonschema::Validator;
use serde_json::Value;

/// Schema check result.
#[derive(Debug)]
pub(crate) struct ValidationResult {
    pub(crate) valid: bool,
    pub(crate) errors: Vec<String>,
}

impl ValidationResult {
    pub(crate) fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub(crate) fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}

/// Checks `instance` against a compiled schema, collecting every violation.
pub(crate) fn validate_with(validator: &Validator, instance: &Value) -> ValidationResult {
    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|error| format!("{}: {error}", error.instance_path))
        .collect();
    if errors.is_empty() {
        ValidationResult::valid()
    } else {
        ValidationResult::invalid(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validate_with_accepts_valid_data() {
        let schema = json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "properties": {
                "name": { "type": "string" }
            },
            "required": ["name"]
        });

        let validator = jsonschema::validator_for(&schema).unwrap();
        let result = validate_with(&validator, &json!({ "name": "Alice" }));
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn validate_with_rejects_invalid_data() {
        let schema = json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "required": ["name"]
        });

        let validator = jsonschema::validator_for(&schema).unwrap();
        let result = validate_with(&validator, &json!({ "age": 30 }));
        assert!(!result.valid);
        assert!(!result.errors.is_empty());
    }
}
