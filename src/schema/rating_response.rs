//! Shape contract for a batch rating response.
//!
//! Only the envelope is enforced here: a top-level array. Entry problems
//! (non-object entry, blank word, rating outside the scale) are reported per
//! entry by the response validator so that one bad entry never discards its
//! siblings.

use super::{ValidationResult, validate_with};
use jsonschema::Validator;
use once_cell::sync::Lazy;
use serde_json::{Value, json};

pub(crate) static RATING_RESPONSE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Word Rating Response",
        "description": "One object per rated word, in any order",
        "type": "array",
        "items": {
            "properties": {
                "word": {
                    "description": "The word exactly as it was requested"
                },
                "rating": {
                    "description": "One of \"0\", \"0.25\", \"0.5\", \"0.75\", \"1\""
                }
            }
        }
    })
});

static RATING_RESPONSE_VALIDATOR: Lazy<Result<Validator, String>> = Lazy::new(|| {
    jsonschema::validator_for(&RATING_RESPONSE_SCHEMA).map_err(|e| e.to_string())
});

/// Checks a response payload against the compiled envelope schema.
pub(crate) fn validate_rating_response(instance: &Value) -> ValidationResult {
    match &*RATING_RESPONSE_VALIDATOR {
        Ok(validator) => validate_with(validator, instance),
        Err(e) => ValidationResult::invalid(vec![format!("Schema compilation error: {e}")]),
    }
}
