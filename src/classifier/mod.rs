//! Structured-generation classification of word batches.
//!
//! A [`Classifier`] turns one [`Batch`] into a [`ClassificationResponse`]:
//! the raw, schema-checked entries the service returned. Entries are not yet
//! trusted; see [`crate::validation`].

pub mod gemini;
pub mod models;
pub mod prompt;

pub use gemini::{GeminiClassifier, GeminiConfig};
pub use prompt::{SYSTEM_INSTRUCTION, render_request};

use crate::batch::Batch;
use crate::schema::rating_response::validate_rating_response;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Failure talking to the generation service. Always per-batch.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),
    #[error("Authentication rejected: HTTP {status} - {message}")]
    Auth { status: u16, message: String },
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },
    #[error("Request cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),
    /// The service answered, but not with output matching the response contract.
    #[error("Schema rejected: {0}")]
    SchemaRejected(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ClassifyError {
    /// Whether the failure is confined to one batch, so the run may continue.
    pub fn is_batch_failure(&self) -> bool {
        matches!(self, Self::Service(_) | Self::SchemaRejected(_))
    }

    /// Whether repeating the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Service(ServiceError::Timeout(_) | ServiceError::RateLimited(_)) => true,
            Self::Service(ServiceError::Network(e)) => crate::reliability::is_retryable_error(e),
            Self::Service(ServiceError::Http { status, .. }) => {
                reqwest::StatusCode::from_u16(*status)
                    .is_ok_and(crate::reliability::is_retryable_status)
            }
            _ => false,
        }
    }
}

/// Raw structured payload for one request, checked only against the
/// envelope schema (a top-level array). Entries of any shape are kept for
/// per-entry validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResponse {
    entries: Vec<Value>,
    model_version: Option<String>,
}

impl ClassificationResponse {
    /// Parses the service's JSON text and checks it against the response contract.
    pub fn from_json_text(text: &str) -> Result<Self, ClassifyError> {
        let payload: Value = serde_json::from_str(text).map_err(|e| {
            ClassifyError::SchemaRejected(format!("response is not valid JSON: {e}"))
        })?;
        Self::from_value(payload)
    }

    pub fn from_value(payload: Value) -> Result<Self, ClassifyError> {
        let validation = validate_rating_response(&payload);
        if !validation.valid {
            return Err(ClassifyError::SchemaRejected(format!(
                "response does not match the rating contract: {}",
                validation.errors.join("; ")
            )));
        }
        match payload {
            Value::Array(entries) => Ok(Self {
                entries,
                model_version: None,
            }),
            other => Err(ClassifyError::SchemaRejected(format!(
                "expected an array, got {other}"
            ))),
        }
    }

    #[must_use]
    pub fn with_model_version(mut self, model_version: Option<String>) -> Self {
        self.model_version = model_version;
        self
    }

    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn model_version(&self) -> Option<&str> {
        self.model_version.as_deref()
    }
}

/// Rates one batch. Implementations hold no per-call state.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, batch: &Batch) -> Result<ClassificationResponse, ClassifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_text_accepts_rating_arrays() {
        let response = ClassificationResponse::from_json_text(
            r#"[{"word":"flow","rating":"1"},{"word":"the","rating":"0"}]"#,
        )
        .unwrap();
        assert_eq!(response.len(), 2);
        assert_eq!(response.entries()[0]["word"], "flow");
    }

    #[test]
    fn from_json_text_rejects_malformed_payloads() {
        for text in ["not json", r#"{"word":"flow"}"#, r#""flow""#, r#"[{"word":"a"}"#] {
            let err = ClassificationResponse::from_json_text(text).unwrap_err();
            assert!(
                matches!(err, ClassifyError::SchemaRejected(_)),
                "{text:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn stray_scalar_entry_keeps_its_siblings() {
        let response = ClassificationResponse::from_json_text(
            r#"[{"word":"flow","rating":"1"},{"word":"cipher","rating":"0.75"},"junk"]"#,
        )
        .unwrap();
        assert_eq!(response.len(), 3);
        assert_eq!(response.entries()[2], "junk");
    }

    #[test]
    fn batch_failures_and_retryability() {
        let timeout = ClassifyError::Service(ServiceError::Timeout(Duration::from_secs(1)));
        assert!(timeout.is_batch_failure());
        assert!(timeout.is_retryable());

        let auth = ClassifyError::Service(ServiceError::Auth {
            status: 403,
            message: "denied".to_string(),
        });
        assert!(auth.is_batch_failure());
        assert!(!auth.is_retryable());

        let unavailable = ClassifyError::Service(ServiceError::Http {
            status: 503,
            message: "overloaded".to_string(),
        });
        assert!(unavailable.is_retryable());

        let schema = ClassifyError::SchemaRejected("bad".to_string());
        assert!(schema.is_batch_failure());
        assert!(!schema.is_retryable());

        let config = ClassifyError::InvalidConfiguration("bad url".to_string());
        assert!(!config.is_batch_failure());
    }
}
