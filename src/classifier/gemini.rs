use super::models::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    error_message_from_body,
};
use super::prompt::{SYSTEM_INSTRUCTION, render_request, response_schema};
use super::{ClassificationResponse, Classifier, ClassifyError, ServiceError};
use crate::batch::Batch;
use crate::reliability::RetryConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub retry: RetryConfig,
    pub user_agent: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.6,
            top_p: 0.6,
            timeout: Duration::from_secs(120),
            connection_timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
            user_agent: format!("lexicon-rater/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Classifier backed by the Generative Language `generateContent` API.
///
/// Sampling parameters, the rubric, and the response schema are fixed at
/// construction; each [`Classifier::classify`] call is an independent request.
#[derive(Clone)]
pub struct GeminiClassifier {
    client: Client,
    generate_url: Url,
    api_key: String,
    model: String,
    system_instruction: Content,
    generation_config: GenerationConfig,
    timeout: Duration,
    retry: RetryConfig,
}

impl GeminiClassifier {
    pub fn new(config: GeminiConfig) -> Result<Self, ClassifyError> {
        if config.api_key.trim().is_empty() {
            return Err(ClassifyError::InvalidConfiguration(
                "API key must not be empty".to_string(),
            ));
        }

        let generate_url = generate_url(&config.endpoint, &config.model)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ClassifyError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            generate_url,
            api_key: config.api_key,
            model: config.model,
            system_instruction: Content::text(None, SYSTEM_INSTRUCTION),
            generation_config: GenerationConfig {
                temperature: config.temperature,
                top_p: config.top_p,
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
            },
            timeout: config.timeout,
            retry: config.retry,
        })
    }

    pub fn generate_url(&self) -> &Url {
        &self.generate_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, batch: &Batch) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: self.system_instruction.clone(),
            contents: vec![Content::text(Some("user"), render_request(batch))],
            generation_config: self.generation_config.clone(),
        }
    }

    async fn generate_once(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<ClassificationResponse, ClassifyError> {
        let response = self
            .client
            .post(self.generate_url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body).into());
        }

        let body: GenerateContentResponse =
            response.json().await.map_err(|e| self.transport_error(e))?;

        let Some(text) = body.first_candidate_text() else {
            let block_reason = body
                .prompt_feedback
                .as_ref()
                .and_then(|feedback| feedback.block_reason.clone());
            let finish_reason = body
                .candidates
                .first()
                .and_then(|candidate| candidate.finish_reason.clone());
            return Err(ClassifyError::SchemaRejected(format!(
                "no candidate text (block_reason={}, finish_reason={})",
                block_reason.as_deref().unwrap_or("none"),
                finish_reason.as_deref().unwrap_or("none"),
            )));
        };

        debug!(bytes = text.len(), "received structured response");

        Ok(ClassificationResponse::from_json_text(&text)?.with_model_version(body.model_version))
    }

    fn transport_error(&self, error: reqwest::Error) -> ClassifyError {
        if error.is_timeout() {
            ServiceError::Timeout(self.timeout).into()
        } else if error.is_decode() {
            ClassifyError::SchemaRejected(format!("undecodable response body: {error}"))
        } else {
            ServiceError::Network(error).into()
        }
    }
}

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn classify(&self, batch: &Batch) -> Result<ClassificationResponse, ClassifyError> {
        let request = self.build_request(batch);
        let mut attempt = 0;

        loop {
            let delay = self.retry.delay_for_attempt(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;

            let start = Instant::now();
            match self.generate_once(&request).await {
                Ok(response) => {
                    info!(
                        batch = batch.index(),
                        words = batch.len(),
                        entries = response.len(),
                        attempt,
                        latency_ms = start.elapsed().as_millis() as u64,
                        "batch classified"
                    );
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && self.retry.can_retry(attempt) => {
                    warn!(
                        batch = batch.index(),
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %e,
                        "classification attempt failed, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl fmt::Debug for GeminiClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClassifier")
            .field("generate_url", &self.generate_url.as_str())
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// `{endpoint}/models/{model}:generateContent`; `model` may carry the
/// `models/` prefix.
fn generate_url(endpoint: &str, model: &str) -> Result<Url, ClassifyError> {
    let mut base = Url::parse(endpoint).map_err(|e| {
        ClassifyError::InvalidConfiguration(format!("Invalid endpoint URL '{endpoint}': {e}"))
    })?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    let model = model.trim().trim_start_matches("models/");
    if model.is_empty() || model.contains('/') {
        return Err(ClassifyError::InvalidConfiguration(format!(
            "Invalid model name '{model}'"
        )));
    }

    base.join(&format!("models/{model}:generateContent"))
        .map_err(|e| ClassifyError::InvalidConfiguration(format!("Invalid model URL: {e}")))
}

fn status_error(status: StatusCode, body: &str) -> ServiceError {
    let message = error_message_from_body(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::Auth {
            status: status.as_u16(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => ServiceError::RateLimited(message),
        _ => ServiceError::Http {
            status: status.as_u16(),
            message,
        },
    }
}
