use crate::models::{NO_PREDICTION_MESSAGE, SelectedImage};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{StatusCode, Url};
use std::time::Instant;
use thiserror::Error;

/// Multipart field carrying the image bytes.
pub const IMAGE_FIELD_NAME: &str = "image";

/// JSON field holding the diagnosis text.
pub const PREDICTION_FIELD: &str = "prediction";

/// Outcome of a request the server answered with well-formed JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    /// The diagnosis, if the server supplied a non-empty string.
    pub diagnosis: Option<String>,
}

impl Prediction {
    /// Parse a raw response body.
    ///
    /// A body that isn't JSON, or is the JSON literal `null`, has no fields to read
    /// and counts as a transport failure.
    pub fn from_body(body: &[u8]) -> Result<Self, InferenceError> {
        let json: serde_json::Value = serde_json::from_slice(body)?;
        if json.is_null() {
            return Err(InferenceError::NullBody);
        }
        Ok(Self::from_json(&json))
    }

    /// Interpret a parsed response body.
    ///
    /// Only a non-empty string under `prediction` counts as a diagnosis. A missing,
    /// null, empty or non-string value is a soft outcome, not an error. Non-object
    /// bodies are treated the same way, except `null`, which
    /// [`from_body`](Self::from_body) rejects before getting here.
    pub fn from_json(body: &serde_json::Value) -> Self {
        let diagnosis = body
            .get(PREDICTION_FIELD)
            .and_then(serde_json::Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        Self { diagnosis }
    }

    /// Text shown to the user.
    pub fn into_result_text(self) -> String {
        self.diagnosis
            .unwrap_or_else(|| NO_PREDICTION_MESSAGE.to_string())
    }
}

/// Transport-level failures.
///
/// All of these collapse to the same user-facing message; the variants exist for
/// the logs.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server responded with status {0}")]
    Status(StatusCode),

    #[error("Response body is not valid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Response body is null")]
    NullBody,
}

/// The seam between the submission workflow and the inference service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Submit one image and wait for the server's answer.
    async fn predict(&self, image: &SelectedImage) -> Result<Prediction, InferenceError>;
}

/// [`InferenceClient`] talking to `POST {base}/predict` over HTTP.
///
/// No timeout is configured; a request runs until the transport gives up.
#[derive(Debug, Clone)]
pub struct HttpInferenceClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpInferenceClient {
    pub fn new(endpoint: Url) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build the multipart body: one part, `image`, with the raw bytes.
    fn build_form(image: &SelectedImage) -> Form {
        let part = Part::bytes(image.bytes.to_vec()).file_name(image.file_name.clone());

        // The host-supplied MIME type is advisory; a malformed one must not fail
        // the submission.
        let part = match part.mime_str(&image.mime_type) {
            Ok(part) => part,
            Err(e) => {
                tracing::warn!(
                    "Ignoring invalid MIME type '{}' for {}: {}",
                    image.mime_type,
                    image.file_name,
                    e
                );
                Part::bytes(image.bytes.to_vec()).file_name(image.file_name.clone())
            }
        };

        Form::new().part(IMAGE_FIELD_NAME, part)
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn predict(&self, image: &SelectedImage) -> Result<Prediction, InferenceError> {
        tracing::info!(
            "Submitting {} ({} bytes, {}) to {}",
            image.file_name,
            image.size(),
            image.mime_type,
            self.endpoint
        );

        let start = Instant::now();

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(Self::build_form(image))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::Status(status));
        }

        let body = response.bytes().await?;
        let prediction = Prediction::from_body(&body)?;

        tracing::info!(
            "Inference completed in {:.2}s (diagnosis present: {})",
            start.elapsed().as_secs_f32(),
            prediction.diagnosis.is_some()
        );

        Ok(prediction)
    }
}
