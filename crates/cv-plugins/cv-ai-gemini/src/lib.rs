//! # cv-ai-gemini
//!
//! Reqwest-backed adapter for the Google Generative Language API.
//! Implements `TextGenerator` via `generateContent` with a JSON response
//! schema, and `ImageGenerator` via the Imagen `predict` endpoint.
//!
//! This adapter owns transport details only: request serialisation, timeout
//! and HTTP error mapping, and decoding into domain values.

mod dto;

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use cv_core::{GeneratedMedia, ImageGenerator, StructuredPrompt, TextGenerator};
use reqwest::{Client, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use dto::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, PredictInstance,
    PredictParameters, PredictRequest, PredictResponse, RequestPart,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-fast-generate-001";

/// Endpoint, model and timeout settings.
#[derive(Debug, Clone)]
pub struct GeminiOptions {
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout: Duration,
}

impl Default for GeminiOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct GeminiClient {
    client: Client,
    api_key: SecretString,
    base_url: Url,
    options: GeminiOptions,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns an error when the base URL does not parse, a model name is
    /// blank, or the reqwest client cannot be constructed.
    pub fn new(api_key: SecretString, options: GeminiOptions) -> anyhow::Result<Self> {
        if options.text_model.trim().is_empty() || options.image_model.trim().is_empty() {
            bail!("model names must not be blank");
        }
        let base_url = Url::parse(&options.base_url)
            .with_context(|| format!("invalid base URL '{}'", options.base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("base URL '{base_url}' cannot be used as a base");
        }
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            api_key,
            base_url,
            options,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> anyhow::Result<Url> {
        self.base_url
            .join(&format!("v1beta/models/{model}:{method}"))
            .with_context(|| format!("building endpoint for model '{model}'"))
    }

    async fn post_json<B, R>(&self, url: Url, body: &B) -> anyhow::Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }
        serde_json::from_slice(&body).context("invalid JSON payload from model endpoint")
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_json(
        &self,
        request: &StructuredPrompt,
    ) -> anyhow::Result<Option<serde_json::Value>> {
        let url = self.endpoint(&self.options.text_model, "generateContent")?;
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: to_gemini_schema(&request.schema),
            },
        };

        let response: GenerateContentResponse = self.post_json(url, &body).await?;
        let Some(text) = response.first_text() else {
            debug!(model = %self.options.text_model, "model returned no text");
            return Ok(None);
        };

        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(model = %self.options.text_model, error = %e, "model text is not JSON");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_image(&self, prompt: &str) -> anyhow::Result<Option<GeneratedMedia>> {
        let url = self.endpoint(&self.options.image_model, "predict")?;
        let body = PredictRequest {
            instances: vec![PredictInstance { prompt }],
            parameters: PredictParameters { sample_count: 1 },
        };

        let response: PredictResponse = self.post_json(url, &body).await?;
        let Some(prediction) = response.predictions.into_iter().next() else {
            return Ok(None);
        };
        let Some(encoded) = prediction.bytes_base64_encoded.filter(|b| !b.is_empty()) else {
            return Ok(None);
        };

        let data = base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| anyhow!("image payload is not base64: {e}"))?;
        let content_type = prediction
            .mime_type
            .as_deref()
            .and_then(|m| m.parse::<mime::Mime>().ok())
            .unwrap_or(mime::IMAGE_PNG);

        Ok(Some(GeneratedMedia {
            content_type,
            data: Bytes::from(data),
        }))
    }
}

/// The API expects OpenAPI-style upper-case type names (`OBJECT`, `STRING`).
fn to_gemini_schema(schema: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let converted = match (k.as_str(), v) {
                        ("type", Value::String(t)) => Value::String(t.to_uppercase()),
                        _ => to_gemini_schema(v),
                    };
                    (k.clone(), converted)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(to_gemini_schema).collect()),
        other => other.clone(),
    }
}

fn map_transport_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        anyhow!("model request timed out: {error}")
    } else {
        anyhow!("model request failed: {error}")
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> anyhow::Error {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => anyhow!("model endpoint rate limited ({message})"),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            anyhow!("model endpoint rejected the API key ({message})")
        }
        _ => anyhow!("model endpoint error ({message})"),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeminiClient {
        let options = GeminiOptions {
            base_url: server.uri(),
            text_model: "gemini-test".to_string(),
            image_model: "imagen-test".to_string(),
            timeout: Duration::from_secs(5),
        };
        GeminiClient::new(SecretString::from("test-key".to_string()), options).unwrap()
    }

    fn prompt() -> StructuredPrompt {
        StructuredPrompt {
            prompt: "Categorize this".to_string(),
            schema: json!({
                "type": "object",
                "properties": { "categoryGuess": { "type": "string" } },
            }),
        }
    }

    #[test]
    fn test_schema_types_are_uppercased() {
        let converted = to_gemini_schema(&prompt().schema);
        assert_eq!(converted["type"], "OBJECT");
        assert_eq!(converted["properties"]["categoryGuess"]["type"], "STRING");
    }

    #[test]
    fn test_new_validates_options() {
        let key = || SecretString::from("k".to_string());
        assert!(GeminiClient::new(key(), GeminiOptions::default()).is_ok());

        let blank = GeminiOptions {
            text_model: " ".to_string(),
            ..GeminiOptions::default()
        };
        assert!(GeminiClient::new(key(), blank).is_err());

        let bad_url = GeminiOptions {
            base_url: "not a url".to_string(),
            ..GeminiOptions::default()
        };
        assert!(GeminiClient::new(key(), bad_url).is_err());
    }

    #[tokio::test]
    async fn test_generate_json_decodes_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "{\"categoryGuess\":\"Water\"}" }] }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let value = client_for(&server).generate_json(&prompt()).await.unwrap();
        assert_eq!(value, Some(json!({ "categoryGuess": "Water" })));
    }

    #[tokio::test]
    async fn test_generate_json_without_candidates_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let value = client_for(&server).generate_json(&prompt()).await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_status_errors_carry_body_preview() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow   down"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate_json(&prompt()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("rate limited"), "{message}");
        assert!(message.contains("429: slow down"), "{message}");
    }

    #[tokio::test]
    async fn test_generate_image_decodes_prediction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/imagen-test:predict"))
            .and(body_partial_json(json!({ "instances": [{ "prompt": "medal" }] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{ "bytesBase64Encoded": "cG5n", "mimeType": "image/png" }]
            })))
            .mount(&server)
            .await;

        let media = client_for(&server).generate_image("medal").await.unwrap().unwrap();
        assert_eq!(media.content_type, mime::IMAGE_PNG);
        assert_eq!(media.data.as_ref(), b"png");
        assert_eq!(media.to_data_uri(), "data:image/png;base64,cG5n");
    }

    #[tokio::test]
    async fn test_generate_image_without_predictions_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        assert!(client_for(&server).generate_image("medal").await.unwrap().is_none());
    }
}
