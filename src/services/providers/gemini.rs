//! Gemini provider implementation.
//!
//! Issues a single non-streaming generateContent call and extracts the
//! first candidate's text.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde_json::Value;

use super::{ProviderError, TextGenerator};

/// Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider configuration.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: Secret<String>,
    pub model: String,
}

/// Gemini text generator.
pub struct GeminiGenerator {
    config: GeminiConfig,
    client: Client,
}

impl GeminiGenerator {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Build the generateContent URL; the key travels as a query parameter.
    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            GEMINI_API_BASE,
            self.config.model,
            self.config.api_key.expose_secret()
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
    ) -> Result<Option<String>, ProviderError> {
        let request = GenerateContentRequest {
            system_instruction: Content {
                role: "system",
                parts: vec![Part {
                    text: system_instruction.to_string(),
                }],
            },
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "text/plain",
            },
        };

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        // Upstream error statuses are not treated as failures here. Any body
        // that decodes as JSON at all is walked for candidate text, and
        // shapes that carry none read as `None` and become the caller's
        // fallback copy.
        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(extract_text(body))
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a response body,
/// tolerating a missing or differently shaped level anywhere on the path.
fn extract_text(body: Value) -> Option<String> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_to_the_wire_shape() {
        let request = GenerateContentRequest {
            system_instruction: Content {
                role: "system",
                parts: vec![Part {
                    text: "Reply with the email text only.".to_string(),
                }],
            },
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: "hello".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "text/plain",
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "systemInstruction": {
                    "role": "system",
                    "parts": [{ "text": "Reply with the email text only." }]
                },
                "contents": [{
                    "role": "user",
                    "parts": [{ "text": "hello" }]
                }],
                "generationConfig": { "responseMimeType": "text/plain" }
            })
        );
    }

    #[test]
    fn extracts_the_first_candidate_text() {
        let body = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Subject: Hi" },
                        { "text": "ignored second part" }
                    ]
                },
                "finishReason": "STOP"
            }]
        });

        assert_eq!(extract_text(body), Some("Subject: Hi".to_string()));
    }

    #[test]
    fn upstream_error_bodies_read_as_no_text() {
        let body = json!({
            "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
        });

        assert_eq!(extract_text(body), None);
    }

    #[test]
    fn candidates_without_text_parts_read_as_no_text() {
        assert_eq!(extract_text(json!({ "candidates": [] })), None);

        assert_eq!(
            extract_text(json!({ "candidates": [{ "content": { "parts": [] } }] })),
            None
        );

        assert_eq!(
            extract_text(json!({
                "candidates": [{ "content": { "parts": [{ "inlineData": { "mimeType": "image/png" } }] } }]
            })),
            None
        );
    }

    #[test]
    fn unexpected_body_shapes_read_as_no_text() {
        assert_eq!(extract_text(json!(["a", "bare", "array"])), None);
        assert_eq!(extract_text(json!("a bare string")), None);
        assert_eq!(extract_text(json!(null)), None);

        assert_eq!(extract_text(json!({ "candidates": "none" })), None);
        assert_eq!(extract_text(json!({ "candidates": { "first": {} } })), None);

        assert_eq!(
            extract_text(json!({ "candidates": [{ "content": ["not", "an", "object"] }] })),
            None
        );
        assert_eq!(
            extract_text(json!({ "candidates": [{ "content": { "parts": { "text": "nested wrong" } } }] })),
            None
        );
        assert_eq!(
            extract_text(json!({ "candidates": [{ "content": { "parts": [{ "text": 42 }] } }] })),
            None
        );
    }
}
