//! Gemini image-generation client implementing [`PageEnhancer`].
//!
//! One `generateContent` call per page. The request carries the instruction
//! as a text part and the page as an inline PNG part; the first inline image
//! in the first candidate is the answer. A response without an inline image
//! (text-only reply, safety stop, empty candidate list) is reported as
//! `Ok(None)` so the controller keeps the original page.
//!
//! ```text
//! POST {base}/{model}:generateContent
//! x-goog-api-key: …
//! {
//!   "contents": [{ "role": "user", "parts": [{ "text": … }, { "inlineData": { … } }] }],
//!   "generationConfig": { "temperature": 1, "topP": 0.95, "maxOutputTokens": 32768,
//!                         "responseModalities": ["IMAGE"],
//!                         "imageConfig": { "aspectRatio": "16:9", "imageSize": "2K",
//!                                          "imageOutputOptions": { "mimeType": "image/png" } } },
//!   "safetySettings": [{ "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "OFF" }, …]
//! }
//! ```

use super::encode;
use super::enhance::{EnhancementRequest, PageEnhancer};
use crate::config::{GenerationSettings, SafetySetting, DEFAULT_API_BASE_URL, DEFAULT_MODEL};
use crate::error::{EnhanceError, EnhancerError};
use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Primary environment variable holding the API key.
pub const API_KEY_ENV: &str = "GOOGLE_CLOUD_API_KEY";
/// Fallback environment variable holding the API key.
pub const FALLBACK_API_KEY_ENV: &str = "GEMINI_API_KEY";

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content>,
    generation_config: GenerationConfig<'a>,
    safety_settings: &'a [SafetySetting],
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
    response_modalities: [&'static str; 1],
    image_config: ImageConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig<'a> {
    aspect_ratio: &'static str,
    image_size: &'static str,
    image_output_options: ImageOutputOptions<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageOutputOptions<'a> {
    mime_type: &'a str,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

// ── Request / response mapping ───────────────────────────────────────────

fn build_request<'a>(
    instruction: &str,
    page_png_b64: String,
    settings: &'a GenerationSettings,
) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![
                Part {
                    text: Some(instruction.to_string()),
                    inline_data: None,
                },
                Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: "image/png".to_string(),
                        data: page_png_b64,
                    }),
                },
            ],
        }],
        generation_config: GenerationConfig {
            temperature: settings.temperature,
            top_p: settings.top_p,
            max_output_tokens: settings.max_output_tokens,
            response_modalities: ["IMAGE"],
            image_config: ImageConfig {
                aspect_ratio: settings.aspect_ratio.as_str(),
                image_size: settings.image_size.as_str(),
                image_output_options: ImageOutputOptions {
                    mime_type: &settings.output_mime_type,
                },
            },
        },
        safety_settings: &settings.safety,
    }
}

/// First inline image of the first candidate, still base64-encoded.
fn first_inline_image(response: &GenerateContentResponse) -> Option<&InlineData> {
    response
        .candidates
        .first()?
        .content
        .as_ref()?
        .parts
        .iter()
        .find_map(|p| p.inline_data.as_ref().filter(|d| !d.data.is_empty()))
}

/// Best-effort description of why no image came back.
fn describe_missing_image(response: &GenerateContentResponse) -> String {
    if let Some(candidate) = response.candidates.first() {
        let text: Vec<&str> = candidate
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect();
        format!(
            "finish_reason={}, text={:?}",
            candidate.finish_reason.as_deref().unwrap_or("none"),
            text.join(" ")
        )
    } else if let Some(ref feedback) = response.prompt_feedback {
        format!("no candidates, prompt_feedback={feedback}")
    } else {
        "no candidates".to_string()
    }
}

/// Turn a non-success body into the most useful message available.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => match parsed.error.status {
            Some(status) => format!("{status}: {}", parsed.error.message),
            None => parsed.error.message,
        },
        Err(_) => body.chars().take(500).collect(),
    }
}

// ── Client ───────────────────────────────────────────────────────────────

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiEnhancer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiEnhancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiEnhancer")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiEnhancer {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Build from an explicit key or the environment.
    ///
    /// Lookup order: `api_key`, `GOOGLE_CLOUD_API_KEY`, `GEMINI_API_KEY`.
    pub fn from_key_or_env(api_key: Option<&str>, model: Option<&str>) -> Result<Self, EnhanceError> {
        let key = api_key
            .map(str::to_string)
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
            .or_else(|| {
                std::env::var(FALLBACK_API_KEY_ENV)
                    .ok()
                    .filter(|k| !k.trim().is_empty())
            })
            .ok_or_else(|| EnhanceError::EnhancerNotConfigured {
                enhancer: "gemini".to_string(),
                hint: format!(
                    "No API key found.\nPass --api-key, or set {API_KEY_ENV} (or {FALLBACK_API_KEY_ENV})."
                ),
            })?;
        Ok(Self::new(key, model.unwrap_or(DEFAULT_MODEL)))
    }

    /// Override the endpoint prefix (e.g. the Generative Language API).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a pre-configured HTTP client (proxies, custom TLS, …).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Full `generateContent` URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl PageEnhancer for GeminiEnhancer {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn enhance(&self, request: EnhancementRequest<'_>) -> Result<Option<DynamicImage>, EnhancerError> {
        let b64 = encode::encode_page_base64(request.image)
            .map_err(|e| EnhancerError::Encode(e.to_string()))?;
        let body = build_request(request.instruction, b64, request.settings);

        debug!(
            "Page {}: POST {} (aspect {}, size {})",
            request.page_num,
            self.endpoint(),
            request.settings.aspect_ratio,
            request.settings.image_size
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EnhancerError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| EnhancerError::InvalidResponse(e.to_string()))?;

        match first_inline_image(&parsed) {
            Some(inline) => {
                let image = encode::decode_base64_image(&inline.data).map_err(EnhancerError::Decode)?;
                Ok(Some(image))
            }
            None => {
                warn!(
                    "Page {}: response contained no image ({})",
                    request.page_num,
                    describe_missing_image(&parsed)
                );
                Ok(None)
            }
        }
    }
}
