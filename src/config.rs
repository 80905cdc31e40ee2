//! Configuration types for a PDF enhancement run.
//!
//! All run behaviour is controlled through [`EnhanceConfig`], built via its
//! [`EnhanceConfigBuilder`]. Validation happens in
//! [`EnhanceConfigBuilder::build`] and in the [`FromStr`] impls of the
//! selection enums, so an out-of-range DPI or an unknown aspect-ratio token is
//! rejected before any remote call is made.

use crate::error::EnhanceError;
use crate::pipeline::assemble::Assembler;
use crate::pipeline::enhance::PageEnhancer;
use crate::pipeline::render::Rasterizer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Lowest accepted rendering DPI.
pub const MIN_DPI: u32 = 150;
/// Highest accepted rendering DPI.
pub const MAX_DPI: u32 = 600;
/// Default image model.
pub const DEFAULT_MODEL: &str = "gemini-3-pro-image-preview";
/// Default `generateContent` endpoint prefix (Vertex AI, API-key mode).
pub const DEFAULT_API_BASE_URL: &str = "https://aiplatform.googleapis.com/v1/publishers/google/models";

/// Configuration for one enhancement run.
///
/// # Example
/// ```rust
/// use edgequake_pdf_enhance::{AspectRatio, EnhanceConfig, RunMode};
///
/// let config = EnhanceConfig::builder()
///     .dpi(300)
///     .aspect_ratio(AspectRatio::Landscape16x9)
///     .mode(RunMode::Preview)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 300);
/// ```
#[derive(Clone)]
pub struct EnhanceConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 150–600. Default: 300.
    ///
    /// Higher values give the model more pixels to work with and cost more
    /// upload bandwidth and rendering time.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 10 000.
    ///
    /// An A0 poster at 600 DPI would be close to 20 000 × 28 000 px. The cap
    /// scales the longest edge down, keeping the other proportional.
    pub max_rendered_pixels: u32,

    /// Output aspect ratio requested from the image model. Default: 1:1.
    pub aspect_ratio: AspectRatio,

    /// Output resolution class requested from the image model. Default: 2K.
    pub image_size: ImageSize,

    /// Preview (first page, PNG) or Full (all pages, PDF). Default: Full.
    pub mode: RunMode,

    /// Image model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// API key. Falls back to `GOOGLE_CLOUD_API_KEY`, then `GEMINI_API_KEY`.
    pub api_key: Option<String>,

    /// `generateContent` endpoint prefix. Default: [`DEFAULT_API_BASE_URL`].
    pub api_base_url: String,

    /// Sampling temperature. Default: 1.0.
    pub temperature: f32,

    /// Nucleus-sampling threshold. Default: 0.95.
    pub top_p: f32,

    /// Maximum output tokens per call. Default: 32 768.
    pub max_output_tokens: u32,

    /// Custom instruction. If None, uses [`crate::prompts::DEFAULT_INSTRUCTION`].
    pub instruction: Option<String>,

    /// Per-enhancer-call timeout in seconds. Default: 300.
    ///
    /// A timed-out page is passed through unchanged; it is never retried.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Pre-constructed rasteriser. Default: pdfium.
    pub rasterizer: Option<Arc<dyn Rasterizer>>,

    /// Pre-constructed enhancer. Takes precedence over `model`/`api_key`.
    pub enhancer: Option<Arc<dyn PageEnhancer>>,

    /// Pre-constructed assembler. Default: one lossless image per PDF page.
    pub assembler: Option<Arc<dyn Assembler>>,

    /// Receives per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            max_rendered_pixels: 10_000,
            aspect_ratio: AspectRatio::default(),
            image_size: ImageSize::default(),
            mode: RunMode::default(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            temperature: 1.0,
            top_p: 0.95,
            max_output_tokens: 32_768,
            instruction: None,
            api_timeout_secs: 300,
            download_timeout_secs: 120,
            password: None,
            rasterizer: None,
            enhancer: None,
            assembler: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for EnhanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhanceConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("aspect_ratio", &self.aspect_ratio)
            .field("image_size", &self.image_size)
            .field("mode", &self.mode)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("rasterizer", &self.rasterizer.as_ref().map(|_| "<dyn Rasterizer>"))
            .field("enhancer", &self.enhancer.as_ref().map(|e| e.name().to_string()))
            .field("assembler", &self.assembler.as_ref().map(|_| "<dyn Assembler>"))
            .finish()
    }
}

impl EnhanceConfig {
    /// Create a new builder for `EnhanceConfig`.
    pub fn builder() -> EnhanceConfigBuilder {
        EnhanceConfigBuilder {
            config: Self::default(),
        }
    }

    /// Re-check the invariants enforced by the builder.
    ///
    /// Fields are public, so a config mutated after `build()` is validated
    /// again at the start of every run.
    pub fn validate(&self) -> Result<(), EnhanceError> {
        if !(MIN_DPI..=MAX_DPI).contains(&self.dpi) {
            return Err(EnhanceError::InvalidConfig(format!(
                "DPI must be {MIN_DPI}–{MAX_DPI}, got {}",
                self.dpi
            )));
        }
        if self.max_rendered_pixels < 100 {
            return Err(EnhanceError::InvalidConfig(format!(
                "max_rendered_pixels must be ≥ 100, got {}",
                self.max_rendered_pixels
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(EnhanceError::InvalidConfig(format!(
                "temperature must be 0.0–2.0, got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(EnhanceError::InvalidConfig(format!(
                "top_p must be 0.0–1.0, got {}",
                self.top_p
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(EnhanceError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        if self.api_timeout_secs == 0 {
            return Err(EnhanceError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(EnhanceError::InvalidConfig("model must not be empty".into()));
        }
        Ok(())
    }

    /// The fixed generation options sent with every enhancer call.
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: self.temperature,
            top_p: self.top_p,
            max_output_tokens: self.max_output_tokens,
            aspect_ratio: self.aspect_ratio,
            image_size: self.image_size,
            output_mime_type: "image/png".to_string(),
            safety: SafetySetting::all_off(),
        }
    }

    /// The instruction sent alongside every page image.
    pub fn instruction(&self) -> &str {
        self.instruction
            .as_deref()
            .unwrap_or(crate::prompts::DEFAULT_INSTRUCTION)
    }
}

/// Builder for [`EnhanceConfig`].
pub struct EnhanceConfigBuilder {
    config: EnhanceConfig,
}

impl fmt::Debug for EnhanceConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhanceConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl EnhanceConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px;
        self
    }

    pub fn aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.config.aspect_ratio = ratio;
        self
    }

    pub fn image_size(mut self, size: ImageSize) -> Self {
        self.config.image_size = size;
        self
    }

    pub fn mode(mut self, mode: RunMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t;
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p;
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn instruction(mut self, text: impl Into<String>) -> Self {
        self.config.instruction = Some(text.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.config.rasterizer = Some(rasterizer);
        self
    }

    pub fn enhancer(mut self, enhancer: Arc<dyn PageEnhancer>) -> Self {
        self.config.enhancer = Some(enhancer);
        self
    }

    pub fn assembler(mut self, assembler: Arc<dyn Assembler>) -> Self {
        self.config.assembler = Some(assembler);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EnhanceConfig, EnhanceError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Output aspect ratios accepted by the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 (default)
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "2:3")]
    Portrait2x3,
    #[serde(rename = "3:2")]
    Landscape3x2,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "4:5")]
    Portrait4x5,
    #[serde(rename = "5:4")]
    Landscape5x4,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "21:9")]
    Ultrawide21x9,
}

impl AspectRatio {
    /// Every supported ratio, in display order.
    pub const ALL: [AspectRatio; 10] = [
        AspectRatio::Square,
        AspectRatio::Portrait2x3,
        AspectRatio::Landscape3x2,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait4x5,
        AspectRatio::Landscape5x4,
        AspectRatio::Portrait9x16,
        AspectRatio::Landscape16x9,
        AspectRatio::Ultrawide21x9,
    ];

    /// The wire token, e.g. `"16:9"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait2x3 => "2:3",
            AspectRatio::Landscape3x2 => "3:2",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait4x5 => "4:5",
            AspectRatio::Landscape5x4 => "5:4",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Ultrawide21x9 => "21:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = EnhanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        AspectRatio::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == token)
            .ok_or_else(|| {
                let supported: Vec<&str> = AspectRatio::ALL.iter().map(|r| r.as_str()).collect();
                EnhanceError::InvalidConfig(format!(
                    "unsupported aspect ratio '{token}' (expected one of {})",
                    supported.join(", ")
                ))
            })
    }
}

/// Output resolution class requested from the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "1K")]
    OneK,
    /// 2K (default)
    #[default]
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    /// The wire token, e.g. `"2K"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::OneK => "1K",
            ImageSize::TwoK => "2K",
            ImageSize::FourK => "4K",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = EnhanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1K" => Ok(ImageSize::OneK),
            "2K" => Ok(ImageSize::TwoK),
            "4K" => Ok(ImageSize::FourK),
            other => Err(EnhanceError::InvalidConfig(format!(
                "unsupported image size '{other}' (expected 1K, 2K or 4K)"
            ))),
        }
    }
}

/// Which slice of the document a run processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// First page only; returns a PNG and skips assembly.
    Preview,
    /// Every page; returns an assembled PDF. (default)
    #[default]
    Full,
}

/// Content-safety categories sent with every request.
pub const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
];

/// One content-safety threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

impl SafetySetting {
    /// All categories switched off: the input is the user's own document.
    pub fn all_off() -> Vec<SafetySetting> {
        SAFETY_CATEGORIES
            .iter()
            .map(|c| SafetySetting {
                category: (*c).to_string(),
                threshold: "OFF".to_string(),
            })
            .collect()
    }
}

/// Generation options passed unchanged to every enhancer call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    pub aspect_ratio: AspectRatio,
    pub image_size: ImageSize,
    pub output_mime_type: String,
    pub safety: Vec<SafetySetting>,
}
