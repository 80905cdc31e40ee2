//! Instructions sent to the image model alongside each page.
//!
//! Callers can override the default via
//! [`crate::config::EnhanceConfig::instruction`]; the constants here are used
//! only when no override is provided.

/// Default instruction for cleaning up one rasterised page.
pub const DEFAULT_INSTRUCTION: &str = "Please optimize the text in this image so that it is clearer and easier to read. \
Keep the original page layout exactly as it is, but improve the quality, contrast and sharpness of the text. \
Output the optimized image.";

/// The instruction the tool originally shipped with (Traditional Chinese).
///
/// Kept for users whose documents are mostly CJK text; the model tends to
/// follow instructions in the document's own language more faithfully.
pub const DEFAULT_INSTRUCTION_ZH_HANT: &str = "請優化這張圖片中的文字，使其更清晰、更易讀。保持原有的版面配置，但提升文字的品質、對比度和清晰度。請輸出優化後的圖片。";
