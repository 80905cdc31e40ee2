//! Page enhancement: the [`PageEnhancer`] seam and the per-page policy.
//!
//! [`enhance_page`] never fails. Whatever the enhancer does (error, no image,
//! timeout) the page ends up as a [`PageOutcome`]: `Enhanced` with the
//! returned image, or `Unchanged` with the original and a [`PageError`].
//! There are no retries.

use crate::config::GenerationSettings;
use crate::error::{EnhancerError, PageError};
use crate::output::PageOutcome;
use async_trait::async_trait;
use image::DynamicImage;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// One page submitted to the enhancer.
#[derive(Debug, Clone, Copy)]
pub struct EnhancementRequest<'a> {
    /// 1-indexed page number.
    pub page_num: usize,
    pub image: &'a DynamicImage,
    pub instruction: &'a str,
    pub settings: &'a GenerationSettings,
}

/// A remote (or local) service that returns a cleaned-up page image.
#[async_trait]
pub trait PageEnhancer: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Enhance one page.
    ///
    /// * `Ok(Some(image))` — replacement image.
    /// * `Ok(None)` — the service answered without an image.
    /// * `Err(_)` — the call failed.
    async fn enhance(&self, request: EnhancementRequest<'_>) -> Result<Option<DynamicImage>, EnhancerError>;
}

/// Enhance one page, substituting the original on any failure.
pub async fn enhance_page(
    enhancer: &dyn PageEnhancer,
    request: EnhancementRequest<'_>,
    timeout: Duration,
) -> (PageOutcome, Duration) {
    let start = Instant::now();
    let page = request.page_num;
    let original = request.image;

    let reply = tokio::time::timeout(timeout, enhancer.enhance(request)).await;
    let elapsed = start.elapsed();

    let outcome = match reply {
        Ok(Ok(Some(image))) => {
            debug!(
                "Page {}: {} returned {}x{} px in {:?}",
                page,
                enhancer.name(),
                image.width(),
                image.height(),
                elapsed
            );
            PageOutcome::Enhanced(image)
        }
        Ok(Ok(None)) => {
            warn!("Page {}: {} returned no image, keeping original", page, enhancer.name());
            unchanged(original, PageError::NoImageReturned { page })
        }
        Ok(Err(e)) => {
            warn!("Page {}: {} failed, keeping original: {}", page, enhancer.name(), e);
            unchanged(
                original,
                PageError::EnhancementFailed {
                    page,
                    detail: e.to_string(),
                },
            )
        }
        Err(_) => {
            warn!(
                "Page {}: {} timed out after {}s, keeping original",
                page,
                enhancer.name(),
                timeout.as_secs()
            );
            unchanged(
                original,
                PageError::Timeout {
                    page,
                    secs: timeout.as_secs(),
                },
            )
        }
    };

    (outcome, elapsed)
}

fn unchanged(original: &DynamicImage, reason: PageError) -> PageOutcome {
    PageOutcome::Unchanged {
        image: original.clone(),
        reason,
    }
}
