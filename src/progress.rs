//! Progress-callback trait for per-page run events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::EnhanceConfigBuilder::progress_callback`] to receive
//! events as the pipeline walks through the document.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf_enhance::{EnhanceConfig, RunProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     enhanced: AtomicUsize,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_page_enhanced(&self, page_num: usize, selected_pages: usize) {
//!         self.enhanced.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} enhanced", page_num, selected_pages);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { enhanced: AtomicUsize::new(0) });
//!
//! let config = EnhanceConfig::builder()
//!     .progress_callback(counter as Arc<dyn RunProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes each page.
///
/// Pages are processed one at a time, so events arrive in page order. All
/// methods have default no-op implementations so callers only override what
/// they care about.
pub trait RunProgressCallback: Send + Sync {
    /// Called once after rasterisation, before the first enhancer call.
    ///
    /// # Arguments
    /// * `selected_pages` — pages that will be enhanced (1 in preview)
    /// * `total_pages`    — pages in the document
    fn on_run_start(&self, selected_pages: usize, total_pages: usize) {
        let _ = (selected_pages, total_pages);
    }

    /// Called just before the enhancer request is sent for a page.
    fn on_page_start(&self, page_num: usize, selected_pages: usize) {
        let _ = (page_num, selected_pages);
    }

    /// Called when the enhancer returned a replacement image.
    fn on_page_enhanced(&self, page_num: usize, selected_pages: usize) {
        let _ = (page_num, selected_pages);
    }

    /// Called when the original page is kept.
    ///
    /// # Arguments
    /// * `reason` — human-readable description of why enhancement failed
    fn on_page_unchanged(&self, page_num: usize, selected_pages: usize, reason: &str) {
        let _ = (page_num, selected_pages, reason);
    }

    /// Called before the resulting pages are combined into a PDF (Full mode only).
    fn on_assembly_start(&self, pages: usize) {
        let _ = pages;
    }

    /// Called once after an artifact has been produced.
    ///
    /// Not called when the run fails fatally.
    fn on_run_complete(&self, selected_pages: usize, enhanced_pages: usize) {
        let _ = (selected_pages, enhanced_pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::EnhanceConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCallback {
        events: Mutex<Vec<String>>,
    }

    impl RunProgressCallback for RecordingCallback {
        fn on_run_start(&self, selected: usize, total: usize) {
            self.events.lock().unwrap().push(format!("start {selected}/{total}"));
        }

        fn on_page_enhanced(&self, page: usize, _selected: usize) {
            self.events.lock().unwrap().push(format!("ok {page}"));
        }

        fn on_page_unchanged(&self, page: usize, _selected: usize, reason: &str) {
            self.events.lock().unwrap().push(format!("kept {page}: {reason}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(3, 3);
        cb.on_page_start(1, 3);
        cb.on_page_enhanced(1, 3);
        cb.on_page_unchanged(2, 3, "no image");
        cb.on_assembly_start(3);
        cb.on_run_complete(3, 2);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let cb = RecordingCallback::default();
        cb.on_run_start(1, 5);
        cb.on_page_start(1, 1);
        cb.on_page_unchanged(1, 1, "timeout");
        cb.on_page_enhanced(1, 1);

        let events = cb.events.lock().unwrap();
        assert_eq!(
            *events,
            vec!["start 1/5", "kept 1: timeout", "ok 1"]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_run_start(10, 10);
        cb.on_page_start(1, 10);
    }
}
