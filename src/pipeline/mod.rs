//! Pipeline stages for PDF text enhancement.
//!
//! Each submodule implements one step. The three heavy stages sit behind
//! traits ([`render::Rasterizer`], [`enhance::PageEnhancer`],
//! [`assemble::Assembler`]) so the controller in [`crate::run`] can be
//! driven with substitutes in tests.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ enhance (per page) ──▶ assemble | encode
//! (URL/path) (pdfium)  (Gemini, passthrough)   (lopdf)    (PNG preview)
//! ```
//!
//! 1. [`input`]    — read the local file or download the URL, check `%PDF`
//! 2. [`render`]   — rasterise pages; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`enhance`]  — one enhancer call per page, in order; a failed page
//!    keeps its original image
//! 4. [`assemble`] — one image per PDF page, lossless (full mode)
//! 5. [`encode`]   — PNG for the preview artifact and the API payload
//!
//! [`gemini`] is the production enhancer, [`pdfium`] locates the native
//! library, and [`compare`] builds the before/after image.

pub mod assemble;
pub mod compare;
pub mod encode;
pub mod enhance;
pub mod gemini;
pub mod input;
pub mod pdfium;
pub mod render;
