//! Pipeline tests with in-process collaborators.
//!
//! The rasterizer, enhancer and assembler are replaced by scripted
//! implementations so every run is deterministic and needs neither pdfium
//! nor network access. The real `PdfImageAssembler` is used wherever the
//! assembled PDF itself is inspected.

use async_trait::async_trait;
use edgequake_pdf_enhance::{
    run, run_document, run_sync, run_to_file, Assembler, AspectRatio, AssemblyPage, DocumentInfo,
    EnhanceConfig,
    EnhanceError, EnhancementRequest, EnhancerError, GenerationSettings, InputDocument,
    OutputArtifact, PageEnhancer, PageError, PdfImageAssembler, RasterRequest, RasterizedDocument,
    Rasterizer, RunMode, RunProgressCallback,
};
use edgequake_pdf_enhance::pipeline::assemble::points_for;
use image::{DynamicImage, Rgb, RgbImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const FAKE_PDF: &[u8] = b"%PDF-1.7\n% scripted\n%%EOF\n";

// ── Mock collaborators ───────────────────────────────────────────────────────

fn solid(v: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 10, Rgb([v, v / 2, 255 - v])))
}

fn original_pages(n: usize) -> Vec<DynamicImage> {
    (0..n).map(|i| solid(10 + i as u8 * 40)).collect()
}

/// The image an enhancer "returns" for page `page_num`.
fn enhanced(page_num: usize) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 10, Rgb([200, page_num as u8, 1])))
}

struct MockRasterizer {
    pages: Vec<DynamicImage>,
    fail: bool,
    calls: AtomicUsize,
    last_request: Mutex<Option<RasterRequest>>,
}

impl MockRasterizer {
    fn with_pages(n: usize) -> Arc<Self> {
        Arc::new(Self {
            pages: original_pages(n),
            fail: false,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            pages: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Rasterizer for MockRasterizer {
    fn rasterize(&self, _pdf: &[u8], request: &RasterRequest) -> Result<RasterizedDocument, EnhanceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        if self.fail {
            return Err(EnhanceError::CorruptPdf {
                detail: "xref table is damaged".into(),
            });
        }
        let limit = request.page_limit.unwrap_or(self.pages.len());
        Ok(RasterizedDocument {
            total_pages: self.pages.len(),
            pages: self.pages.iter().take(limit).cloned().collect(),
        })
    }

    fn inspect(&self, _pdf: &[u8], _password: Option<&str>) -> Result<DocumentInfo, EnhanceError> {
        Ok(DocumentInfo {
            page_count: self.pages.len(),
            pdf_version: "1.7".into(),
            ..Default::default()
        })
    }
}

#[derive(Clone, Copy)]
enum Reply {
    Image,
    /// A square image at a different resolution than the page.
    Resized,
    Nothing,
    Fail,
}

/// Answers page *i* with `script[i - 1]`; pages past the script succeed.
struct ScriptedEnhancer {
    script: Vec<Reply>,
    calls: AtomicUsize,
    pages_seen: Mutex<Vec<usize>>,
    instructions: Mutex<Vec<String>>,
    settings: Mutex<Vec<GenerationSettings>>,
}

impl ScriptedEnhancer {
    fn new(script: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            pages_seen: Mutex::new(Vec::new()),
            instructions: Mutex::new(Vec::new()),
            settings: Mutex::new(Vec::new()),
        })
    }

    fn always_succeeds() -> Arc<Self> {
        Self::new(Vec::new())
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageEnhancer for ScriptedEnhancer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn enhance(&self, request: EnhancementRequest<'_>) -> Result<Option<DynamicImage>, EnhancerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages_seen.lock().unwrap().push(request.page_num);
        self.instructions
            .lock()
            .unwrap()
            .push(request.instruction.to_string());
        self.settings.lock().unwrap().push(request.settings.clone());

        match self
            .script
            .get(request.page_num - 1)
            .copied()
            .unwrap_or(Reply::Image)
        {
            Reply::Image => Ok(Some(enhanced(request.page_num))),
            Reply::Resized => Ok(Some(DynamicImage::ImageRgb8(RgbImage::from_pixel(
                32,
                32,
                Rgb([90, 90, 90]),
            )))),
            Reply::Nothing => Ok(None),
            Reply::Fail => Err(EnhancerError::Api {
                status: 500,
                message: "internal error".into(),
            }),
        }
    }
}

/// Records what it is asked to assemble, then delegates or fails.
struct RecordingAssembler {
    fail: bool,
    calls: AtomicUsize,
    received: Mutex<Vec<AssemblyPage>>,
    dpi: Mutex<Option<u32>>,
}

impl RecordingAssembler {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
            dpi: Mutex::new(None),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
            dpi: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn received(&self) -> Vec<DynamicImage> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|page| page.image.clone())
            .collect()
    }

    fn rendered_sizes(&self) -> Vec<(u32, u32)> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|page| (page.rendered_width, page.rendered_height))
            .collect()
    }
}

impl Assembler for RecordingAssembler {
    fn assemble(&self, pages: &[AssemblyPage], dpi: u32) -> Result<Vec<u8>, EnhanceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.received.lock().unwrap() = pages.to_vec();
        *self.dpi.lock().unwrap() = Some(dpi);
        if self.fail {
            return Err(EnhanceError::AssemblyFailed {
                pages: pages.len(),
                detail: "disk full".into(),
            });
        }
        PdfImageAssembler::default().assemble(pages, dpi)
    }
}

fn config(
    rasterizer: &Arc<MockRasterizer>,
    enhancer: &Arc<ScriptedEnhancer>,
    assembler: &Arc<RecordingAssembler>,
) -> edgequake_pdf_enhance::EnhanceConfigBuilder {
    EnhanceConfig::builder()
        .rasterizer(rasterizer.clone() as Arc<dyn Rasterizer>)
        .enhancer(enhancer.clone() as Arc<dyn PageEnhancer>)
        .assembler(assembler.clone() as Arc<dyn Assembler>)
        .api_timeout_secs(5)
}

fn same_pixels(a: &DynamicImage, b: &DynamicImage) -> bool {
    a.to_rgb8() == b.to_rgb8()
}

fn pdf_page_count(pdf: &[u8]) -> usize {
    lopdf::Document::load_mem(pdf).unwrap().get_pages().len()
}

// ── Full mode ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_mode_keeps_every_page_in_order() {
    let rasterizer = MockRasterizer::with_pages(4);
    let enhancer = ScriptedEnhancer::always_succeeds();
    let assembler = RecordingAssembler::new();
    let cfg = config(&rasterizer, &enhancer, &assembler).build().unwrap();

    let output = run(FAKE_PDF, &cfg).await.unwrap();

    let pdf = match output.artifact {
        OutputArtifact::Pdf(ref bytes) => bytes.clone(),
        ref other => panic!("expected a PDF, got {}", other.extension()),
    };
    assert_eq!(pdf_page_count(&pdf), 4);

    let received = assembler.received();
    assert_eq!(received.len(), 4);
    for (i, img) in received.iter().enumerate() {
        assert!(same_pixels(img, &enhanced(i + 1)), "page {} out of order", i + 1);
    }
    assert_eq!(*enhancer.pages_seen.lock().unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(output.stats.total_pages, 4);
    assert_eq!(output.stats.enhanced_pages, 4);
    assert_eq!(output.stats.unchanged_pages, 0);
    assert_eq!(output.suggested_file_name(), "optimized_document.pdf");
}

#[tokio::test]
async fn successful_page_uses_returned_image() {
    let rasterizer = MockRasterizer::with_pages(1);
    let enhancer = ScriptedEnhancer::new(vec![Reply::Image]);
    let assembler = RecordingAssembler::new();
    let cfg = config(&rasterizer, &enhancer, &assembler).build().unwrap();

    let output = run(FAKE_PDF, &cfg).await.unwrap();

    assert!(same_pixels(&assembler.received()[0], &enhanced(1)));
    assert_eq!(output.stats.enhanced_pages, 1);
    assert_eq!(output.stats.unchanged_pages, 0);
    assert!(output.pages[0].enhanced);
    assert!(output.pages[0].error.is_none());
}

#[tokio::test]
async fn missing_image_keeps_original_bit_for_bit() {
    let rasterizer = MockRasterizer::with_pages(2);
    let enhancer = ScriptedEnhancer::new(vec![Reply::Image, Reply::Nothing]);
    let assembler = RecordingAssembler::new();
    let cfg = config(&rasterizer, &enhancer, &assembler).build().unwrap();

    let output = run(FAKE_PDF, &cfg).await.unwrap();

    let received = assembler.received();
    assert!(same_pixels(&received[1], &original_pages(2)[1]));
    assert_eq!(output.stats.enhanced_pages, 1);
    assert_eq!(output.stats.unchanged_pages, 1);
    assert_eq!(output.pages[1].error, Some(PageError::NoImageReturned { page: 2 }));
}

#[tokio::test]
async fn mixed_outcomes_three_pages_wide_ratio() {
    let rasterizer = MockRasterizer::with_pages(3);
    let enhancer = ScriptedEnhancer::new(vec![Reply::Image, Reply::Fail, Reply::Image]);
    let assembler = RecordingAssembler::new();
    let cfg = config(&rasterizer, &enhancer, &assembler)
        .dpi(300)
        .aspect_ratio(AspectRatio::Landscape16x9)
        .mode(RunMode::Full)
        .build()
        .unwrap();

    let output = run(FAKE_PDF, &cfg).await.unwrap();

    assert_eq!(pdf_page_count(output.artifact.bytes()), 3);
    let received = assembler.received();
    let originals = original_pages(3);
    assert!(same_pixels(&received[0], &enhanced(1)));
    assert!(same_pixels(&received[1], &originals[1]));
    assert!(same_pixels(&received[2], &enhanced(3)));

    assert_eq!(output.stats.enhanced_pages, 2);
    assert_eq!(output.stats.unchanged_pages, 1);
    match output.pages[1].error {
        Some(PageError::EnhancementFailed { page, ref detail }) => {
            assert_eq!(page, 2);
            assert!(detail.contains("internal error"), "{detail}");
        }
        ref other => panic!("unexpected {other:?}"),
    }

    assert_eq!(*assembler.dpi.lock().unwrap(), Some(300));
    assert_eq!(rasterizer.last_request.lock().unwrap().as_ref().map(|r| r.dpi), Some(300));
    for settings in enhancer.settings.lock().unwrap().iter() {
        assert_eq!(settings.aspect_ratio, AspectRatio::Landscape16x9);
    }
}

/// `[llx, lly, urx, ury]` of every page, in order.
fn media_boxes(pdf: &[u8]) -> Vec<Vec<f64>> {
    let doc = lopdf::Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            doc.get_dictionary(id)
                .unwrap()
                .get(b"MediaBox")
                .unwrap()
                .as_array()
                .unwrap()
                .iter()
                .map(|v| match v {
                    lopdf::Object::Integer(i) => *i as f64,
                    lopdf::Object::Real(r) => *r as f64,
                    other => panic!("not a number: {other:?}"),
                })
                .collect()
        })
        .collect()
}

#[tokio::test]
async fn resized_reply_keeps_the_page_size_of_the_input() {
    let rasterizer = MockRasterizer::with_pages(2);
    let enhancer = ScriptedEnhancer::new(vec![Reply::Resized, Reply::Nothing]);
    let assembler = RecordingAssembler::new();
    let cfg = config(&rasterizer, &enhancer, &assembler)
        .dpi(300)
        .build()
        .unwrap();

    let output = run(FAKE_PDF, &cfg).await.unwrap();

    let received = assembler.received();
    assert_eq!((received[0].width(), received[0].height()), (32, 32));
    assert_eq!(assembler.rendered_sizes(), vec![(8, 10), (8, 10)]);

    let expected_w = points_for(8, 300) as f64;
    let expected_h = points_for(10, 300) as f64;
    let boxes = media_boxes(output.artifact.bytes());
    assert_eq!(boxes.len(), 2);
    for (i, media_box) in boxes.iter().enumerate() {
        assert!((media_box[2] - expected_w).abs() < 0.01, "page {}: {media_box:?}", i + 1);
        assert!((media_box[3] - expected_h).abs() < 0.01, "page {}: {media_box:?}", i + 1);
    }
    assert_eq!(output.pages[0].width, 32);
    assert!(output.pages[0].enhanced);
    assert!(!output.pages[1].enhanced);
}

#[tokio::test]
async fn every_call_gets_the_same_instruction() {
    let rasterizer = MockRasterizer::with_pages(2);
    let enhancer = ScriptedEnhancer::always_succeeds();
    let assembler = RecordingAssembler::new();
    let cfg = config(&rasterizer, &enhancer, &assembler)
        .instruction("make the letters crisp")
        .build()
        .unwrap();

    run(FAKE_PDF, &cfg).await.unwrap();

    let instructions = enhancer.instructions.lock().unwrap();
    assert_eq!(instructions.len(), 2);
    assert!(instructions.iter().all(|i| i == "make the letters crisp"));
}

// ── Preview mode ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn preview_enhances_only_the_first_page() {
    let rasterizer = MockRasterizer::with_pages(3);
    let enhancer = ScriptedEnhancer::always_succeeds();
    let assembler = RecordingAssembler::new();
    let cfg = config(&rasterizer, &enhancer, &assembler)
        .mode(RunMode::Preview)
        .build()
        .unwrap();

    let output = run_document(&InputDocument::new("scan.pdf", FAKE_PDF.to_vec()), &cfg)
        .await
        .unwrap();

    assert_eq!(enhancer.calls(), 1);
    assert_eq!(assembler.calls(), 0);
    assert_eq!(
        rasterizer.last_request.lock().unwrap().as_ref().and_then(|r| r.page_limit),
        Some(1)
    );
    assert_eq!(output.stats.total_pages, 3);
    assert_eq!(output.stats.processed_pages, 1);
    assert_eq!(output.pages.len(), 1);
    assert_eq!(output.suggested_file_name(), "preview_scan.png");

    let png = match output.artifact {
        OutputArtifact::Png(ref bytes) => bytes,
        ref other => panic!("expected a PNG, got {}", other.extension()),
    };
    let decoded = image::load_from_memory(png).unwrap();
    assert!(same_pixels(&decoded, &enhanced(1)));
}

#[tokio::test]
async fn preview_of_a_failed_page_is_the_original() {
    let rasterizer = MockRasterizer::with_pages(3);
    let enhancer = ScriptedEnhancer::new(vec![Reply::Fail]);
    let assembler = RecordingAssembler::new();
    let cfg = config(&rasterizer, &enhancer, &assembler)
        .mode(RunMode::Preview)
        .build()
        .unwrap();

    let output = run(FAKE_PDF, &cfg).await.unwrap();

    let decoded = image::load_from_memory(output.artifact.bytes()).unwrap();
    assert!(same_pixels(&decoded, &original_pages(1)[0]));
    assert_eq!(output.stats.total_pages, 3);
    assert_eq!(output.stats.enhanced_pages, 0);
    assert_eq!(output.stats.unchanged_pages, 1);
}

#[tokio::test]
async fn first_page_pair_is_reported() {
    let rasterizer = MockRasterizer::with_pages(2);
    let enhancer = ScriptedEnhancer::always_succeeds();
    let assembler = RecordingAssembler::new();
    let cfg = config(&rasterizer, &enhancer, &assembler).build().unwrap();

    let output = run(FAKE_PDF, &cfg).await.unwrap();

    assert!(same_pixels(&output.first_page.original, &original_pages(1)[0]));
    assert!(same_pixels(&output.first_page.result, &enhanced(1)));
}

// ── Fatal failures ───────────────────────────────────────────────────────────

#[tokio::test]
async fn rasterization_failure_stops_before_enhancing() {
    let rasterizer = MockRasterizer::failing();
    let enhancer = ScriptedEnhancer::always_succeeds();
    let assembler = RecordingAssembler::new();
    let cfg = config(&rasterizer, &enhancer, &assembler).build().unwrap();

    let err = run(FAKE_PDF, &cfg).await.unwrap_err();

    assert!(err.is_rasterization_failure(), "{err}");
    assert_eq!(rasterizer.calls(), 1);
    assert_eq!(enhancer.calls(), 0);
    assert_eq!(assembler.calls(), 0);
}

#[tokio::test]
async fn assembly_failure_discards_the_run() {
    let rasterizer = MockRasterizer::with_pages(3);
    let enhancer = ScriptedEnhancer::always_succeeds();
    let assembler = RecordingAssembler::failing();
    let cfg = config(&rasterizer, &enhancer, &assembler).build().unwrap();

    let err = run(FAKE_PDF, &cfg).await.unwrap_err();

    assert!(err.is_assembly_failure(), "{err}");
    assert_eq!(enhancer.calls(), 3);
    assert_eq!(assembler.calls(), 1);
}

#[tokio::test]
async fn non_pdf_bytes_are_rejected_before_rendering() {
    let rasterizer = MockRasterizer::with_pages(1);
    let enhancer = ScriptedEnhancer::always_succeeds();
    let assembler = RecordingAssembler::new();
    let cfg = config(&rasterizer, &enhancer, &assembler).build().unwrap();

    let err = run(b"\x89PNG\r\n", &cfg).await.unwrap_err();

    assert!(matches!(err, EnhanceError::NotAPdf { .. }), "{err}");
    assert_eq!(rasterizer.calls(), 0);
    assert_eq!(enhancer.calls(), 0);
}

#[tokio::test]
async fn invalid_dpi_fails_before_any_call() {
    let rasterizer = MockRasterizer::with_pages(1);
    let enhancer = ScriptedEnhancer::always_succeeds();
    let assembler = RecordingAssembler::new();
    let mut cfg = config(&rasterizer, &enhancer, &assembler).build().unwrap();
    cfg.dpi = 100;

    let err = run(FAKE_PDF, &cfg).await.unwrap_err();

    assert!(matches!(err, EnhanceError::InvalidConfig(_)), "{err}");
    assert_eq!(rasterizer.calls(), 0);
    assert_eq!(enhancer.calls(), 0);
}

#[test]
fn unknown_aspect_ratio_is_a_config_error() {
    let err = "7:3".parse::<AspectRatio>().unwrap_err();
    assert!(matches!(err, EnhanceError::InvalidConfig(_)));
}

#[tokio::test]
async fn missing_api_key_fails_before_rendering() {
    std::env::remove_var("GOOGLE_CLOUD_API_KEY");
    std::env::remove_var("GEMINI_API_KEY");

    let rasterizer = MockRasterizer::with_pages(1);
    let cfg = EnhanceConfig::builder()
        .rasterizer(rasterizer.clone() as Arc<dyn Rasterizer>)
        .build()
        .unwrap();

    let err = run(FAKE_PDF, &cfg).await.unwrap_err();

    assert!(matches!(err, EnhanceError::EnhancerNotConfigured { .. }), "{err}");
    assert_eq!(rasterizer.calls(), 0);
}

// ── Progress events ──────────────────────────────────────────────────────────

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl RunProgressCallback for EventLog {
    fn on_run_start(&self, selected_pages: usize, total_pages: usize) {
        self.0.lock().unwrap().push(format!("start {selected_pages}/{total_pages}"));
    }
    fn on_page_start(&self, page_num: usize, _selected: usize) {
        self.0.lock().unwrap().push(format!("page {page_num}"));
    }
    fn on_page_enhanced(&self, page_num: usize, _selected: usize) {
        self.0.lock().unwrap().push(format!("enhanced {page_num}"));
    }
    fn on_page_unchanged(&self, page_num: usize, _selected: usize, _reason: &str) {
        self.0.lock().unwrap().push(format!("unchanged {page_num}"));
    }
    fn on_assembly_start(&self, pages: usize) {
        self.0.lock().unwrap().push(format!("assemble {pages}"));
    }
    fn on_run_complete(&self, selected_pages: usize, enhanced_pages: usize) {
        self.0
            .lock()
            .unwrap()
            .push(format!("done {enhanced_pages}/{selected_pages}"));
    }
}

#[tokio::test]
async fn progress_events_arrive_in_page_order() {
    let rasterizer = MockRasterizer::with_pages(2);
    let enhancer = ScriptedEnhancer::new(vec![Reply::Nothing, Reply::Image]);
    let assembler = RecordingAssembler::new();
    let log = Arc::new(EventLog::default());
    let cfg = config(&rasterizer, &enhancer, &assembler)
        .progress_callback(log.clone() as Arc<dyn RunProgressCallback>)
        .build()
        .unwrap();

    run(FAKE_PDF, &cfg).await.unwrap();

    assert_eq!(
        *log.0.lock().unwrap(),
        vec![
            "start 2/2",
            "page 1",
            "unchanged 1",
            "page 2",
            "enhanced 2",
            "assemble 2",
            "done 1/2",
        ]
    );
}

#[tokio::test]
async fn failed_run_never_reports_completion() {
    let rasterizer = MockRasterizer::with_pages(1);
    let enhancer = ScriptedEnhancer::always_succeeds();
    let assembler = RecordingAssembler::failing();
    let log = Arc::new(EventLog::default());
    let cfg = config(&rasterizer, &enhancer, &assembler)
        .progress_callback(log.clone() as Arc<dyn RunProgressCallback>)
        .build()
        .unwrap();

    assert!(run(FAKE_PDF, &cfg).await.is_err());
    assert!(!log.0.lock().unwrap().iter().any(|e| e.starts_with("done")));
}

// ── File and sync entry points ───────────────────────────────────────────────

#[tokio::test]
async fn run_to_file_writes_the_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("letters.pdf");
    std::fs::write(&input, FAKE_PDF).unwrap();
    let out = dir.path().join("out").join("clean.pdf");

    let rasterizer = MockRasterizer::with_pages(2);
    let enhancer = ScriptedEnhancer::always_succeeds();
    let assembler = RecordingAssembler::new();
    let cfg = config(&rasterizer, &enhancer, &assembler).build().unwrap();

    let output = run_to_file(input.to_str().unwrap(), &out, &cfg).await.unwrap();

    assert_eq!(output.document_name, "letters.pdf");
    let written = std::fs::read(&out).unwrap();
    assert_eq!(written, output.artifact.bytes());
    assert_eq!(pdf_page_count(&written), 2);
}

#[test]
fn sync_wrapper_runs_the_pipeline() {
    let rasterizer = MockRasterizer::with_pages(1);
    let enhancer = ScriptedEnhancer::always_succeeds();
    let assembler = RecordingAssembler::new();
    let cfg = config(&rasterizer, &enhancer, &assembler).build().unwrap();

    let output = run_sync(FAKE_PDF, &cfg).unwrap();
    assert_eq!(output.stats.enhanced_pages, 1);
}

#[test]
fn run_report_serialises_without_images() {
    let rasterizer = MockRasterizer::with_pages(1);
    let enhancer = ScriptedEnhancer::new(vec![Reply::Nothing]);
    let assembler = RecordingAssembler::new();
    let cfg = config(&rasterizer, &enhancer, &assembler).build().unwrap();

    let output = run_sync(FAKE_PDF, &cfg).unwrap();
    let json = serde_json::to_value(&output).unwrap();

    assert_eq!(json["mode"], "full");
    assert_eq!(json["stats"]["unchanged_pages"], 1);
    assert!(json.get("artifact").is_none());
    assert!(json["pages"][0]["error"].is_object());
}
