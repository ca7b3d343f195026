use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use glance_core::{File, PeekConfig, PreviewState, QualityTier, ServiceError, Size, UiContext};
use glance_preview::{
    Artifact, HandleLedger, IconService, NativeBitmap, PreviewServices, PreviewerFactory,
    PreviewerKind, ThumbnailService,
};
use tempfile::TempDir;

/// Outcome of one scripted service call after a delay.
#[derive(Debug, Clone, Copy)]
enum Step {
    Ok(u64),
    Fail(u64),
}

impl Step {
    fn run<T>(self, path: &Path, what: &'static str, value: impl FnOnce() -> T) -> Result<T, ServiceError> {
        let (delay, ok) = match self {
            Step::Ok(ms) => (ms, true),
            Step::Fail(ms) => (ms, false),
        };
        std::thread::sleep(Duration::from_millis(delay));
        if ok {
            Ok(value())
        } else {
            Err(ServiceError::unavailable(path, what))
        }
    }
}

/// Thumbnail and icon services driven by a per-tier script.
struct Scripted {
    ledger: Arc<HandleLedger>,
    low: Step,
    high: Step,
    full: Step,
    icon: Step,
    info: Step,
    size: Option<Size>,
    probed: Option<Size>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(ledger: &Arc<HandleLedger>) -> Self {
        Self {
            ledger: Arc::clone(ledger),
            low: Step::Ok(0),
            high: Step::Ok(0),
            full: Step::Ok(0),
            icon: Step::Ok(0),
            info: Step::Ok(0),
            size: Some(Size::new(4000, 3000)),
            probed: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn bitmap(&self, edge: u32) -> NativeBitmap {
        self.ledger.acquire(Size::new(edge, edge), vec![0; 4])
    }
}

impl ThumbnailService for Scripted {
    fn thumbnail(&self, path: &Path, edge: u32) -> Result<NativeBitmap, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = if edge == PeekConfig::default().low_thumbnail_size {
            self.low
        } else {
            self.high
        };
        step.run(path, "thumbnail", || self.bitmap(edge))
    }

    fn decode_full(&self, path: &Path) -> Result<NativeBitmap, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.full.run(path, "image", || self.bitmap(4000))
    }

    fn image_size(&self, path: &Path) -> Result<Size, ServiceError> {
        self.size
            .ok_or_else(|| ServiceError::unavailable(path, "image size"))
    }

    fn probe_size(&self, path: &Path) -> Result<Size, ServiceError> {
        self.probed.ok_or_else(|| ServiceError::Unsupported {
            path: path.to_path_buf(),
        })
    }
}

impl IconService for Scripted {
    fn icon(&self, path: &Path) -> Result<NativeBitmap, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.icon.run(path, "icon", || self.bitmap(32))
    }

    fn file_size_bytes(&self, path: &Path) -> Result<u64, ServiceError> {
        self.info.run(path, "file size", || 1536)
    }

    fn file_type(&self, _path: &Path) -> Result<String, ServiceError> {
        Ok("File (.xyz)".to_string())
    }
}

struct Fixture {
    factory: PreviewerFactory,
    ledger: Arc<HandleLedger>,
    script: Arc<Scripted>,
}

fn fixture(configure: impl FnOnce(&mut Scripted)) -> Fixture {
    let ledger = HandleLedger::new();
    let mut script = Scripted::new(&ledger);
    configure(&mut script);
    let script = Arc::new(script);

    let services = PreviewServices::new(script.clone(), script.clone());
    let ui = UiContext::spawn().unwrap();
    Fixture {
        factory: PreviewerFactory::new(services, ui, PeekConfig::default()),
        ledger,
        script,
    }
}

fn file(name: &str) -> File {
    File::from_path(format!("/photos/{name}"))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scenario_heic_high_wins_over_slower_low() {
    let fx = fixture(|s| {
        s.low = Step::Ok(10);
        s.high = Step::Ok(5);
        s.full = Step::Fail(15);
    });
    let previewer = fx.factory.create(file("photo.heic"));
    assert_eq!(previewer.kind(), PreviewerKind::Image);

    let state = previewer.load_preview().await;
    assert_eq!(state, PreviewState::Loaded);
    assert!(previewer.is_preview_loaded());

    let artifact = previewer.current_artifact().unwrap();
    assert_eq!(artifact.tier(), QualityTier::HighThumbnail);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scenario_unsupported_metadata_only() {
    let fx = fixture(|s| {
        s.icon = Step::Fail(0);
        s.info = Step::Ok(5);
    });
    let previewer = fx.factory.create(file("file.xyz"));
    assert_eq!(previewer.kind(), PreviewerKind::Unsupported);

    assert_eq!(previewer.load_preview().await, PreviewState::Loaded);

    let Some(Artifact::Summary(summary)) = previewer.current_artifact() else {
        panic!("expected a summary artifact");
    };
    assert!(summary.icon.is_none());
    let info = summary.info.unwrap();
    assert_eq!(info.size_display, "1.50 KiB");
    assert_eq!(info.file_type, "File (.xyz)");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scenario_all_tiers_fail_is_error() {
    let fx = fixture(|s| {
        s.low = Step::Fail(2);
        s.high = Step::Fail(1);
        s.full = Step::Fail(3);
    });
    let previewer = fx.factory.create(file("corrupt.jpg"));

    assert_eq!(previewer.load_preview().await, PreviewState::Error);
    assert!(previewer.current_artifact().is_none());
    assert!(!previewer.is_preview_loaded());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_waits_for_every_tier() {
    let fx = fixture(|s| {
        s.low = Step::Fail(0);
        s.high = Step::Fail(0);
        s.full = Step::Ok(40);
    });
    let previewer = fx.factory.create(file("slow.jpg"));

    assert_eq!(previewer.load_preview().await, PreviewState::Loaded);
    assert_eq!(
        previewer.current_artifact().unwrap().tier(),
        QualityTier::FullResolution
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_visible_rank_never_decreases() {
    let fx = fixture(|s| {
        s.low = Step::Ok(30);
        s.high = Step::Ok(0);
        s.full = Step::Ok(15);
    });
    let previewer = fx.factory.create(file("a.jpg"));
    let mut artifacts = previewer.subscribe_artifact();
    let mut states = previewer.subscribe_state();

    let observer = tokio::spawn(async move {
        let mut ranks = Vec::new();
        while artifacts.changed().await.is_ok() {
            if let Some(artifact) = artifacts.borrow_and_update().as_ref() {
                ranks.push(artifact.rank());
            }
        }
        ranks
    });
    let state_observer = tokio::spawn(async move {
        let mut seen = vec![*states.borrow_and_update()];
        while states.changed().await.is_ok() {
            seen.push(*states.borrow_and_update());
        }
        seen
    });

    assert_eq!(previewer.load_preview().await, PreviewState::Loaded);
    drop(previewer);

    let ranks = observer.await.unwrap();
    assert!(!ranks.is_empty());
    assert!(ranks.windows(2).all(|w| w[0] <= w[1]), "ranks regressed: {ranks:?}");
    assert_eq!(ranks.last(), Some(&QualityTier::FullResolution.rank()));

    let seen = state_observer.await.unwrap();
    assert_eq!(seen.last(), Some(&PreviewState::Loaded));
    assert_eq!(seen.iter().filter(|s| s.is_terminal()).count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_load_preview_runs_once() {
    let fx = fixture(|_| {});
    let previewer = fx.factory.create(file("a.jpg"));

    assert_eq!(previewer.load_preview().await, PreviewState::Loaded);
    assert_eq!(previewer.load_preview().await, PreviewState::Loaded);
    assert_eq!(fx.script.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_is_idempotent_and_releases_handles() {
    let fx = fixture(|s| {
        s.low = Step::Ok(50);
        s.high = Step::Ok(50);
        s.full = Step::Ok(50);
    });
    let previewer = fx.factory.create(file("a.jpg"));

    let loader = {
        let previewer = Arc::clone(&previewer);
        tokio::spawn(async move { previewer.load_preview().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    previewer.cancel();
    previewer.cancel();
    previewer.dispose().await;
    previewer.dispose().await;

    let state = loader.await.unwrap();
    assert_ne!(state, PreviewState::Error);
    assert!(previewer.current_artifact().is_none());
    assert_eq!(fx.ledger.outstanding(), 0);
    assert_eq!(fx.ledger.acquired(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dispose_after_load_releases_handles() {
    let fx = fixture(|s| s.icon = Step::Ok(1));
    let previewer = fx.factory.create(file("file.xyz"));

    previewer.load_preview().await;
    previewer.dispose().await;

    assert!(previewer.is_cancelled());
    assert_eq!(fx.ledger.acquired(), 1);
    assert_eq!(fx.ledger.outstanding(), 0);
    assert_eq!(previewer.state(), PreviewState::Loaded);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_preview_size() {
    let fx = fixture(|_| {});
    let image = fx.factory.create(file("a.png"));
    let unsupported = fx.factory.create(file("file.xyz"));
    assert_eq!(image.preview_size().await, Size::new(4000, 3000));
    assert_eq!(unsupported.preview_size().await, Size::new(680, 500));

    let fx = fixture(|s| s.size = None);
    let image = fx.factory.create(file("a.jpg"));
    assert_eq!(image.preview_size().await, Size::new(680, 500));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_preview_size_probes_when_metadata_is_empty() {
    let fx = fixture(|s| {
        s.size = Some(Size::default());
        s.probed = Some(Size::new(123, 45));
    });
    let image = fx.factory.create(file("a.jpg"));
    assert_eq!(image.preview_size().await, Size::new(123, 45));

    let fx = fixture(|s| {
        s.size = None;
        s.probed = Some(Size::new(640, 480));
    });
    let image = fx.factory.create(file("a.jpg"));
    assert_eq!(image.preview_size().await, Size::new(640, 480));

    let fx = fixture(|s| s.size = Some(Size::default()));
    let image = fx.factory.create(file("a.jpg"));
    assert_eq!(image.preview_size().await, Size::new(680, 500));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_factory_dispatch() {
    let fx = fixture(|_| {});

    assert_eq!(fx.factory.kind_for(&file("IMG.HEIC")), PreviewerKind::Image);
    assert_eq!(fx.factory.kind_for(&file("logo.PNG")), PreviewerKind::Png);
    assert_eq!(fx.factory.kind_for(&file("report.docx")), PreviewerKind::Document);
    assert_eq!(fx.factory.kind_for(&file("index.html")), PreviewerKind::Web);
    assert_eq!(fx.factory.kind_for(&file("file.xyz")), PreviewerKind::Unsupported);
    assert_eq!(
        fx.factory.kind_for(&File::new("/photos/album.png", 0, None, true)),
        PreviewerKind::Unsupported
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_png_goes_straight_to_full_decode() {
    let fx = fixture(|s| s.full = Step::Ok(10));
    let previewer = fx.factory.create(file("logo.png"));
    assert_eq!(previewer.kind(), PreviewerKind::Png);

    assert_eq!(previewer.load_preview().await, PreviewState::Loaded);
    assert_eq!(fx.script.calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        previewer.current_artifact().unwrap().tier(),
        QualityTier::FullResolution
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_web_page_outranks_thumbnail() {
    let fx = fixture(|s| s.low = Step::Ok(20));
    let previewer = fx.factory.create(file("index.html"));

    assert_eq!(previewer.load_preview().await, PreviewState::Loaded);
    let artifact = previewer.current_artifact().unwrap();
    assert!(matches!(artifact, Artifact::Page { size_bytes: 1536, .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_filesystem_services_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pixel.png");
    image::RgbaImage::from_pixel(64, 48, image::Rgba([200, 10, 10, 255]))
        .save(&path)
        .unwrap();
    let corrupt = temp_dir.path().join("corrupt.jpg");
    std::fs::write(&corrupt, b"not a jpeg").unwrap();

    let ledger = HandleLedger::new();
    let ui = UiContext::spawn().unwrap();
    let factory = PreviewerFactory::new(
        PreviewServices::filesystem(Arc::clone(&ledger)),
        ui,
        PeekConfig::default(),
    );

    let previewer = factory.create(File::from_path(&path));
    assert_eq!(previewer.preview_size().await, Size::new(64, 48));
    assert_eq!(previewer.load_preview().await, PreviewState::Loaded);
    assert_eq!(
        previewer.current_artifact().unwrap().tier(),
        QualityTier::FullResolution
    );

    let broken = factory.create(File::from_path(&corrupt));
    assert_eq!(broken.load_preview().await, PreviewState::Error);

    previewer.dispose().await;
    broken.dispose().await;
    assert_eq!(ledger.outstanding(), 0);
}
