//! 見積もりフロー全体のテスト
//!
//! 住所解決・画像解析・描画面を偽物に差し替えて、検索から費用表示までを通す。

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use indicatif::ProgressBar;
use roof_estimate::capture::save_captured_images;
use roof_estimate::error::{ErrorKind, Result, RoofError};
use roof_estimate::places::AddressResolver;
use roof_estimate::shell::Shell;
use roof_estimate::viewport::{MapViewport, StaticMapViewport};
use roof_estimate::vision::RoofAnalyzer;
use roof_estimate_common::address::{build_resolved_place, LOCALITY, ROUTE, STREET_NUMBER};
use roof_estimate_common::{
    AddressCandidate, AddressComponent, CaptureStatus, CapturedImage, Coordinates, PricePerSquare,
    ResolvedPlace, RoofMeasurements, CAPTURE_ANGLES,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

const COMPLETE_ID: &str = "place-complete";
const LOCALITY_ID: &str = "place-locality";

struct FakeResolver;

fn component(name: &str, kind: &str) -> AddressComponent {
    AddressComponent {
        long_name: name.to_string(),
        short_name: name.to_string(),
        types: vec![kind.to_string()],
    }
}

fn candidate(id: &str, description: &str) -> AddressCandidate {
    AddressCandidate {
        description: description.to_string(),
        id: id.to_string(),
        main_text: description.to_string(),
        secondary_text: String::new(),
        place_types: Vec::new(),
    }
}

#[async_trait]
impl AddressResolver for FakeResolver {
    async fn search(&self, text: &str) -> Result<Vec<AddressCandidate>> {
        if text.starts_with("123") {
            Ok(vec![
                candidate(COMPLETE_ID, "123 Test Street, City, State"),
                candidate(LOCALITY_ID, "City, State"),
            ])
        } else if text == "down" {
            Err(RoofError::Transport("connection refused".into()))
        } else {
            Ok(Vec::new())
        }
    }

    async fn resolve_details(&self, candidate_id: &str) -> Result<ResolvedPlace> {
        let coordinates = Coordinates::new(37.7749, -122.4194);
        match candidate_id {
            COMPLETE_ID => Ok(build_resolved_place(
                COMPLETE_ID.to_string(),
                "123 Test Street, City, State".to_string(),
                vec![
                    component("123", STREET_NUMBER),
                    component("Test Street", ROUTE),
                    component("City", LOCALITY),
                ],
                coordinates,
                vec!["street_address".to_string()],
            )),
            LOCALITY_ID => Ok(build_resolved_place(
                LOCALITY_ID.to_string(),
                "City, State".to_string(),
                vec![component("City", LOCALITY)],
                coordinates,
                vec!["locality".to_string()],
            )),
            _ => Err(RoofError::NotFound("Place details not found".into())),
        }
    }
}

struct FakeAnalyzer {
    result: std::result::Result<RoofMeasurements, String>,
    seen: Mutex<Vec<String>>,
}

impl FakeAnalyzer {
    fn ok() -> Self {
        Self {
            result: Ok(RoofMeasurements {
                area_sq_ft: 1000.0,
                perimeter_ft: 130.0,
                pitch_degrees: 30.0,
                confidence: 0.85,
            }),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RoofAnalyzer for FakeAnalyzer {
    async fn analyze(&self, image_base64: &str) -> Result<RoofMeasurements> {
        self.seen.lock().unwrap().push(image_base64.to_string());
        self.result
            .clone()
            .map_err(RoofError::Transport)
    }
}

struct FakeViewport {
    ready: bool,
    reason: Option<String>,
    heading: u16,
    fail_at: Option<u16>,
    headings: Vec<u16>,
    heading_at: Vec<Instant>,
    snapshot_at: Vec<Instant>,
}

impl FakeViewport {
    fn ready() -> Self {
        Self {
            ready: true,
            reason: None,
            heading: 0,
            fail_at: None,
            headings: Vec::new(),
            heading_at: Vec::new(),
            snapshot_at: Vec::new(),
        }
    }
}

#[async_trait]
impl MapViewport for FakeViewport {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn not_ready_reason(&self) -> Option<String> {
        self.reason.clone()
    }

    fn set_heading(&mut self, heading: u16) -> Result<()> {
        self.heading = heading;
        self.headings.push(heading);
        self.heading_at.push(Instant::now());
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<CapturedImage> {
        self.snapshot_at.push(Instant::now());
        if self.fail_at == Some(self.heading) {
            return Err(RoofError::Snapshot("Failed to capture image".into()));
        }
        Ok(CapturedImage::new(
            self.heading,
            format!("data:image/jpeg;base64,frame{}", self.heading),
        ))
    }
}

fn shell_with(analyzer: FakeAnalyzer) -> Shell {
    Shell::new(
        Arc::new(FakeResolver),
        Arc::new(analyzer),
        PricePerSquare::default(),
        Duration::ZERO,
    )
}

async fn shell_at_capture(analyzer: FakeAnalyzer) -> Shell {
    let mut shell = shell_with(analyzer);
    let ticket = shell.input_changed("123 Test").unwrap();
    assert!(shell.run_search(&ticket).await);
    shell.select_candidate(COMPLETE_ID).await.unwrap();
    shell.open_capture().unwrap();
    shell
}

/// 検索 → 選択 → 撮影 → 解析 → 費用
#[tokio::test]
async fn test_full_estimate_flow() {
    let mut shell = shell_with(FakeAnalyzer::ok());

    let ticket = shell.input_changed("123 Test").expect("search should start");
    assert!(shell.run_search(&ticket).await);
    assert_eq!(shell.state().search().candidates().len(), 2);
    assert!(shell.render().contains("1. 123 Test Street, City, State"));

    shell.select_candidate(COMPLETE_ID).await.unwrap();
    let selected = shell.state().selected().unwrap();
    assert_eq!(selected.coordinates, Coordinates::new(37.7749, -122.4194));
    assert_eq!(shell.state().search().input(), "123 Test Street, City, State");

    shell.open_capture().unwrap();
    let mut viewport = FakeViewport::ready();
    let measurements = shell
        .capture(&mut viewport, &ProgressBar::hidden())
        .await
        .unwrap();

    assert_eq!(viewport.headings, CAPTURE_ANGLES.to_vec());
    let session = shell.state().session().unwrap();
    let headings: Vec<u16> = session.images().iter().map(|i| i.heading).collect();
    assert_eq!(headings, CAPTURE_ANGLES.to_vec());
    assert_eq!(*session.status(), CaptureStatus::Done);
    assert_eq!(measurements.area_sq_ft, 1000.0);

    let estimate = shell.cost_estimate().unwrap();
    assert_eq!(estimate.total_cost, 4250.0);

    let text = shell.render();
    assert!(text.contains("Roof Area:   1,000 sq ft"));
    assert!(text.contains("Perimeter:   130 ft"));
    assert!(text.contains("Roof Pitch:  30°"));
    assert!(text.contains("Confidence:  85.0%"));
    assert!(text.contains("Estimated Cost:   $4,250"));
}

/// 解析には0°の1枚目だけを送る
#[tokio::test]
async fn test_only_first_frame_is_analyzed() {
    let analyzer = Arc::new(FakeAnalyzer::ok());
    let mut shell = Shell::new(
        Arc::new(FakeResolver),
        analyzer.clone(),
        PricePerSquare::default(),
        Duration::ZERO,
    );
    let ticket = shell.input_changed("123 Test").unwrap();
    shell.run_search(&ticket).await;
    shell.select_candidate(COMPLETE_ID).await.unwrap();
    shell.open_capture().unwrap();

    shell
        .capture(&mut FakeViewport::ready(), &ProgressBar::hidden())
        .await
        .unwrap();

    assert_eq!(*analyzer.seen.lock().unwrap(), vec!["frame0".to_string()]);
}

/// 単価を変えると費用だけが再計算される
#[tokio::test]
async fn test_price_change_recomputes_cost() {
    let mut shell = shell_at_capture(FakeAnalyzer::ok()).await;
    shell
        .capture(&mut FakeViewport::ready(), &ProgressBar::hidden())
        .await
        .unwrap();

    let estimate = shell.set_price(PricePerSquare::new(500)).unwrap();
    assert_eq!(estimate.total_cost, 5000.0);
    assert_eq!(estimate.area_sq_ft, 1000.0);

    let estimate = shell.set_price(PricePerSquare::new(10_000)).unwrap();
    assert_eq!(estimate.price_per_square.get(), 5000);
}

/// 解析前は費用を出さない
#[tokio::test]
async fn test_no_cost_before_analysis() {
    let mut shell = shell_at_capture(FakeAnalyzer::ok()).await;
    assert!(shell.set_price(PricePerSquare::new(500)).is_none());
    assert!(!shell.render().contains("Estimated Cost"));
}

/// 番地のない住所は拒否され、撮影へ進めない
#[tokio::test]
async fn test_locality_only_address_is_rejected() {
    let mut shell = shell_with(FakeAnalyzer::ok());
    let ticket = shell.input_changed("123 Test").unwrap();
    shell.run_search(&ticket).await;

    let err = shell.select_candidate(LOCALITY_ID).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BusinessRuleRejection);
    assert_eq!(
        shell.state().error(),
        Some("Please enter a complete street address")
    );
    assert!(shell.state().selected().is_none());
    assert!(shell.open_capture().is_err());
    assert!(shell.state().session().is_none());
}

/// 詳細取得の失敗はプレフィックス付きで表示
#[tokio::test]
async fn test_details_failure_message() {
    let mut shell = shell_with(FakeAnalyzer::ok());
    let err = shell.select_candidate("unknown").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    assert_eq!(
        shell.state().error(),
        Some("Error fetching address details: Place details not found")
    );
}

/// 候補取得の失敗
#[tokio::test]
async fn test_search_failure_shows_message() {
    let mut shell = shell_with(FakeAnalyzer::ok());
    let ticket = shell.input_changed("down").unwrap();
    assert!(shell.run_search(&ticket).await);
    assert!(shell.state().search().candidates().is_empty());
    assert!(shell
        .render()
        .contains("Failed to fetch address suggestions"));
}

/// 3文字未満では検索しない
#[tokio::test]
async fn test_short_input_does_not_search() {
    let mut shell = shell_with(FakeAnalyzer::ok());
    assert!(shell.input_changed("12").is_none());
    assert!(shell.state().search().candidates().is_empty());
}

/// 古い検索結果は表示されない
#[tokio::test]
async fn test_stale_results_are_discarded() {
    let mut shell = shell_with(FakeAnalyzer::ok());

    let first = shell.input_changed("123 Te").unwrap();
    assert!(shell.begin_search(&first));
    let second = shell.input_changed("123 Test").unwrap();

    let stale = vec![candidate("old", "123 Tenth Avenue")];
    assert!(!shell.apply_search(&first, Ok(stale)));
    assert!(shell.state().search().candidates().is_empty());

    assert!(shell.run_search(&second).await);
    let ids: Vec<&str> = shell
        .state()
        .search()
        .candidates()
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(ids, vec![COMPLETE_ID, LOCALITY_ID]);

    // 後から届いた古い応答も無視する
    assert!(!shell.apply_search(&first, Ok(vec![candidate("old", "123 Tenth Avenue")])));
    assert!(shell.state().search().candidate("old").is_none());
}

/// 解析失敗: 画像は残り、計測値は出ない
#[tokio::test]
async fn test_analysis_failure_keeps_images() {
    let mut shell = shell_at_capture(FakeAnalyzer::failing("Analysis service returned HTTP 500")).await;

    let err = shell
        .capture(&mut FakeViewport::ready(), &ProgressBar::hidden())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportFailure);

    let session = shell.state().session().unwrap();
    assert_eq!(session.images().len(), CAPTURE_ANGLES.len());
    assert!(session.measurements().is_none());
    assert!(matches!(session.status(), CaptureStatus::Failed { .. }));
    assert!(shell.cost_estimate().is_none());

    let text = shell.render();
    assert!(text.contains("Failed to capture or analyze images: Analysis service returned HTTP 500"));
    assert!(!text.contains("Roof Area"));
}

/// 撮影失敗: 途中の画像は破棄
#[tokio::test]
async fn test_snapshot_failure_discards_frames() {
    let mut shell = shell_at_capture(FakeAnalyzer::ok()).await;
    let mut viewport = FakeViewport {
        fail_at: Some(120),
        ..FakeViewport::ready()
    };

    shell
        .capture(&mut viewport, &ProgressBar::hidden())
        .await
        .unwrap_err();

    let session = shell.state().session().unwrap();
    assert!(session.images().is_empty());
    assert_eq!(
        *session.status(),
        CaptureStatus::Failed {
            message: "Failed to capture or analyze images: Snapshot failed: Failed to capture image"
                .to_string()
        }
    );
}

/// 失敗後の再撮影
#[tokio::test]
async fn test_retry_after_failure() {
    let mut shell = shell_at_capture(FakeAnalyzer::ok()).await;
    let mut viewport = FakeViewport {
        fail_at: Some(0),
        ..FakeViewport::ready()
    };
    assert!(shell.capture(&mut viewport, &ProgressBar::hidden()).await.is_err());

    viewport.fail_at = None;
    shell
        .capture(&mut viewport, &ProgressBar::hidden())
        .await
        .unwrap();
    assert_eq!(
        shell.state().session().unwrap().images().len(),
        CAPTURE_ANGLES.len()
    );
}

/// 描画面が未準備なら撮影しない
#[tokio::test]
async fn test_viewport_not_ready() {
    let mut shell = shell_at_capture(FakeAnalyzer::ok()).await;
    let mut viewport = FakeViewport {
        ready: false,
        ..FakeViewport::ready()
    };

    let err = shell
        .capture(&mut viewport, &ProgressBar::hidden())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotReady);
    assert!(viewport.headings.is_empty());
    assert_eq!(shell.state().error(), Some("Map is not ready for capture"));
    assert_eq!(
        *shell.state().session().unwrap().status(),
        CaptureStatus::Pending
    );
}

/// 撮影画面を開く前は撮影できない
#[tokio::test]
async fn test_capture_without_open_view() {
    let mut shell = shell_with(FakeAnalyzer::ok());
    let ticket = shell.input_changed("123 Test").unwrap();
    shell.run_search(&ticket).await;
    shell.select_candidate(COMPLETE_ID).await.unwrap();

    let err = shell
        .capture(&mut FakeViewport::ready(), &ProgressBar::hidden())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotReady);
}

/// 入力を変えても撮影セッションは残り、閉じる操作でのみ消える
#[tokio::test]
async fn test_close_capture_is_explicit() {
    let mut shell = shell_at_capture(FakeAnalyzer::ok()).await;
    shell.input_changed("456 Other");
    assert!(shell.state().session().is_some());

    shell.close_capture();
    assert!(shell.state().session().is_none());
}

/// 静止画像から作った描画面で実際にJPEGを撮影する
#[tokio::test]
async fn test_static_viewport_capture() {
    let mut shell = shell_at_capture(FakeAnalyzer::ok()).await;
    let image = RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 128]));
    let mut viewport = StaticMapViewport::from_image(Coordinates::new(37.7749, -122.4194), image);

    shell
        .capture(&mut viewport, &ProgressBar::hidden())
        .await
        .unwrap();

    let session = shell.state().session().unwrap();
    assert_eq!(session.images().len(), CAPTURE_ANGLES.len());
    for image in session.images() {
        assert!(image.data_url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(image.mime_type(), "image/jpeg");
    }
}

/// 再撮影が開始前に失敗したら、前回の失敗ではなく今回の原因を出す
#[tokio::test]
async fn test_retry_failure_before_start_is_reported() {
    let mut shell = shell_at_capture(FakeAnalyzer::ok()).await;
    let mut viewport = FakeViewport {
        fail_at: Some(0),
        ..FakeViewport::ready()
    };
    assert!(shell.capture(&mut viewport, &ProgressBar::hidden()).await.is_err());
    assert!(shell.state().error().is_none());

    viewport.ready = false;
    let err = shell
        .capture(&mut viewport, &ProgressBar::hidden())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotReady);
    assert_eq!(shell.state().error(), Some("Map is not ready for capture"));
    assert!(shell.render().contains("Error: Map is not ready for capture"));
}

/// 開始後の失敗はセッション側だけに出し、前回のエラー行は消す
#[tokio::test]
async fn test_recorded_failure_clears_previous_error_line() {
    let mut shell = shell_at_capture(FakeAnalyzer::ok()).await;
    let mut viewport = FakeViewport {
        ready: false,
        ..FakeViewport::ready()
    };
    assert!(shell.capture(&mut viewport, &ProgressBar::hidden()).await.is_err());
    assert!(shell.state().error().is_some());

    viewport.ready = true;
    viewport.fail_at = Some(60);
    assert!(shell.capture(&mut viewport, &ProgressBar::hidden()).await.is_err());
    assert!(shell.state().error().is_none());
    assert!(matches!(
        shell.state().session().unwrap().status(),
        CaptureStatus::Failed { .. }
    ));
}

/// 地図の初期化失敗の原因をエラー行に含める
#[tokio::test]
async fn test_not_ready_reason_is_shown() {
    let mut shell = shell_at_capture(FakeAnalyzer::ok()).await;
    let mut viewport = FakeViewport {
        ready: false,
        reason: Some("Failed to load map: HTTP 403 Forbidden".into()),
        ..FakeViewport::ready()
    };

    shell
        .capture(&mut viewport, &ProgressBar::hidden())
        .await
        .unwrap_err();
    assert_eq!(
        shell.state().error(),
        Some("Map is not ready for capture: Failed to load map: HTTP 403 Forbidden")
    );
}

/// 方位ごとに待ち時間を置いてから撮影する
#[tokio::test(start_paused = true)]
async fn test_settle_delay_before_each_snapshot() {
    let settle_delay = Duration::from_millis(1000);
    let mut shell = Shell::new(
        Arc::new(FakeResolver),
        Arc::new(FakeAnalyzer::ok()),
        PricePerSquare::default(),
        settle_delay,
    );
    let ticket = shell.input_changed("123 Test").unwrap();
    shell.run_search(&ticket).await;
    shell.select_candidate(COMPLETE_ID).await.unwrap();
    shell.open_capture().unwrap();

    let mut viewport = FakeViewport::ready();
    let started = Instant::now();
    shell
        .capture(&mut viewport, &ProgressBar::hidden())
        .await
        .unwrap();

    assert!(started.elapsed() >= settle_delay * CAPTURE_ANGLES.len() as u32);
    assert_eq!(viewport.heading_at.len(), CAPTURE_ANGLES.len());
    assert_eq!(viewport.snapshot_at.len(), CAPTURE_ANGLES.len());
    for (set_at, shot_at) in viewport.heading_at.iter().zip(&viewport.snapshot_at) {
        assert!(*shot_at - *set_at >= settle_delay);
    }
}

/// 解析に失敗しても撮影画像はファイルに書き出せる
#[tokio::test]
async fn test_frames_saved_after_analysis_failure() {
    let mut shell = shell_at_capture(FakeAnalyzer::failing("Analysis service returned HTTP 500")).await;
    let image = RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 128]));
    let mut viewport = StaticMapViewport::from_image(Coordinates::new(37.7749, -122.4194), image);
    assert!(shell.capture(&mut viewport, &ProgressBar::hidden()).await.is_err());

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let images = shell.state().session().unwrap().images();
    let paths = save_captured_images(images, dir.path()).unwrap();

    assert_eq!(paths.len(), CAPTURE_ANGLES.len());
    for angle in CAPTURE_ANGLES {
        let bytes = std::fs::read(dir.path().join(format!("roof_{}.jpg", angle))).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
