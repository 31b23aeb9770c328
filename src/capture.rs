//! 撮影ループと解析
//!
//! 方位を1つずつ設定し、描画が落ち着くまで待ってからフレームを取り出す。
//! 描画面は1つなので、前の方位の撮影が終わるまで次の方位へは進まない。

use crate::error::{Result, RoofError};
use crate::vision::RoofAnalyzer;
use crate::viewport::MapViewport;
use indicatif::ProgressBar;
use roof_estimate_common::{CaptureSession, CapturedImage, RoofMeasurements};
use base64::Engine;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 撮影・解析失敗時にユーザーへ表示するメッセージ
pub fn failure_message(cause: &impl Display) -> String {
    format!("Failed to capture or analyze images: {}", cause)
}

/// 描画面が未準備のときのメッセージ
pub fn not_ready_message(reason: Option<&str>) -> String {
    match reason {
        Some(reason) => format!("Map is not ready for capture: {}", reason),
        None => "Map is not ready for capture".to_string(),
    }
}

/// 全方位を順に撮影する
///
/// どれか1枚でも失敗したらセッションを Failed にし、途中の画像は破棄する。
pub async fn capture_angles<V: MapViewport + ?Sized>(
    session: &mut CaptureSession,
    viewport: &mut V,
    settle_delay: Duration,
    progress: &ProgressBar,
) -> Result<()> {
    if session.is_active() {
        return Err(RoofError::CaptureInProgress);
    }
    if !viewport.is_ready() {
        return Err(RoofError::ResourceNotReady(not_ready_message(
            viewport.not_ready_reason().as_deref(),
        )));
    }

    session.begin()?;
    let total = session.angles().len();
    progress.set_length(total as u64);
    progress.set_position(0);
    info!(address = %session.address(), angles = total, attempt = session.attempts(), "starting capture");

    while let Some(angle) = session.next_angle() {
        let frame: Result<CapturedImage> = async {
            viewport.set_heading(angle)?;
            tokio::time::sleep(settle_delay).await;
            viewport.snapshot().await
        }
        .await;

        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!(heading = angle, error = %e, "frame capture failed");
                session.abort_capture(failure_message(&e));
                progress.abandon();
                return Err(e);
            }
        };

        if let Err(e) = session.record_frame(frame) {
            warn!(heading = angle, error = %e, "frame rejected");
            session.abort_capture(failure_message(&e));
            progress.abandon();
            return Err(e.into());
        }

        debug!(heading = angle, "frame captured");
        progress.inc(1);
    }

    progress.finish();
    Ok(())
}

/// 1枚目（0°）の画像を解析してセッションを完了させる
///
/// 解析に失敗しても撮影済みの画像は残す。
pub async fn analyze_first_frame(
    session: &mut CaptureSession,
    analyzer: &dyn RoofAnalyzer,
) -> Result<RoofMeasurements> {
    let first = session.finish_capture()?;
    let heading = first.heading;
    let image_base64 = first.base64_data().map(str::to_string);

    let Some(image_base64) = image_base64 else {
        let e = RoofError::Snapshot("captured frame is not a base64 data URL".into());
        session.fail_analysis(failure_message(&e));
        return Err(e);
    };

    debug!(heading, "analyzing first frame");
    match analyzer.analyze(&image_base64).await {
        Ok(measurements) => {
            session.complete(measurements)?;
            Ok(measurements)
        }
        Err(e) => {
            warn!(error = %e, "roof analysis failed");
            session.fail_analysis(failure_message(&e));
            Err(e)
        }
    }
}

/// 撮影画像を `roof_{方位}.jpg` としてディレクトリへ書き出す
pub fn save_captured_images(images: &[CapturedImage], dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut paths = Vec::with_capacity(images.len());
    for image in images {
        let bytes = image
            .base64_data()
            .and_then(|data| base64::engine::general_purpose::STANDARD.decode(data).ok())
            .ok_or_else(|| {
                RoofError::InvalidResponse(format!(
                    "Captured image at {}° is not a base64 data URL",
                    image.heading
                ))
            })?;

        let extension = match image.mime_type() {
            "image/png" => "png",
            _ => "jpg",
        };
        let path = dir.join(format!("roof_{}.{}", image.heading, extension));
        std::fs::write(&path, bytes)?;
        debug!(path = %path.display(), "captured image saved");
        paths.push(path);
    }

    Ok(paths)
}
