//! 撮影セッションの状態機械
//!
//! Pending → Capturing → Analyzing → Done
//!                ↓           ↓
//!              Failed      Failed
//!
//! 撮影中の失敗は途中までの画像を破棄する。解析の失敗は
//! 撮影済みの画像を残したままエラーを報告する。

use crate::error::{Error, Result};
use crate::types::{CapturedImage, Coordinates, RoofMeasurements};

/// 撮影する方位（度）。この順序で1枚ずつ撮影する
pub const CAPTURE_ANGLES: [u16; 6] = [0, 60, 120, 180, 240, 300];

/// 撮影セッションの状態
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureStatus {
    Pending,
    Capturing,
    Analyzing,
    Done,
    Failed { message: String },
}

impl CaptureStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CaptureStatus::Pending => "pending",
            CaptureStatus::Capturing => "capturing",
            CaptureStatus::Analyzing => "analyzing",
            CaptureStatus::Done => "done",
            CaptureStatus::Failed { .. } => "failed",
        }
    }
}

/// 1つの住所に対する撮影セッション
#[derive(Debug, Clone)]
pub struct CaptureSession {
    address: String,
    coordinates: Coordinates,
    angles: Vec<u16>,
    images: Vec<CapturedImage>,
    status: CaptureStatus,
    measurements: Option<RoofMeasurements>,
    attempts: u32,
}

impl CaptureSession {
    pub fn new(address: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            address: address.into(),
            coordinates,
            angles: CAPTURE_ANGLES.to_vec(),
            images: Vec::new(),
            status: CaptureStatus::Pending,
            measurements: None,
            attempts: 0,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn angles(&self) -> &[u16] {
        &self.angles
    }

    pub fn images(&self) -> &[CapturedImage] {
        &self.images
    }

    pub fn status(&self) -> &CaptureStatus {
        &self.status
    }

    /// 解析が完了している場合のみ計測値を返す
    pub fn measurements(&self) -> Option<&RoofMeasurements> {
        match self.status {
            CaptureStatus::Done => self.measurements.as_ref(),
            _ => None,
        }
    }

    /// begin() が呼ばれた回数
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// 撮影または解析の途中か
    pub fn is_active(&self) -> bool {
        matches!(self.status, CaptureStatus::Capturing | CaptureStatus::Analyzing)
    }

    /// 次に撮影すべき方位
    pub fn next_angle(&self) -> Option<u16> {
        match self.status {
            CaptureStatus::Capturing => self.angles.get(self.images.len()).copied(),
            _ => None,
        }
    }

    /// 撮影を開始（完了・失敗後の再撮影も可）
    pub fn begin(&mut self) -> Result<()> {
        if self.is_active() {
            return Err(Error::InvalidState("capture already in progress".into()));
        }
        self.images.clear();
        self.measurements = None;
        self.status = CaptureStatus::Capturing;
        self.attempts += 1;
        Ok(())
    }

    /// 撮影した1枚を追加。方位は角度順でなければならない
    pub fn record_frame(&mut self, image: CapturedImage) -> Result<()> {
        if self.status != CaptureStatus::Capturing {
            return Err(Error::InvalidState(format!(
                "cannot record a frame while {}",
                self.status.label()
            )));
        }
        match self.angles.get(self.images.len()) {
            Some(&expected) if expected == image.heading => {
                self.images.push(image);
                Ok(())
            }
            Some(&expected) => Err(Error::InvalidState(format!(
                "expected frame at {}°, got {}°",
                expected, image.heading
            ))),
            None => Err(Error::InvalidState("all angles already captured".into())),
        }
    }

    /// 撮影中の失敗。途中の画像は破棄する
    pub fn abort_capture(&mut self, message: impl Into<String>) {
        self.images.clear();
        self.measurements = None;
        self.status = CaptureStatus::Failed {
            message: message.into(),
        };
    }

    /// 全方位の撮影完了。解析対象（0°の1枚目）を返す
    pub fn finish_capture(&mut self) -> Result<&CapturedImage> {
        if self.status != CaptureStatus::Capturing {
            return Err(Error::InvalidState(format!(
                "cannot finish capture while {}",
                self.status.label()
            )));
        }
        if self.images.len() != self.angles.len() {
            return Err(Error::InvalidState(format!(
                "{} of {} angles captured",
                self.images.len(),
                self.angles.len()
            )));
        }
        self.status = CaptureStatus::Analyzing;
        self.images
            .first()
            .ok_or_else(|| Error::InvalidState("no frames captured".into()))
    }

    /// 解析成功
    pub fn complete(&mut self, measurements: RoofMeasurements) -> Result<()> {
        if self.status != CaptureStatus::Analyzing {
            return Err(Error::InvalidState(format!(
                "cannot complete analysis while {}",
                self.status.label()
            )));
        }
        self.measurements = Some(measurements);
        self.status = CaptureStatus::Done;
        Ok(())
    }

    /// 解析失敗。撮影済みの画像は残す
    pub fn fail_analysis(&mut self, message: impl Into<String>) {
        self.measurements = None;
        self.status = CaptureStatus::Failed {
            message: message.into(),
        };
    }
}

/// 撮影画像のラベル（"60°" など）
pub fn heading_label(heading: u16) -> String {
    format!("{}°", heading)
}
