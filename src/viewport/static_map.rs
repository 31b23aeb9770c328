//! Static Maps API を使ったビューポート
//!
//! mount() で中心座標の衛星画像を1枚取得し、以降のフレームは
//! その画像を方位に合わせて回転させて生成する。

use super::MapViewport;
use crate::config::Config;
use crate::error::{Result, RoofError};
use async_trait::async_trait;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use reqwest::Client;
use roof_estimate_common::{CapturedImage, Coordinates};
use std::time::Duration;
use tracing::{debug, warn};

const STATIC_MAP_URL: &str = "https://maps.googleapis.com/maps/api/staticmap";
const JPEG_QUALITY: u8 = 85;

/// 画像を中心まわりに回転（最近傍補間、範囲外は黒）
///
/// `degrees` はカメラの方位。方位が増えるほど地図は反時計回りに回る。
pub fn rotate_about_center(image: &RgbImage, degrees: f64) -> RgbImage {
    let (width, height) = image.dimensions();
    let cx = (f64::from(width) - 1.0) / 2.0;
    let cy = (f64::from(height) - 1.0) / 2.0;
    let (sin, cos) = degrees.to_radians().sin_cos();

    RgbImage::from_fn(width, height, |x, y| {
        let dx = f64::from(x) - cx;
        let dy = f64::from(y) - cy;
        let sx = (cos * dx - sin * dy + cx).round();
        let sy = (sin * dx + cos * dy + cy).round();

        if sx >= 0.0 && sy >= 0.0 && sx < f64::from(width) && sy < f64::from(height) {
            *image.get_pixel(sx as u32, sy as u32)
        } else {
            Rgb([0, 0, 0])
        }
    })
}

fn encode_frame(base: &RgbImage, heading: u16) -> Result<CapturedImage> {
    let rotated = rotate_about_center(base, f64::from(heading));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(rotated)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY))
        .map_err(|e| RoofError::Snapshot(e.to_string()))?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&buf);
    Ok(CapturedImage::new(
        heading,
        format!("data:image/jpeg;base64,{}", encoded),
    ))
}

pub struct StaticMapViewport {
    client: Option<Client>,
    api_key: String,
    center: Coordinates,
    zoom: u8,
    size: u32,
    heading: u16,
    base: Option<RgbImage>,
    /// 直近の初期化失敗の原因
    load_error: Option<String>,
}

impl StaticMapViewport {
    pub fn new(
        api_key: String,
        center: Coordinates,
        zoom: u8,
        size: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client: Some(client),
            api_key,
            center,
            zoom,
            size,
            heading: 0,
            base: None,
            load_error: None,
        })
    }

    pub fn from_config(config: &Config, center: Coordinates) -> Result<Self> {
        Self::new(
            config.google_maps_api_key()?,
            center,
            config.zoom,
            config.image_size,
            config.timeout(),
        )
    }

    /// 取得済みの画像から直接作る（ネットワークを使わない）
    pub fn from_image(center: Coordinates, image: RgbImage) -> Self {
        let size = image.width();
        Self {
            client: None,
            api_key: String::new(),
            center,
            zoom: 20,
            size,
            heading: 0,
            base: Some(image),
            load_error: None,
        }
    }

    /// 衛星画像を取得して描画面を初期化
    ///
    /// 失敗した場合は原因を保持し、撮影時のエラーに含める。
    pub async fn mount(&mut self) -> Result<()> {
        match self.load().await {
            Ok(image) => {
                self.base = Some(image);
                self.heading = 0;
                self.load_error = None;
                Ok(())
            }
            Err(e) => {
                self.load_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn load(&self) -> Result<RgbImage> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| RoofError::ResourceNotReady("Map client is not available".into()))?;

        let center = self.center.to_string();
        let zoom = self.zoom.to_string();
        let size = format!("{0}x{0}", self.size);
        debug!(%center, %zoom, %size, "fetching satellite imagery");

        let response = client
            .get(STATIC_MAP_URL)
            .query(&[
                ("center", center.as_str()),
                ("zoom", zoom.as_str()),
                ("size", size.as_str()),
                ("maptype", "satellite"),
                ("format", "png"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                warn!(error = %e, "satellite imagery request failed");
                RoofError::Transport(format!("Failed to load map: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoofError::Transport(format!(
                "Failed to load map: HTTP {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RoofError::Transport(format!("Failed to load map: {}", e.without_url())))?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| RoofError::InvalidResponse(format!("Map image could not be decoded: {}", e)))?;

        Ok(image.to_rgb8())
    }
}

#[async_trait]
impl MapViewport for StaticMapViewport {
    fn is_ready(&self) -> bool {
        self.base.is_some()
    }

    fn not_ready_reason(&self) -> Option<String> {
        self.load_error.clone()
    }

    fn set_heading(&mut self, heading: u16) -> Result<()> {
        if self.base.is_none() {
            return Err(RoofError::ResourceNotReady(
                "Viewport is not initialized".into(),
            ));
        }
        self.heading = heading % 360;
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<CapturedImage> {
        let base = self
            .base
            .clone()
            .ok_or_else(|| RoofError::ResourceNotReady("Map is not ready for capture".into()))?;
        let heading = self.heading;

        tokio::task::spawn_blocking(move || encode_frame(&base, heading))
            .await
            .map_err(|e| RoofError::Snapshot(e.to_string()))?
    }
}
