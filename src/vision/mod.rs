//! 屋根画像の解析
//!
//! - RoofAnalyzer: 1枚の画像から計測値を得る窓口（テストでは差し替える）
//! - OpenAiVisionClient: Chat Completions（画像入力）実装

mod openai;

pub use openai::OpenAiVisionClient;

use crate::error::Result;
use async_trait::async_trait;
use roof_estimate_common::RoofMeasurements;

#[async_trait]
pub trait RoofAnalyzer: Send + Sync {
    /// Base64エンコード済みJPEGを解析
    ///
    /// 欠損・範囲外の値は Err として返し、0埋めした計測値は返さない。
    async fn analyze(&self, image_base64: &str) -> Result<RoofMeasurements>;
}
