//! 地図ビューポート
//!
//! 撮影ループが操作する描画面。方位を設定してから現在のフレームを
//! 画像として取り出す。描画面は1つしかないため同時に1方位しか表せない。

mod static_map;

pub use static_map::{rotate_about_center, StaticMapViewport};

use crate::error::Result;
use async_trait::async_trait;
use roof_estimate_common::CapturedImage;

#[async_trait]
pub trait MapViewport: Send {
    /// 座標が設定され、描画面が初期化済みか
    fn is_ready(&self) -> bool;

    /// 未準備の原因（初期化の失敗など）
    fn not_ready_reason(&self) -> Option<String> {
        None
    }

    /// カメラの方位を設定（度）
    fn set_heading(&mut self, heading: u16) -> Result<()>;

    /// 現在のフレームをエンコード済み画像として取得
    async fn snapshot(&mut self) -> Result<CapturedImage>;
}
