//! ワークフローで扱う型定義
//!
//! - AddressCandidate: 入力途中の住所に対する候補
//! - ResolvedPlace: 詳細取得後の住所と座標
//! - CapturedImage: 方位ごとに撮影した衛星画像
//! - RoofMeasurements: 画像解析で得た屋根の計測値

use serde::{Deserialize, Serialize};

/// 住所候補（オートコンプリート結果の1件）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressCandidate {
    pub description: String,
    pub id: String,
    pub main_text: String,
    pub secondary_text: String,
    #[serde(default)]
    pub place_types: Vec<String>,
}

/// 住所構成要素
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl AddressComponent {
    pub fn has_type(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }
}

/// 緯度経度
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// 構造化住所
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredAddress {
    pub street_number: String,
    pub route: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

/// 詳細取得済みの住所
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPlace {
    pub id: String,
    pub formatted_address: String,
    pub address_components: Vec<AddressComponent>,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub place_types: Vec<String>,
    pub structured_address: StructuredAddress,
}

impl ResolvedPlace {
    /// 番地と通り名の両方を含むか
    pub fn is_complete(&self) -> bool {
        crate::address::is_complete_address(&self.address_components)
    }
}

/// 方位ごとの撮影画像
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedImage {
    /// カメラの方位（度）
    pub heading: u16,
    /// "data:image/jpeg;base64,..." 形式のData URL
    pub data_url: String,
}

impl CapturedImage {
    pub fn new(heading: u16, data_url: impl Into<String>) -> Self {
        Self {
            heading,
            data_url: data_url.into(),
        }
    }

    /// Data URLからBase64データ部分を抽出
    pub fn base64_data(&self) -> Option<&str> {
        self.data_url.split_once(',').map(|(_, data)| data)
    }

    /// Data URLからMIMEタイプを抽出（不明時は image/jpeg）
    pub fn mime_type(&self) -> &str {
        self.data_url
            .strip_prefix("data:")
            .and_then(|s| s.split(';').next())
            .filter(|s| !s.is_empty())
            .unwrap_or("image/jpeg")
    }
}

/// 屋根の計測値
///
/// 生成は `parser::parse_measurements_response` を通すこと。
/// 範囲外の値を含むインスタンスは作らない。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoofMeasurements {
    pub area_sq_ft: f64,
    pub perimeter_ft: f64,
    pub pitch_degrees: f64,
    /// 0.0〜1.0
    pub confidence: f64,
}
