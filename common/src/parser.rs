//! 画像解析レスポンスパーサー
//!
//! 解析サービスの応答本文からJSONオブジェクトを抽出し、
//! RoofMeasurements として検証する。欠損や範囲外の値は
//! ゼロ埋めせずエラーとして返す。

use crate::error::{Error, Result};
use crate::types::RoofMeasurements;
use serde::Deserialize;

/// レスポンスからJSONオブジェクト部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 最初の `{` から最後の `}` まで
/// 3. エラー
///
/// # Examples
/// ```
/// use roof_estimate_common::extract_json;
///
/// let response = "Result: {\"area_sq_ft\": 1000}";
/// let json = extract_json(response).unwrap();
/// assert_eq!(json, "{\"area_sq_ft\": 1000}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end > start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::InvalidResponse("JSON object not found in analysis response".into()))
}

/// 解析サービスが返すJSONの形
#[derive(Debug, Deserialize)]
struct RawMeasurements {
    area_sq_ft: Option<f64>,
    perimeter_ft: Option<f64>,
    pitch_degrees: Option<f64>,
    confidence_level: Option<f64>,
}

fn required(value: Option<f64>, field: &str) -> Result<f64> {
    value.ok_or_else(|| {
        Error::InvalidResponse(format!("Invalid measurements in analysis response: missing {}", field))
    })
}

/// 解析レスポンスをパースして検証
///
/// # Returns
/// * `Ok(RoofMeasurements)` - 4フィールドすべてが揃い範囲内
/// * `Err(Error::InvalidResponse)` - JSONなし、構文エラー、フィールド欠損
/// * `Err(Error::OutOfRange)` - 面積/周長が0以下、勾配が負、信頼度が[0,1]外
pub fn parse_measurements_response(response: &str) -> Result<RoofMeasurements> {
    let json_str = extract_json(response)?;
    let raw: RawMeasurements = serde_json::from_str(json_str)
        .map_err(|e| Error::InvalidResponse(format!("Failed to parse measurements JSON: {}", e)))?;

    let area_sq_ft = required(raw.area_sq_ft, "area_sq_ft")?;
    let perimeter_ft = required(raw.perimeter_ft, "perimeter_ft")?;
    let pitch_degrees = required(raw.pitch_degrees, "pitch_degrees")?;
    let confidence = required(raw.confidence_level, "confidence_level")?;

    if !(area_sq_ft > 0.0) {
        return Err(Error::OutOfRange(format!("area_sq_ft must be positive, got {}", area_sq_ft)));
    }
    if !(perimeter_ft > 0.0) {
        return Err(Error::OutOfRange(format!("perimeter_ft must be positive, got {}", perimeter_ft)));
    }
    if !(pitch_degrees >= 0.0) {
        return Err(Error::OutOfRange(format!("pitch_degrees must not be negative, got {}", pitch_degrees)));
    }
    if !(0.0..=1.0).contains(&confidence) {
        return Err(Error::OutOfRange(format!(
            "confidence_level must be within [0, 1], got {}",
            confidence
        )));
    }

    Ok(RoofMeasurements {
        area_sq_ft,
        perimeter_ft,
        pitch_degrees,
        confidence,
    })
}
