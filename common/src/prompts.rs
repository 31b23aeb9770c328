//! プロンプト定義
//!
//! 画像解析サービスへ送る固定の指示文

/// 屋根計測用プロンプト
///
/// レスポンスは4つの数値フィールドを持つJSONオブジェクトのみを要求する。
pub const ROOF_ANALYSIS_PROMPT: &str = "You are a roof measurement expert. Analyze this satellite image of a roof and provide measurements in a JSON format with the following fields:

- area_sq_ft: number (roof area in square feet)
- perimeter_ft: number (roof perimeter in feet)
- pitch_degrees: number (roof pitch in degrees)
- confidence_level: number (between 0 and 1)

The measurements should be realistic for a residential roof. Return ONLY a JSON object with these exact field names.";
