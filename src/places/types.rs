//! Places Web Service のレスポンス形式

use crate::error::{Result, RoofError};
use roof_estimate_common::address::build_resolved_place;
use roof_estimate_common::{AddressCandidate, AddressComponent, Coordinates, ResolvedPlace};
use serde::Deserialize;

/// オートコンプリートAPIレスポンス
#[derive(Debug, Deserialize)]
pub struct AutocompleteResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Prediction {
    pub description: String,
    pub place_id: String,
    #[serde(default)]
    pub structured_formatting: StructuredFormatting,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StructuredFormatting {
    #[serde(default)]
    pub main_text: String,
    #[serde(default)]
    pub secondary_text: String,
}

impl From<Prediction> for AddressCandidate {
    fn from(p: Prediction) -> Self {
        AddressCandidate {
            description: p.description,
            id: p.place_id,
            main_text: p.structured_formatting.main_text,
            secondary_text: p.structured_formatting.secondary_text,
            place_types: p.types,
        }
    }
}

/// 詳細APIレスポンス
#[derive(Debug, Deserialize)]
pub struct DetailsResponse {
    #[serde(default)]
    pub result: Option<PlaceResult>,
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceResult {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub address_components: Vec<WireAddressComponent>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireAddressComponent {
    pub long_name: String,
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// APIの status フィールドを検査
///
/// OK / ZERO_RESULTS は成功扱い。NOT_FOUND は NotFound、
/// それ以外（REQUEST_DENIED, OVER_QUERY_LIMIT 等）は通信失敗とする。
pub fn check_status(status: &str, error_message: Option<&str>) -> Result<()> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        "NOT_FOUND" => Err(RoofError::NotFound("Place details not found".into())),
        other => Err(RoofError::Transport(match error_message {
            Some(msg) if !msg.is_empty() => format!("Places API returned {}: {}", other, msg),
            _ => format!("Places API returned {}", other),
        })),
    }
}

/// 詳細結果を ResolvedPlace に変換
pub fn into_resolved_place(result: PlaceResult) -> Result<ResolvedPlace> {
    let (Some(place_id), Some(geometry)) = (result.place_id, result.geometry) else {
        return Err(RoofError::InvalidResponse(
            "Missing required place details".into(),
        ));
    };

    let components = result
        .address_components
        .into_iter()
        .map(|c| AddressComponent {
            long_name: c.long_name,
            short_name: c.short_name,
            types: c.types,
        })
        .collect();

    Ok(build_resolved_place(
        place_id,
        result.formatted_address.unwrap_or_default(),
        components,
        Coordinates::new(geometry.location.lat, geometry.location.lng),
        result.types,
    ))
}
