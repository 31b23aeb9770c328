//! 住所構成要素の解釈
//!
//! Places APIの address_components から構造化住所を組み立て、
//! 屋根の特定に使える住所（番地+通り名あり）かどうかを判定する

use crate::types::{AddressComponent, Coordinates, ResolvedPlace, StructuredAddress};

pub const STREET_NUMBER: &str = "street_number";
pub const ROUTE: &str = "route";
pub const LOCALITY: &str = "locality";
pub const ADMINISTRATIVE_AREA_LEVEL_1: &str = "administrative_area_level_1";
pub const POSTAL_CODE: &str = "postal_code";

/// 不完全な住所を選択したときにユーザーへ表示するメッセージ
pub const INCOMPLETE_ADDRESS_MESSAGE: &str = "Please enter a complete street address";

/// 番地と通り名の構成要素が両方あるか
pub fn is_complete_address(components: &[AddressComponent]) -> bool {
    let has_street_number = components.iter().any(|c| c.has_type(STREET_NUMBER));
    let has_route = components.iter().any(|c| c.has_type(ROUTE));
    has_street_number && has_route
}

/// 構成要素から構造化住所を抽出
///
/// 州は short_name（"CA" など）、それ以外は long_name を使う。
/// 同じ種別が複数ある場合は後に出現したものを採用する。
pub fn structured_address(components: &[AddressComponent]) -> StructuredAddress {
    let mut address = StructuredAddress::default();

    for component in components {
        if component.has_type(STREET_NUMBER) {
            address.street_number = component.long_name.clone();
        }
        if component.has_type(ROUTE) {
            address.route = component.long_name.clone();
        }
        if component.has_type(LOCALITY) {
            address.city = component.long_name.clone();
        }
        if component.has_type(ADMINISTRATIVE_AREA_LEVEL_1) {
            address.state = component.short_name.clone();
        }
        if component.has_type(POSTAL_CODE) {
            address.zip_code = component.long_name.clone();
        }
    }

    address
}

/// 詳細APIの結果から ResolvedPlace を組み立てる
pub fn build_resolved_place(
    id: String,
    formatted_address: String,
    address_components: Vec<AddressComponent>,
    coordinates: Coordinates,
    place_types: Vec<String>,
) -> ResolvedPlace {
    let structured_address = structured_address(&address_components);
    ResolvedPlace {
        id,
        formatted_address,
        address_components,
        coordinates,
        place_types,
        structured_address,
    }
}
