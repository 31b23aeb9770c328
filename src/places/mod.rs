//! 住所解決
//!
//! - AddressResolver: 候補検索と詳細取得の窓口（テストでは差し替える）
//! - GooglePlacesClient: Places Web Service 実装

mod google;
pub mod types;

pub use google::GooglePlacesClient;

use crate::error::{Result, RoofError};
use async_trait::async_trait;
use roof_estimate_common::{AddressCandidate, ResolvedPlace, INCOMPLETE_ADDRESS_MESSAGE};
use tracing::warn;

#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// 入力途中のテキストから住所候補を検索
    async fn search(&self, text: &str) -> Result<Vec<AddressCandidate>>;

    /// 候補IDから住所の詳細と座標を取得
    async fn resolve_details(&self, candidate_id: &str) -> Result<ResolvedPlace>;
}

/// 詳細を取得し、番地と通り名がそろっているか検証する
///
/// 不完全な住所は通信エラーではなく `IncompleteAddress` として返す。
pub async fn resolve_complete_place(
    resolver: &dyn AddressResolver,
    candidate_id: &str,
) -> Result<ResolvedPlace> {
    let place = resolver.resolve_details(candidate_id).await?;

    if !place.is_complete() {
        warn!(
            place_id = %place.id,
            address = %place.formatted_address,
            "rejecting address without street number and route"
        );
        return Err(RoofError::IncompleteAddress(
            INCOMPLETE_ADDRESS_MESSAGE.to_string(),
        ));
    }

    Ok(place)
}
