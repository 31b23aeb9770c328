//! 費用概算
//!
//! 屋根面積（sq ft）と1スクエア（100 sq ft）あたりの単価から
//! 概算費用を同期的に算出する。I/Oは持たない。

use serde::{Deserialize, Serialize};

pub const MIN_PRICE_PER_SQUARE: u32 = 350;
pub const MAX_PRICE_PER_SQUARE: u32 = 5000;
pub const DEFAULT_PRICE_PER_SQUARE: u32 = 425;
/// スライダーの刻み幅
pub const PRICE_STEP: u32 = 5;
/// 1スクエアあたりの面積
pub const SQ_FT_PER_SQUARE: f64 = 100.0;

/// 1スクエアあたりの単価（ドル）
///
/// 常に `MIN_PRICE_PER_SQUARE..=MAX_PRICE_PER_SQUARE` に収まる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct PricePerSquare(u32);

impl PricePerSquare {
    /// 範囲外の値は境界に丸める
    pub fn new(value: u32) -> Self {
        Self(value.clamp(MIN_PRICE_PER_SQUARE, MAX_PRICE_PER_SQUARE))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn step_up(self) -> Self {
        Self::new(self.0.saturating_add(PRICE_STEP))
    }

    pub fn step_down(self) -> Self {
        Self::new(self.0.saturating_sub(PRICE_STEP))
    }
}

impl Default for PricePerSquare {
    fn default() -> Self {
        Self(DEFAULT_PRICE_PER_SQUARE)
    }
}

impl From<u32> for PricePerSquare {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<PricePerSquare> for u32 {
    fn from(price: PricePerSquare) -> Self {
        price.0
    }
}

/// 面積をスクエア数に換算
pub fn total_squares(area_sq_ft: f64) -> f64 {
    area_sq_ft / SQ_FT_PER_SQUARE
}

/// 費用概算結果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub area_sq_ft: f64,
    pub price_per_square: PricePerSquare,
    pub total_squares: f64,
    pub total_cost: f64,
}

impl CostEstimate {
    pub fn new(area_sq_ft: f64, price_per_square: PricePerSquare) -> Self {
        let squares = total_squares(area_sq_ft);
        Self {
            area_sq_ft,
            price_per_square,
            total_squares: squares,
            total_cost: squares * f64::from(price_per_square.get()),
        }
    }

    /// 単価だけを変えて再計算（面積はそのまま）
    pub fn with_price(&self, price_per_square: PricePerSquare) -> Self {
        Self::new(self.area_sq_ft, price_per_square)
    }
}
