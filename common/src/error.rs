//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// レスポンスにJSONが無い、または必須フィールドが欠けている
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// 値が許容範囲外
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// 状態遷移として不正な操作
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
