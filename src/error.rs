use thiserror::Error;

/// 失敗の分類（ユーザーへの表示方針を決める）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// ネットワーク到達不可、または非成功ステータス
    TransportFailure,
    /// 応答が壊れている、または必須フィールド欠損
    InvalidResponse,
    /// 業務ルールによる拒否（不完全な住所など）
    BusinessRuleRejection,
    /// 描画面や座標が未準備
    ResourceNotReady,
    /// 認証情報などの設定不足
    Configuration,
}

#[derive(Error, Debug)]
pub enum RoofError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{provider} API key is not set. Export {env_var} or run `roof-estimate config`")]
    MissingApiKey {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    InvalidResponse(String),

    #[error("{0}")]
    NotFound(String),

    /// 番地・通り名のない住所など
    #[error("{0}")]
    IncompleteAddress(String),

    /// 存在しない候補番号の指定など
    #[error("{0}")]
    InvalidSelection(String),

    #[error("{0}")]
    ResourceNotReady(String),

    #[error("Capture already in progress")]
    CaptureInProgress,

    #[error("Snapshot failed: {0}")]
    Snapshot(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] roof_estimate_common::Error),
}

impl RoofError {
    pub fn kind(&self) -> ErrorKind {
        use roof_estimate_common::Error as CommonError;

        match self {
            RoofError::Config(_) | RoofError::MissingApiKey { .. } => ErrorKind::Configuration,
            RoofError::Transport(_)
            | RoofError::Http(_)
            | RoofError::Io(_)
            | RoofError::Prompt(_) => ErrorKind::TransportFailure,
            RoofError::InvalidResponse(_) | RoofError::NotFound(_) | RoofError::JsonParse(_) => {
                ErrorKind::InvalidResponse
            }
            RoofError::IncompleteAddress(_) | RoofError::InvalidSelection(_) => {
                ErrorKind::BusinessRuleRejection
            }
            RoofError::ResourceNotReady(_)
            | RoofError::CaptureInProgress
            | RoofError::Snapshot(_) => ErrorKind::ResourceNotReady,
            RoofError::Common(inner) => match inner {
                CommonError::InvalidResponse(_)
                | CommonError::OutOfRange(_)
                | CommonError::Json(_) => ErrorKind::InvalidResponse,
                CommonError::InvalidState(_) => ErrorKind::ResourceNotReady,
                CommonError::Config(_) => ErrorKind::Configuration,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, RoofError>;
