use crate::error::{Result, RoofError};
use roof_estimate_common::cost::DEFAULT_PRICE_PER_SQUARE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const GOOGLE_MAPS_API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub google_maps_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// 画像解析モデル
    pub model: String,
    /// オートコンプリートの国制限（ISO 3166-1 alpha-2）
    pub country: String,
    pub debounce_ms: u64,
    /// 方位変更後、撮影までの待ち時間
    pub settle_delay_ms: u64,
    pub zoom: u8,
    /// 衛星画像の一辺（px）
    pub image_size: u32,
    pub timeout_seconds: u64,
    pub default_price_per_square: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google_maps_api_key: None,
            openai_api_key: None,
            model: "gpt-4o-mini".into(),
            country: "us".into(),
            debounce_ms: 300,
            settle_delay_ms: 1000,
            zoom: 20,
            image_size: 640,
            timeout_seconds: 60,
            default_price_per_square: DEFAULT_PRICE_PER_SQUARE,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| RoofError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("roof-estimate").join("config.json"))
    }

    /// Places/Static Maps用のキー（環境変数を優先）
    pub fn google_maps_api_key(&self) -> Result<String> {
        resolve_api_key(
            std::env::var(GOOGLE_MAPS_API_KEY_ENV).ok(),
            self.google_maps_api_key.as_deref(),
        )
        .ok_or(RoofError::MissingApiKey {
            provider: "Google Maps",
            env_var: GOOGLE_MAPS_API_KEY_ENV,
        })
    }

    /// 画像解析サービス用のキー（環境変数を優先）
    pub fn openai_api_key(&self) -> Result<String> {
        resolve_api_key(
            std::env::var(OPENAI_API_KEY_ENV).ok(),
            self.openai_api_key.as_deref(),
        )
        .ok_or(RoofError::MissingApiKey {
            provider: "OpenAI",
            env_var: OPENAI_API_KEY_ENV,
        })
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// 空白のみのキーは未設定として扱う
pub fn resolve_api_key(env_value: Option<String>, stored: Option<&str>) -> Option<String> {
    env_value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            stored
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
}

/// 表示用にキーを伏せる
pub fn mask_key(key: Option<&str>) -> String {
    match key {
        Some(k) if k.chars().count() > 4 => {
            let tail: String = k.chars().skip(k.chars().count() - 4).collect();
            format!("****{}", tail)
        }
        Some(k) if !k.is_empty() => "****".to_string(),
        _ => "not set".to_string(),
    }
}
