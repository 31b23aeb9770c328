//! OpenAI Chat Completions 連携
//!
//! 画像1枚と固定プロンプトを送信し、JSONモードで計測値を受け取る。
//! temperature は 0 固定。

use super::RoofAnalyzer;
use crate::config::Config;
use crate::error::{Result, RoofError};
use async_trait::async_trait;
use reqwest::Client;
use roof_estimate_common::{parse_measurements_response, RoofMeasurements, ROOF_ANALYSIS_PROMPT};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const MAX_TOKENS: u32 = 300;

/// Chat Completions リクエスト
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Chat Completions レスポンス
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn build_request(model: &str, image_base64: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage {
            role: "user",
            content: vec![
                ContentPart::Text {
                    text: ROOF_ANALYSIS_PROMPT.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:image/jpeg;base64,{}", image_base64),
                        detail: "high",
                    },
                },
            ],
        }],
        max_tokens: MAX_TOKENS,
        temperature: 0.0,
        response_format: ResponseFormat {
            kind: "json_object",
        },
    }
}

/// 先頭の choice から本文を取り出す
fn extract_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| RoofError::InvalidResponse("Invalid response from analysis service".into()))
}

/// 画像解析クライアント
#[derive(Debug, Clone)]
pub struct OpenAiVisionClient {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiVisionClient {
    pub fn new(api_key: String, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(RoofError::MissingApiKey {
                provider: "OpenAI",
                env_var: crate::config::OPENAI_API_KEY_ENV,
            });
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.openai_api_key()?, config.model.clone(), config.timeout())
    }
}

#[async_trait]
impl RoofAnalyzer for OpenAiVisionClient {
    async fn analyze(&self, image_base64: &str) -> Result<RoofMeasurements> {
        info!(model = %self.model, image_bytes = image_base64.len(), "starting roof analysis");
        let request = build_request(&self.model, image_base64);

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "analysis request failed");
                RoofError::Transport(format!("Failed to reach analysis service: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let preview: String = text.chars().take(300).collect();
            warn!(%status, body = %preview, "analysis service returned non-success status");
            return Err(RoofError::Transport(format!(
                "Analysis service returned HTTP {}",
                status
            )));
        }

        let payload: ChatResponse = response.json().await.map_err(|e| {
            RoofError::InvalidResponse(format!("Invalid response from analysis service: {}", e))
        })?;

        let content = extract_content(payload)?;
        debug!(content = %content, "analysis response content");

        let measurements = parse_measurements_response(&content).map_err(|e| {
            warn!(error = %e, "rejecting analysis response");
            RoofError::from(e)
        })?;

        info!(
            area_sq_ft = measurements.area_sq_ft,
            confidence = measurements.confidence,
            "roof analysis complete"
        );
        Ok(measurements)
    }
}
