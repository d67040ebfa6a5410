//! Gemini API HTTP client

use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{LlmError, Result};
use crate::types::{GenerateContentRequest, GenerateContentResponse};

/// generateContent エンドポイント (モデルは軽量なものに固定)
const DEFAULT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-8b:generateContent";

/// Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl GeminiClient {
    /// Create a new client
    ///
    /// API キーが空ならこの時点でエラーにします。
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_key,
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Create from the GEMINI_API_KEY environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        Self::new(api_key)
    }

    /// Override the endpoint (for testing)
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Send a prompt and return the generated text
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest::from_prompt(prompt);
        let url = format!("{}?key={}", self.api_url, self.api_key);

        debug!("Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Gemini API error: {} - {}", status, body);
            return Err(LlmError::Api(format!("{}: {}", status, body)));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::Api(format!("Failed to parse response: {} - {}", e, body)))?;

        let text = parsed.first_text().ok_or(LlmError::InvalidResponse)?;
        Ok(text.to_string())
    }

    /// 接続テスト。短い挨拶を送って空でない応答が返るかだけを見ます
    pub async fn test_connection(&self) -> bool {
        match self.generate("こんにちは").await {
            Ok(text) => !text.is_empty(),
            Err(e) => {
                warn!("Gemini API 接続テスト失敗: {}", e);
                false
            }
        }
    }
}
