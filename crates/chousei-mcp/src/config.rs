//! Configuration management
//!
//! 設定は以下の優先順位で読み込まれます:
//! 1. 環境変数
//! 2. chousei-mcp.toml 設定ファイル
//! 3. デフォルト値
//!
//! 設定ファイル内では `${VAR_NAME}` 形式で環境変数を展開できます。

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 設定ファイル名 (カレントディレクトリから探す)
const CONFIG_FILE: &str = "chousei-mcp.toml";

/// Schedule engine type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Deterministic local parser
    #[default]
    Local,
    /// Gemini API (falls back to local dates on failure)
    Gemini,
}

/// Gemini configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeminiConfig {
    /// API key
    #[serde(default)]
    pub api_key: String,

    /// Custom API endpoint (optional)
    pub api_url: Option<String>,
}

/// Browser automation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run Chrome headless
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Navigation timeout in seconds
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout: u64,

    /// Element wait timeout in seconds
    #[serde(default = "default_element_timeout")]
    pub element_timeout: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            navigation_timeout: default_navigation_timeout(),
            element_timeout: default_element_timeout(),
        }
    }
}

fn default_headless() -> bool {
    true
}

fn default_navigation_timeout() -> u64 {
    30
}

fn default_element_timeout() -> u64 {
    10
}

/// Main configuration for chousei-mcp
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Schedule engine selection
    #[serde(default)]
    pub engine: Engine,

    /// Gemini configuration (used when engine = "gemini")
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Browser automation configuration
    #[serde(default)]
    pub browser: BrowserConfig,
}

impl Config {
    /// 設定ファイルから環境変数を展開する
    ///
    /// `${VAR_NAME}` 形式の文字列を環境変数の値に置換します。
    /// 環境変数が存在しない場合は空文字列になります。
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // '{' を消費

                let mut var_name = String::new();
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next == '}' {
                        break;
                    }
                    var_name.push(next);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// TOML 設定ファイルから設定を読み込む
    ///
    /// # 引数
    /// * `path` - TOML ファイルのパス
    ///
    /// # 環境変数展開
    /// 設定ファイル内の `${VAR_NAME}` は環境変数の値に置換されます。
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        // 環境変数を展開してからパース
        let expanded_content = Self::expand_env_vars(&toml_content);

        let toml_config: TomlConfig = toml::from_str(&expanded_content)
            .with_context(|| format!("Failed to parse TOML: {}", path.display()))?;

        let mut config = Self::from_toml_config(toml_config);

        // 既存の環境変数で上書き（環境変数が優先）
        config.apply_env_overrides();

        Ok(config)
    }

    /// デフォルトパスから設定を読み込む
    ///
    /// カレントディレクトリに `chousei-mcp.toml` があればそれを読み、
    /// 無ければ環境変数とデフォルト値だけで構成します。
    pub fn load() -> anyhow::Result<Self> {
        if Path::new(CONFIG_FILE).exists() {
            return Self::from_toml_file(CONFIG_FILE);
        }

        Ok(Self::from_env())
    }

    /// Load configuration from environment variables only
    ///
    /// 必須項目は無いため、この読み込みは失敗しません。engine = gemini で
    /// API キーが無い場合はサーバー構築時にエラーになります。
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// TOML 構造から Config を構築
    fn from_toml_config(toml: TomlConfig) -> Self {
        let engine = toml
            .engine
            .map(|e| engine_from_str(&e))
            .unwrap_or_default();

        let gemini = toml.gemini.unwrap_or_default();
        let browser = toml.browser.unwrap_or_default();

        Config {
            engine,
            gemini: GeminiConfig {
                api_key: gemini.api_key.unwrap_or_default(),
                api_url: gemini.api_url,
            },
            browser: BrowserConfig {
                headless: browser.headless.unwrap_or_else(default_headless),
                navigation_timeout: browser
                    .navigation_timeout
                    .unwrap_or_else(default_navigation_timeout),
                element_timeout: browser
                    .element_timeout
                    .unwrap_or_else(default_element_timeout),
            },
        }
    }

    /// 環境変数で設定を上書きする
    fn apply_env_overrides(&mut self) {
        if let Ok(engine) = std::env::var("CHOUSEI_ENGINE") {
            if !engine.is_empty() {
                self.engine = engine_from_str(&engine);
            }
        }

        if let Ok(api_key) = std::env::var("GEMINI_API_KEY") {
            if !api_key.is_empty() {
                self.gemini.api_key = api_key;
            }
        }
        if let Ok(api_url) = std::env::var("GEMINI_API_URL") {
            if !api_url.is_empty() {
                self.gemini.api_url = Some(api_url);
            }
        }

        if let Ok(headless) = std::env::var("BROWSER_HEADLESS") {
            self.browser.headless = headless.to_lowercase() != "false";
        }
    }
}

/// engine 文字列から Engine への変換 (未知の値は local 扱い)
fn engine_from_str(value: &str) -> Engine {
    match value.to_lowercase().as_str() {
        "gemini" => Engine::Gemini,
        _ => Engine::Local,
    }
}

// ============================================================================
// TOML 構造体定義（ファイル解析用）
// ============================================================================

/// TOML ファイル用のトップレベル構造
#[derive(Debug, Deserialize)]
struct TomlConfig {
    /// エンジン ("local" または "gemini")
    engine: Option<String>,
    /// Gemini 設定
    gemini: Option<TomlGeminiConfig>,
    /// ブラウザ設定
    browser: Option<TomlBrowserConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlGeminiConfig {
    /// API キー
    #[serde(default)]
    api_key: Option<String>,
    /// カスタムエンドポイント (オプション)
    #[serde(default)]
    api_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlBrowserConfig {
    /// ヘッドレス起動
    #[serde(default)]
    headless: Option<bool>,
    /// 画面遷移タイムアウト (秒)
    #[serde(default)]
    navigation_timeout: Option<u64>,
    /// 要素待ちタイムアウト (秒)
    #[serde(default)]
    element_timeout: Option<u64>,
}
