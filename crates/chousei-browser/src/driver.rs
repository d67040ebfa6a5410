//! 調整さんフォームドライバ
//!
//! ブラウザの起動からフォーム送信、イベント URL の取得までを担います。
//! headless_chrome は同期 API なので、非同期のサーバから使うときは
//! spawn_blocking で包みます。

use std::sync::Arc;
use std::time::{Duration, Instant};

use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use tracing::{debug, error, info};

use chousei_core::{EventData, EventResult};

use crate::error::{AutomationError, Result};

/// 調整さんのイベント作成ページ
const CHOUSEISAN_URL: &str = "https://chouseisan.com/";

/// イベント名入力欄
const TITLE_SELECTOR: &str = "#event_name";
/// メモ欄
const MEMO_SELECTOR: &str = r#"textarea[name="comment"]"#;
/// 時間サフィックス欄
const TIME_SUFFIX_SELECTOR: &str = "#calendar_time_suffix";
/// 日程候補欄
const CANDIDATES_SELECTOR: &str = "#event_kouho";
/// 出欠表をつくるボタン
const CREATE_BUTTON_XPATH: &str =
    "//button[contains(., '出欠表をつくる')] | //input[@value='出欠表をつくる']";
/// 作成完了ページの URL に含まれる目印
const COMPLETE_URL_MARKER: &str = "create_complete";

/// 既定の User-Agent (調整さんはデスクトップ表示で操作する)
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// ドライバ設定
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// ヘッドレスで起動するか
    pub headless: bool,
    /// ウィンドウ幅 (px)
    pub width: u32,
    /// ウィンドウ高さ (px)
    pub height: u32,
    /// 画面遷移のタイムアウト (秒)
    pub navigation_timeout: u64,
    /// 要素待ちのタイムアウト (秒)
    pub element_timeout: u64,
    /// User-Agent
    pub user_agent: Option<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            width: 1280,
            height: 960,
            navigation_timeout: 30,
            element_timeout: 10,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
        }
    }
}

impl DriverConfig {
    /// Create a new configuration builder
    pub fn builder() -> DriverConfigBuilder {
        DriverConfigBuilder::default()
    }
}

/// Builder for DriverConfig
#[derive(Default)]
pub struct DriverConfigBuilder {
    config: DriverConfig,
}

impl DriverConfigBuilder {
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    pub fn navigation_timeout(mut self, seconds: u64) -> Self {
        self.config.navigation_timeout = seconds;
        self
    }

    pub fn element_timeout(mut self, seconds: u64) -> Self {
        self.config.element_timeout = seconds;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> DriverConfig {
        self.config
    }
}

/// 調整さんフォームドライバ
pub struct ChouseisanDriver {
    browser: Browser,
    config: DriverConfig,
}

impl ChouseisanDriver {
    /// ブラウザを起動してドライバを作る
    pub fn launch(config: DriverConfig) -> Result<Self> {
        use std::ffi::OsStr;

        info!("ブラウザ起動 (headless: {})", config.headless);

        let mut args: Vec<String> = vec![
            format!("--window-size={},{}", config.width, config.height),
            "--no-sandbox".to_string(),
            "--disable-setuid-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            "--no-first-run".to_string(),
            "--disable-background-timer-throttling".to_string(),
            "--disable-backgrounding-occluded-windows".to_string(),
            "--disable-renderer-backgrounding".to_string(),
        ];

        if let Some(ref ua) = config.user_agent {
            args.push(format!("--user-agent={}", ua));
        }

        let os_args: Vec<&OsStr> = args.iter().map(OsStr::new).collect();

        let launch_options = LaunchOptionsBuilder::default()
            .headless(config.headless)
            .args(os_args)
            .build()
            .map_err(|e| {
                AutomationError::Initialization(format!("Failed to build launch options: {}", e))
            })?;

        let browser = Browser::new(launch_options)
            .map_err(|e| AutomationError::Initialization(format!("Failed to launch browser: {}", e)))?;

        info!("ブラウザ起動完了");

        Ok(Self { browser, config })
    }

    /// 調整さんイベントを作成する
    ///
    /// 失敗も `EventResult` に畳み込んで返します。呼び出し側が見るのは
    /// success フラグとメッセージだけです。
    pub fn create_event(&self, event: &EventData) -> EventResult {
        match self.try_create_event(event) {
            Ok(url) => EventResult {
                success: true,
                url: Some(url),
                message: "イベントが正常に作成されました".to_string(),
                error: None,
            },
            Err(e) => {
                error!("イベント作成エラー: {}", e);
                EventResult {
                    success: false,
                    url: None,
                    message: "イベント作成に失敗しました".to_string(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn try_create_event(&self, event: &EventData) -> Result<String> {
        info!(
            title = %event.title,
            candidates = event.date_candidates.len(),
            "調整さんイベント作成を開始"
        );

        self.navigate(CHOUSEISAN_URL)?;

        self.fill(TITLE_SELECTOR, &event.title)?;

        if let Some(memo) = &event.memo {
            self.fill(MEMO_SELECTOR, memo)?;
        }

        if let Some(label) = &event.time_label {
            self.fill(TIME_SUFFIX_SELECTOR, label)?;
        }

        if !event.date_candidates.is_empty() {
            self.fill(CANDIDATES_SELECTOR, &event.date_candidates.join("\n"))?;
        }

        self.click_create_button()?;
        self.wait_for_completion()?;

        let url = self.extract_event_url()?;
        info!(url = %url, "調整さんイベントを作成");
        Ok(url)
    }

    /// アクティブタブ
    fn active_tab(&self) -> Result<Arc<Tab>> {
        let tabs = self.browser.get_tabs();
        let guard = tabs
            .lock()
            .map_err(|e| AutomationError::TabError(format!("Failed to lock tabs: {}", e)))?;

        guard
            .first()
            .cloned()
            .ok_or_else(|| AutomationError::TabError("No active tab available".to_string()))
    }

    /// URL へ遷移してロード完了を待つ
    fn navigate(&self, url: &str) -> Result<()> {
        let tab = self.active_tab()?;

        debug!("Navigating to: {}", url);

        tab.navigate_to(url)
            .map_err(|e| AutomationError::Navigation(format!("Failed to navigate to {}: {}", url, e)))?;

        tab.wait_until_navigated()
            .map_err(|e| AutomationError::Navigation(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// 入力欄にフォーカスしてテキストを流し込む
    ///
    /// 日本語を含むので press_key ではなく insertText を使います。
    fn fill(&self, selector: &str, text: &str) -> Result<()> {
        let tab = self.active_tab()?;

        debug!("Filling element: {} ({} chars)", selector, text.chars().count());

        let element = tab
            .wait_for_element_with_custom_timeout(
                selector,
                Duration::from_secs(self.config.element_timeout),
            )
            .map_err(|e| {
                AutomationError::ElementNotFound(format!("Element '{}' not found: {}", selector, e))
            })?;

        element.click().map_err(|e| {
            AutomationError::Interaction(format!("Failed to focus '{}': {}", selector, e))
        })?;

        tab.send_character(text).map_err(|e| {
            AutomationError::Interaction(format!("Failed to type into '{}': {}", selector, e))
        })?;

        Ok(())
    }

    /// 出欠表をつくるボタンを押す
    fn click_create_button(&self) -> Result<()> {
        let tab = self.active_tab()?;

        let button = tab
            .wait_for_xpath_with_custom_timeout(
                CREATE_BUTTON_XPATH,
                Duration::from_secs(self.config.element_timeout),
            )
            .map_err(|e| {
                AutomationError::ElementNotFound(format!("Create button not found: {}", e))
            })?;

        button.click().map_err(|e| {
            AutomationError::Interaction(format!("Failed to click create button: {}", e))
        })?;

        Ok(())
    }

    /// 作成完了ページへ遷移するまでポーリングで待つ
    fn wait_for_completion(&self) -> Result<()> {
        let tab = self.active_tab()?;
        let deadline = Instant::now() + Duration::from_secs(self.config.navigation_timeout);

        loop {
            let url = tab.get_url();
            if url.contains(COMPLETE_URL_MARKER) {
                debug!("Reached completion page: {}", url);
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AutomationError::Timeout(format!(
                    "create_complete page not reached (current: {})",
                    url
                )));
            }
            std::thread::sleep(Duration::from_millis(500));
        }
    }

    /// 完了ページの共有 URL を読み取る
    fn extract_event_url(&self) -> Result<String> {
        let tab = self.active_tab()?;

        let result = tab
            .evaluate(
                r#"document.querySelector('input[type="text"]')?.value ?? """#,
                false,
            )
            .map_err(|e| AutomationError::Extraction(format!("Failed to read event URL: {}", e)))?;

        match result.value {
            Some(serde_json::Value::String(url)) if !url.is_empty() => Ok(url),
            _ => Err(AutomationError::Extraction(
                "Event URL field is empty".to_string(),
            )),
        }
    }

    /// ドライバ設定
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }
}

impl Drop for ChouseisanDriver {
    fn drop(&mut self) {
        debug!("ブラウザセッションを終了");
        // Browser は drop 時に自動的に閉じる
    }
}
