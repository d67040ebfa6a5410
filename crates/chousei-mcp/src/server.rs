//! MCP server implementation
//!
//! 調整さんイベントの自動作成と日程候補プレビューの 2 つのツールを
//! 公開します。ツールの失敗はテキスト応答 (❌ メッセージ) として返し、
//! プロトコルエラーにはしません。

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use chousei_browser::{AutomationError, ChouseisanDriver, DriverConfig};
use chousei_core::{DEFAULT_TIME_LABEL, EventData, EventResult, ParseOptions, ScheduleParser};
use chousei_llm::{GeminiClient, GeminiDateCalculator};

use crate::config::{Config, Engine};

/// 作成結果に併記する候補の最大数
const SUCCESS_PREVIEW_LIMIT: usize = 5;

/// プレビューで表示する候補のデフォルト数
const DEFAULT_PREVIEW_LIMIT: usize = 10;

/// create_chouseisan_event の引数
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateEventParams {
    /// イベントのタイトル
    pub title: String,
    /// 日程の指定（自然言語）。例: "毎週金曜日", "1月15日、1月22日、1月29日", "毎週月水金", "1月から3月まで毎週火曜日"
    pub schedule: String,
    /// 時間帯の表記（例: "19:30〜", "10:00～12:00"）。省略時は "19:30〜"
    #[serde(default)]
    pub time_format: Option<String>,
    /// メモや説明文
    #[serde(default)]
    pub memo: Option<String>,
}

/// preview_schedule_candidates の引数
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PreviewParams {
    /// 日程の指定（自然言語）
    pub schedule: String,
    /// 時間帯の表記。省略時は "19:30〜"
    #[serde(default)]
    pub time_format: Option<String>,
    /// 表示する最大日程数。省略時は 10
    #[serde(default)]
    pub max_dates: Option<usize>,
}

/// 調整さん MCP サーバー
#[derive(Clone)]
pub struct ChouseiServer {
    config: Arc<Config>,
    gemini: Option<Arc<GeminiDateCalculator>>,
    tool_router: ToolRouter<Self>,
}

impl ChouseiServer {
    /// Create a new server with the given configuration.
    ///
    /// engine = "gemini" のときは API キーが必須で、無ければここで
    /// エラーになります。local エンジンは設定なしで動きます。
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let gemini = match config.engine {
            Engine::Local => None,
            Engine::Gemini => {
                let mut client = GeminiClient::new(config.gemini.api_key.clone())?;
                if let Some(url) = &config.gemini.api_url {
                    client = client.with_api_url(url.clone());
                }
                Some(Arc::new(GeminiDateCalculator::new(client)))
            }
        };

        Ok(Self {
            config: Arc::new(config),
            gemini,
            tool_router: Self::tool_router(),
        })
    }

    /// 設定からブラウザドライバ設定を組み立てる
    fn driver_config(&self) -> DriverConfig {
        DriverConfig::builder()
            .headless(self.config.browser.headless)
            .navigation_timeout(self.config.browser.navigation_timeout)
            .element_timeout(self.config.browser.element_timeout)
            .build()
    }

    /// 設定されたエンジンで日程候補行を生成する
    ///
    /// Gemini エンジンは失敗時にフォールバック候補を返すため、空に
    /// なり得るのは local エンジンで解析に失敗したときだけです。
    async fn candidate_lines(
        &self,
        schedule: &str,
        time_label: &str,
        today: NaiveDate,
    ) -> Vec<String> {
        match &self.gemini {
            Some(calculator) => calculator.parse_schedule(schedule, time_label, today).await,
            None => local_candidate_lines(schedule, time_label, today),
        }
    }
}

#[tool_router]
impl ChouseiServer {
    /// 調整さんイベントを作成し、発行された URL を返す。
    #[tool(
        description = "自然言語による日程指定で調整さんのイベントを自動作成します。例: '毎週金曜日 19:30から の会議' または '1月15日、1月22日、1月29日 の打ち合わせ'"
    )]
    async fn create_chouseisan_event(
        &self,
        Parameters(params): Parameters<CreateEventParams>,
    ) -> Result<CallToolResult, McpError> {
        let time_label = params
            .time_format
            .unwrap_or_else(|| DEFAULT_TIME_LABEL.to_string());
        let today = Local::now().date_naive();

        info!(title = %params.title, schedule = %params.schedule, "イベント作成リクエストを受信");

        let candidates = self
            .candidate_lines(&params.schedule, &time_label, today)
            .await;

        if candidates.is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(
                parse_failure_text(&params.schedule, true),
            )]));
        }

        info!(count = candidates.len(), "日程候補を生成、ブラウザ自動化を開始");

        let event = EventData {
            title: params.title.clone(),
            memo: params.memo.clone(),
            time_label: Some(time_label),
            date_candidates: candidates.clone(),
        };
        let driver_config = self.driver_config();

        // headless_chrome は同期 API のため blocking スレッドで実行する
        let result = tokio::task::spawn_blocking(move || {
            let driver = ChouseisanDriver::launch(driver_config)?;
            Ok::<_, AutomationError>(driver.create_event(&event))
        })
        .await;

        let text = match result {
            Ok(Ok(outcome)) => match (outcome.success, &outcome.url) {
                (true, Some(url)) => success_text(&params.title, url, &candidates),
                _ => creation_failure_text(&outcome),
            },
            Ok(Err(e)) => {
                error!("ブラウザの初期化に失敗: {}", e);
                "❌ ブラウザの初期化に失敗しました。システム管理者にお問い合わせください。"
                    .to_string()
            }
            Err(e) => {
                error!("ブラウザタスクの実行に失敗: {}", e);
                format!("❌ 予期しないエラーが発生しました: {}", e)
            }
        };

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// 日程候補を生成してプレビューする (イベントは作成しない)。
    #[tool(
        description = "自然言語による日程指定を解析し、生成される日程候補をプレビューします"
    )]
    async fn preview_schedule_candidates(
        &self,
        Parameters(params): Parameters<PreviewParams>,
    ) -> Result<CallToolResult, McpError> {
        let time_label = params
            .time_format
            .unwrap_or_else(|| DEFAULT_TIME_LABEL.to_string());
        let max_dates = params.max_dates.unwrap_or(DEFAULT_PREVIEW_LIMIT);
        let today = Local::now().date_naive();

        // プレビューは決定的なローカル解析のみ (Gemini には問い合わせない)
        let candidates = local_candidate_lines(&params.schedule, &time_label, today);

        let text = if candidates.is_empty() {
            parse_failure_text(&params.schedule, false)
        } else {
            preview_text(&params.schedule, &time_label, &candidates, max_dates)
        };

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_handler]
impl ServerHandler for ChouseiServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "自然言語の日程指定から調整さん (https://chouseisan.com/) のイベントを自動作成する MCP サーバーです。\
                 create_chouseisan_event でイベントを作成して出欠表の URL を受け取り、\
                 preview_schedule_candidates で作成前に日程候補を確認できます。"
                    .to_string(),
            ),
        }
    }
}

/// ローカルエンジンで日程候補行を生成する
fn local_candidate_lines(schedule: &str, time_label: &str, today: NaiveDate) -> Vec<String> {
    let options = ParseOptions {
        time_label: Some(time_label.to_string()),
        ..Default::default()
    };

    ScheduleParser::new(today)
        .parse(schedule, &options)
        .into_iter()
        .map(|candidate| candidate.formatted)
        .collect()
}

/// 解析失敗メッセージ
///
/// イベント作成では期間指定を含む 4 つの形式例、プレビューでは 3 つを示す。
fn parse_failure_text(schedule: &str, with_range_example: bool) -> String {
    let mut text = format!(
        "❌ 日程の解析に失敗しました。\n指定された日程: \"{}\"\n\n有効な形式例:\n- \"毎週金曜日\"\n- \"1月15日、1月22日、1月29日\"\n- \"毎週月水金\"",
        schedule
    );
    if with_range_example {
        text.push_str("\n- \"1月から3月まで毎週火曜日\"");
    }
    text
}

/// イベント作成成功メッセージ
fn success_text(title: &str, url: &str, candidates: &[String]) -> String {
    let shown: Vec<String> = candidates
        .iter()
        .take(SUCCESS_PREVIEW_LIMIT)
        .map(|line| format!("• {}", line))
        .collect();

    let mut text = format!(
        "✅ 調整さんイベントを作成しました！\n\n📅 **{}**\n🔗 **URL**: {}\n\n📋 **日程候補** ({}件):\n{}",
        title,
        url,
        candidates.len(),
        shown.join("\n")
    );
    if candidates.len() > SUCCESS_PREVIEW_LIMIT {
        text.push_str(&format!(
            "\n... 他{}件",
            candidates.len() - SUCCESS_PREVIEW_LIMIT
        ));
    }
    text.push_str("\n\n💡 このURLを参加者に共有してください。");
    text
}

/// イベント作成失敗メッセージ (エラー詳細があればそちらを優先)
fn creation_failure_text(outcome: &EventResult) -> String {
    let reason = outcome.error.as_deref().unwrap_or(&outcome.message);
    format!(
        "❌ 調整さんの作成に失敗しました。\n\nエラー: {}\n\n再度お試しいただくか、手動で https://chouseisan.com/ にアクセスして作成してください。",
        reason
    )
}

/// 日程候補プレビューメッセージ
fn preview_text(
    schedule: &str,
    time_label: &str,
    candidates: &[String],
    max_dates: usize,
) -> String {
    let shown: Vec<String> = candidates
        .iter()
        .take(max_dates)
        .enumerate()
        .map(|(i, line)| format!("{}. {}", i + 1, line))
        .collect();

    let mut text = format!(
        "📅 **日程候補プレビュー**\n\n🔍 **解析した日程**: \"{}\"\n⏰ **時間**: {}\n📊 **生成された候補数**: {}件\n\n📋 **日程一覧** (最初の{}件):\n{}",
        schedule,
        time_label,
        candidates.len(),
        shown.len(),
        shown.join("\n")
    );
    if candidates.len() > max_dates {
        text.push_str(&format!(
            "\n\n... 他{}件の候補があります",
            candidates.len() - max_dates
        ));
    }
    text
}
