//! 基本データ型
//!
//! 日程候補、解析オプション、調整さんイベントの入出力型を定義します。

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// 曜日グリフ (日曜始まり)
pub const WEEKDAY_GLYPHS: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

/// 時間ラベルのデフォルト値
pub const DEFAULT_TIME_LABEL: &str = "19:30〜";

/// 曜日をグリフ 1 文字に変換
pub fn weekday_glyph(day: Weekday) -> &'static str {
    WEEKDAY_GLYPHS[day.num_days_from_sunday() as usize]
}

/// グリフ 1 文字を曜日に変換
pub fn glyph_to_weekday(glyph: char) -> Option<Weekday> {
    let day = match glyph {
        '日' => Weekday::Sun,
        '月' => Weekday::Mon,
        '火' => Weekday::Tue,
        '水' => Weekday::Wed,
        '木' => Weekday::Thu,
        '金' => Weekday::Fri,
        '土' => Weekday::Sat,
        _ => return None,
    };
    Some(day)
}

/// 具体的な日程候補
///
/// `formatted` は常に `date` と時間ラベルから再生成できる形で持ちます。
/// 手で書き換えることはありません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateCandidate {
    /// 候補日
    pub date: NaiveDate,
    /// 調整さん形式の表示文字列 (例: "7月18日(金) 19:30〜")
    pub formatted: String,
    /// 曜日
    pub day_of_week: Weekday,
}

/// 日程解析オプション
///
/// 呼び出し側が所有し、解析中は読み取り専用です。
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// 解析ウィンドウの開始日 (省略時は基準日)
    pub start_date: Option<NaiveDate>,
    /// 解析ウィンドウの終了日
    pub end_date: Option<NaiveDate>,
    /// 期間指定パターンで使う曜日フィルタ
    pub days_of_week: Option<Vec<Weekday>>,
    /// 時間ラベル (解析せず、そのまま表示に使う自由文字列)
    pub time_label: Option<String>,
}

impl ParseOptions {
    /// 有効な時間ラベル (未指定ならデフォルト)
    pub fn time_label(&self) -> &str {
        self.time_label.as_deref().unwrap_or(DEFAULT_TIME_LABEL)
    }
}

/// 調整さんイベント作成の入力
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventData {
    /// イベント名
    pub title: String,
    /// メモ欄
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// 時間ラベル
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_label: Option<String>,
    /// 整形済みの日程候補 (1 要素 1 行)
    pub date_candidates: Vec<String>,
}

/// 調整さんイベント作成の結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResult {
    /// 成功したか
    pub success: bool,
    /// 作成されたイベントの URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// 利用者向けメッセージ
    pub message: String,
    /// エラー詳細
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
