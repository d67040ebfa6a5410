//! 日程解析プロンプト
//!
//! 基準日・日程テキスト・時間ラベルを埋め込んだ日本語プロンプトを
//! 組み立てます。祝日の除外はローカルでは計算せず、ここで依頼するだけです。

use chousei_core::types::weekday_glyph;
use chrono::{Datelike, NaiveDate};

/// 基準日を日本語の長い形式にする (例: "2025年7月1日火曜日")
fn reference_date(today: NaiveDate) -> String {
    format!(
        "{}年{}月{}日{}曜日",
        today.year(),
        today.month(),
        today.day(),
        weekday_glyph(today.weekday())
    )
}

/// 日程解析用プロンプトを組み立てる
pub fn schedule_parsing_prompt(schedule_text: &str, time_label: &str, today: NaiveDate) -> String {
    format!(
        r#"現在日時: {}

以下の自然言語による日程指定を解析して、調整さん用の日程候補リストを生成してください。

日程指定: "{}"
時間フォーマット: "{}"

出力形式（この形式で1行ずつ出力してください）：
7月4日(金) 19:30〜
7月11日(金) 19:30〜
7月18日(金) 19:30〜
7月25日(金) 19:30〜

要件：
- 現在日時から将来の日程のみ生成
- 指定された時間フォーマットを使用
- 日本語形式で出力（月日(曜日) 時間〜）
- 最大30個の候補を生成
- 箇条書き記号（•）は付けない
- 各行に1つの日程のみ記載
- 余計な説明文は不要、日程候補のみを出力
- 日本の祝日は除外してください。

日程候補:"#,
        reference_date(today),
        schedule_text,
        time_label
    )
}
