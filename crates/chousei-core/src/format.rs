//! 日程候補のフォーマット
//!
//! 調整さんの候補日欄が受け付ける "7月18日(金) 19:30〜" 形式を生成し、
//! 外部から来たテキストがその形をしているかを検査します。

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::types::weekday_glyph;

/// 候補行として受理する形 (M月D日(曜) と M/D(曜) の 2 種類)
fn candidate_line_probes() -> &'static [Regex; 2] {
    static PROBES: OnceLock<[Regex; 2]> = OnceLock::new();
    PROBES.get_or_init(|| {
        [
            Regex::new(r"[0-9]{1,2}月[0-9]{1,2}日\([月火水木金土日]\)").unwrap(),
            Regex::new(r"[0-9]{1,2}/[0-9]{1,2}\([月火水木金土日]\)").unwrap(),
        ]
    })
}

/// 日付と時間ラベルを調整さん形式の 1 行にする
///
/// 月日はゼロ埋めしません。
pub fn format_candidate(date: NaiveDate, time_label: &str) -> String {
    format!(
        "{}月{}日({}) {}",
        date.month(),
        date.day(),
        weekday_glyph(date.weekday()),
        time_label
    )
}

/// 候補行として扱える形かを検査
///
/// LLM など外部コラボレータが生成したテキストから、見出しや説明文の
/// ノイズ行を落とすために使います。
pub fn is_candidate_line(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }
    candidate_line_probes().iter().any(|probe| probe.is_match(line))
}
