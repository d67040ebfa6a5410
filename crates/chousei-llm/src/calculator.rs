//! Gemini による日程計算
//!
//! 解析そのものは Gemini に委譲し、手元では出力の検証と
//! 失敗時のフォールバックだけを行います。

use std::sync::OnceLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;
use tracing::{info, warn};

use chousei_core::expand::next_friday;
use chousei_core::format::{format_candidate, is_candidate_line};

use crate::client::GeminiClient;
use crate::error::Result;
use crate::prompt::schedule_parsing_prompt;

/// 候補数の上限
const MAX_CANDIDATES: usize = 30;

/// ノイズ行の目印。プロンプトの見出しや説明文の残骸を落とすのに使う
const NOISE_MARKERS: [&str; 8] = [
    "現在日時",
    "日程指定",
    "出力形式",
    "要件",
    "日程候補:",
    "以下の",
    "生成しました",
    "候補は以下",
];

/// 行頭の箇条書き記号と番号
fn bullet_probes() -> &'static [Regex; 2] {
    static PROBES: OnceLock<[Regex; 2]> = OnceLock::new();
    PROBES.get_or_init(|| {
        [
            Regex::new(r"^[•・\-*]\s*").unwrap(),
            Regex::new(r"^[0-9]+\.\s*").unwrap(),
        ]
    })
}

/// Gemini ベースの日程計算
pub struct GeminiDateCalculator {
    client: GeminiClient,
}

impl GeminiDateCalculator {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    /// 日程テキストを解析して候補行のリストを返す
    ///
    /// API 呼び出しの失敗や、使える行が 1 つも無い応答はここで吸収し、
    /// 次の金曜日から 4 週分のフォールバックを返します。失敗を
    /// 呼び出し側へ伝播することはありません。
    pub async fn parse_schedule(
        &self,
        schedule_text: &str,
        time_label: &str,
        today: NaiveDate,
    ) -> Vec<String> {
        match self.try_parse(schedule_text, time_label, today).await {
            Ok(candidates) if !candidates.is_empty() => candidates,
            Ok(_) => {
                warn!("Gemini の応答に使える候補行が無いためフォールバック");
                fallback_dates(today, time_label)
            }
            Err(e) => {
                warn!("Gemini による日程解析エラー: {}", e);
                fallback_dates(today, time_label)
            }
        }
    }

    async fn try_parse(
        &self,
        schedule_text: &str,
        time_label: &str,
        today: NaiveDate,
    ) -> Result<Vec<String>> {
        let prompt = schedule_parsing_prompt(schedule_text, time_label, today);
        let response = self.client.generate(&prompt).await?;
        let candidates = extract_candidate_lines(&response);
        info!(count = candidates.len(), "Gemini から日程候補を抽出");
        Ok(candidates)
    }

    /// API 接続テスト
    pub async fn test_connection(&self) -> bool {
        self.client.test_connection().await
    }
}

/// Gemini の応答から候補行を抽出
///
/// 空行・短すぎる行・ノイズ行を落とし、行頭の記号を剥がした上で、
/// 候補行の形をしているものだけを上限件数まで集めます。
fn extract_candidate_lines(response: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    for line in response.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.chars().count() < 5
            || NOISE_MARKERS.iter().any(|marker| trimmed.contains(marker))
        {
            continue;
        }

        let cleaned = strip_bullet(trimmed);
        if !cleaned.is_empty() && is_candidate_line(&cleaned) && candidates.len() < MAX_CANDIDATES
        {
            candidates.push(cleaned);
        }
    }

    candidates
}

/// 行頭の箇条書き記号と "1. " 形式の番号を剥がす
fn strip_bullet(line: &str) -> String {
    let probes = bullet_probes();
    let line = probes[0].replace(line, "");
    probes[1].replace(&line, "").into_owned()
}

/// フォールバック: 次の金曜日から 4 週分
fn fallback_dates(today: NaiveDate, time_label: &str) -> Vec<String> {
    let first = next_friday(today);
    (0..4)
        .map(|week| format_candidate(first + Duration::days(week * 7), time_label))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_extract_keeps_only_candidate_lines() {
        let response = "以下の日程候補を生成しました\n\
                        7月4日(金) 19:30〜\n\
                        7月11日(金) 19:30〜\n\
                        \n\
                        日程候補: 上記の通り";
        let candidates = extract_candidate_lines(response);
        assert_eq!(
            candidates,
            vec!["7月4日(金) 19:30〜", "7月11日(金) 19:30〜"]
        );
    }

    #[test]
    fn test_extract_strips_bullets_and_numbers() {
        let response = "• 7月4日(金) 19:30〜\n・7月11日(金) 19:30〜\n1. 7月18日(金) 19:30〜";
        let candidates = extract_candidate_lines(response);
        assert_eq!(
            candidates,
            vec![
                "7月4日(金) 19:30〜",
                "7月11日(金) 19:30〜",
                "7月18日(金) 19:30〜"
            ]
        );
    }

    #[test]
    fn test_extract_drops_prompt_echo() {
        let response = "現在日時: 2025年7月1日火曜日\n要件に従って生成します\n7月4日(金) 19:30〜";
        let candidates = extract_candidate_lines(response);
        assert_eq!(candidates, vec!["7月4日(金) 19:30〜"]);
    }

    #[test]
    fn test_extract_drops_short_lines() {
        let response = "7/4\n7月4日(金) 19:30〜";
        let candidates = extract_candidate_lines(response);
        assert_eq!(candidates, vec!["7月4日(金) 19:30〜"]);
    }

    #[test]
    fn test_extract_caps_at_thirty() {
        let mut lines = Vec::new();
        for day in 1..=31 {
            lines.push(format!("7月{}日(金) 19:30〜", day));
        }
        let response = lines.join("\n");
        let candidates = extract_candidate_lines(&response);
        assert_eq!(candidates.len(), 30);
    }

    #[test]
    fn test_extract_slash_form_accepted() {
        let response = "7/4(金) 19:30〜";
        let candidates = extract_candidate_lines(response);
        assert_eq!(candidates, vec!["7/4(金) 19:30〜"]);
    }

    #[test]
    fn test_fallback_four_fridays() {
        // 2025-07-01 は火曜。次の金曜は 7/4
        let dates = fallback_dates(date(2025, 7, 1), "19:30〜");
        assert_eq!(
            dates,
            vec![
                "7月4日(金) 19:30〜",
                "7月11日(金) 19:30〜",
                "7月18日(金) 19:30〜",
                "7月25日(金) 19:30〜"
            ]
        );
    }

    #[test]
    fn test_fallback_on_friday_skips_today() {
        let dates = fallback_dates(date(2025, 7, 4), "19:30〜");
        assert_eq!(dates[0], "7月11日(金) 19:30〜");
        assert_eq!(dates.len(), 4);
    }
}
