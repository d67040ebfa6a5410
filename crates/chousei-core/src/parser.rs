//! 日程解析ファサード
//!
//! 除外抽出 → テキスト洗浄 → パターン抽出 → 展開 → 除外適用 の順に
//! 各段を束ねる、このクレート唯一の入口です。基準日 (「今日」) を
//! 外から渡すので、システム時計に依存せず再現可能なテストが書けます。

use chrono::NaiveDate;
use tracing::debug;

use crate::exclusion::{apply_exclusions, extract_exclusions, strip_exclusions};
use crate::expand::expand;
use crate::pattern::extract_pattern;
use crate::types::{DateCandidate, ParseOptions};

/// 日程解析エンジン
///
/// 解析は純粋な計算で、呼び出しごとに独立しています。解析不能な
/// テキストでもエラーにはならず、フォールバックか空リストを返します。
#[derive(Debug, Clone, Copy)]
pub struct ScheduleParser {
    /// 「今日」として扱う基準日
    today: NaiveDate,
}

impl ScheduleParser {
    /// 基準日を指定してパーサを作る
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// 基準日
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// 自然言語の日程テキストを候補リストに解析する
    pub fn parse(&self, text: &str, options: &ParseOptions) -> Vec<DateCandidate> {
        debug!(text, "日程解析を開始");

        // 除外の抽出と除去を先に行い、除外構文をパターン解析から隠す
        let exclusions = extract_exclusions(text, self.today);
        let cleaned = strip_exclusions(text);
        let pattern = extract_pattern(&cleaned, self.today);
        debug!(?pattern, exclusions = exclusions.len(), "パターンを抽出");

        let candidates = expand(&pattern, options, self.today);
        let candidates = apply_exclusions(candidates, &exclusions);
        debug!(count = candidates.len(), "日程候補を生成");

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_specific_dates_scenario() {
        let parser = ScheduleParser::new(date(2025, 1, 1));
        let candidates = parser.parse("1月15日、1月22日、1月29日", &ParseOptions::default());
        assert_eq!(
            candidates.iter().map(|c| c.date).collect::<Vec<_>>(),
            vec![date(2025, 1, 15), date(2025, 1, 22), date(2025, 1, 29)]
        );
        assert_eq!(candidates[0].formatted, "1月15日(水) 19:30〜");
    }

    #[test]
    fn test_weekly_scenario_within_90_days() {
        let today = date(2025, 7, 1);
        let parser = ScheduleParser::new(today);
        let candidates = parser.parse("毎週月水金", &ParseOptions::default());

        assert!(!candidates.is_empty());
        assert_eq!(candidates[0].date, date(2025, 7, 2));
        let allowed = [Weekday::Mon, Weekday::Wed, Weekday::Fri];
        for candidate in &candidates {
            assert!(allowed.contains(&candidate.day_of_week));
            assert!(candidate.date > today - chrono::Duration::days(1));
            assert!(candidate.date <= today + chrono::Duration::days(90));
        }
        for pair in candidates.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn test_weekly_with_exclusion_scenario() {
        let parser = ScheduleParser::new(date(2025, 7, 1));
        let options = ParseOptions {
            end_date: Some(date(2025, 7, 31)),
            ..Default::default()
        };
        let candidates = parser.parse("毎週金曜日、7/11は除く", &options);
        assert_eq!(
            candidates.iter().map(|c| c.date).collect::<Vec<_>>(),
            vec![date(2025, 7, 4), date(2025, 7, 18), date(2025, 7, 25)]
        );
    }

    #[test]
    fn test_specific_dates_with_exclusion() {
        let parser = ScheduleParser::new(date(2025, 7, 1));
        let candidates = parser.parse(
            "7月11日、7月18日、7月25日、ただし7月18日は除く",
            &ParseOptions::default(),
        );
        assert_eq!(
            candidates.iter().map(|c| c.date).collect::<Vec<_>>(),
            vec![date(2025, 7, 11), date(2025, 7, 25)]
        );
    }

    #[test]
    fn test_fallback_scenario() {
        let parser = ScheduleParser::new(date(2025, 7, 1));
        let candidates = parser.parse("そのうち、いい感じで", &ParseOptions::default());
        assert_eq!(
            candidates.iter().map(|c| c.date).collect::<Vec<_>>(),
            vec![
                date(2025, 7, 4),
                date(2025, 7, 11),
                date(2025, 7, 18),
                date(2025, 7, 25)
            ]
        );
        assert!(candidates.iter().all(|c| c.day_of_week == Weekday::Fri));
    }

    #[test]
    fn test_exclusion_only_text_falls_back() {
        // 除外句を取り除くと空文字になり、フォールバックに入る。
        // その上で除外も適用される
        let parser = ScheduleParser::new(date(2025, 7, 1));
        let candidates = parser.parse("7/11は除く", &ParseOptions::default());
        assert_eq!(
            candidates.iter().map(|c| c.date).collect::<Vec<_>>(),
            vec![date(2025, 7, 4), date(2025, 7, 18), date(2025, 7, 25)]
        );
    }

    #[test]
    fn test_month_range_scenario() {
        let parser = ScheduleParser::new(date(2025, 6, 1));
        let candidates = parser.parse("7月から8月の平日", &ParseOptions::default());
        assert_eq!(candidates.first().map(|c| c.date), Some(date(2025, 7, 1)));
        assert_eq!(candidates.last().map(|c| c.date), Some(date(2025, 8, 29)));
        assert!(candidates
            .iter()
            .all(|c| c.day_of_week != Weekday::Sat && c.day_of_week != Weekday::Sun));
    }

    #[test]
    fn test_invalid_literals_yield_empty_result() {
        let parser = ScheduleParser::new(date(2025, 1, 1));
        let candidates = parser.parse("13月40日", &ParseOptions::default());
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_time_label_passthrough() {
        let parser = ScheduleParser::new(date(2025, 7, 1));
        let options = ParseOptions {
            time_label: Some("14:00〜16:00".to_string()),
            ..Default::default()
        };
        let candidates = parser.parse("7月18日", &options);
        assert_eq!(candidates[0].formatted, "7月18日(金) 14:00〜16:00");
    }
}
