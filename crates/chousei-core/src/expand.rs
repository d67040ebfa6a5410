//! 繰り返しパターンの展開
//!
//! 抽出済みパターンを、境界付きウィンドウ内の具体的な日程候補の列に
//! 展開します。どの分岐も `expand_range` に集約されるため、結果は常に
//! 昇順で、同じ日が二度現れることはありません。

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::format::format_candidate;
use crate::pattern::{PatternKind, SchedulePattern};
use crate::types::{DateCandidate, ParseOptions};

/// 月範囲パターンの既定曜日フィルタ (平日)
const DEFAULT_RANGE_DAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// フォールバック時の曜日 (金曜)
const FALLBACK_DAY: [Weekday; 1] = [Weekday::Fri];

/// start..=end を 1 日ずつ走査し、該当曜日の日を候補として集める
///
/// 走査が暦日単位なので重複は構造的に起きません。start > end なら空。
pub fn expand_range(
    start: NaiveDate,
    end: NaiveDate,
    days: &[Weekday],
    time_label: &str,
) -> Vec<DateCandidate> {
    let mut candidates = Vec::new();
    let mut current = start;
    while current <= end {
        if days.contains(&current.weekday()) {
            candidates.push(DateCandidate {
                date: current,
                formatted: format_candidate(current, time_label),
                day_of_week: current.weekday(),
            });
        }
        let Some(next) = current.succ_opt() else {
            break;
        };
        current = next;
    }
    candidates
}

/// パターンを日程候補の列に展開
pub fn expand(
    pattern: &SchedulePattern,
    options: &ParseOptions,
    today: NaiveDate,
) -> Vec<DateCandidate> {
    let time_label = options.time_label();

    match &pattern.kind {
        // 列挙された日付をそのまま候補にする。ウィンドウも曜日フィルタも無し
        PatternKind::SpecificDates(dates) => dates
            .iter()
            .map(|&date| DateCandidate {
                date,
                formatted: format_candidate(date, time_label),
                day_of_week: date.weekday(),
            })
            .collect(),

        PatternKind::Weekly { days, start } => {
            let window_start = start.or(options.start_date).unwrap_or(today);
            let window_end = options
                .end_date
                .unwrap_or_else(|| window_start + Duration::days(pattern.duration_days));
            expand_range(window_start, window_end, days, time_label)
        }

        PatternKind::MonthRange { start, end } => {
            let days = options
                .days_of_week
                .as_deref()
                .unwrap_or(&DEFAULT_RANGE_DAYS);
            expand_range(*start, *end, days, time_label)
        }

        // 未認識時は次の金曜日から、開始年の 7/31 までの金曜日
        PatternKind::Unrecognized => {
            let base = options.start_date.unwrap_or(today);
            let window_start = next_friday(base);
            let window_end = options.end_date.unwrap_or_else(|| {
                NaiveDate::from_ymd_opt(window_start.year(), 7, 31).unwrap_or(window_start)
            });
            expand_range(window_start, window_end, &FALLBACK_DAY, time_label)
        }
    }
}

/// 基準日の「次の金曜日」
///
/// 当日が金曜でも当日は返さず、ちょうど 7 日後になります。
pub fn next_friday(date: NaiveDate) -> NaiveDate {
    let days_until = (5 + 7 - i64::from(date.weekday().num_days_from_sunday())) % 7;
    let days_until = if days_until == 0 { 7 } else { days_until };
    date + Duration::days(days_until)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weekly(days: Vec<Weekday>, start: Option<NaiveDate>, duration_days: i64) -> SchedulePattern {
        SchedulePattern {
            kind: PatternKind::Weekly { days, start },
            duration_days,
        }
    }

    #[test]
    fn test_expand_range_keeps_only_requested_weekdays() {
        let days = [Weekday::Tue, Weekday::Thu];
        let candidates = expand_range(date(2025, 7, 1), date(2025, 7, 14), &days, "19:30〜");
        assert!(!candidates.is_empty());
        for candidate in &candidates {
            assert!(days.contains(&candidate.day_of_week));
            assert_eq!(candidate.day_of_week, candidate.date.weekday());
        }
    }

    #[test]
    fn test_expand_range_chronological_and_unique() {
        let days = [Weekday::Mon, Weekday::Wed, Weekday::Fri];
        let candidates = expand_range(date(2025, 7, 1), date(2025, 8, 31), &days, "19:30〜");
        for pair in candidates.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn test_expand_range_inclusive_bounds() {
        // 両端とも金曜
        let candidates = expand_range(date(2025, 7, 4), date(2025, 7, 11), &[Weekday::Fri], "〜");
        assert_eq!(
            candidates.iter().map(|c| c.date).collect::<Vec<_>>(),
            vec![date(2025, 7, 4), date(2025, 7, 11)]
        );
    }

    #[test]
    fn test_expand_range_inverted_is_empty() {
        let candidates = expand_range(date(2025, 9, 1), date(2025, 7, 1), &[Weekday::Fri], "〜");
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_specific_dates_no_filter() {
        let dates: BTreeSet<NaiveDate> =
            [date(2025, 1, 15), date(2025, 1, 22), date(2025, 1, 29)].into();
        let pattern = SchedulePattern {
            kind: PatternKind::SpecificDates(dates),
            duration_days: 90,
        };
        let candidates = expand(&pattern, &ParseOptions::default(), date(2025, 1, 1));
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].formatted, "1月15日(水) 19:30〜");
        assert_eq!(candidates[0].day_of_week, Weekday::Wed);
    }

    #[test]
    fn test_weekly_window_defaults_to_duration() {
        let today = date(2025, 7, 1);
        let pattern = weekly(vec![Weekday::Fri], None, 90);
        let candidates = expand(&pattern, &ParseOptions::default(), today);
        let last = candidates.last().unwrap();
        assert!(last.date <= today + Duration::days(90));
        assert_eq!(candidates[0].date, date(2025, 7, 4));
    }

    #[test]
    fn test_weekly_pattern_start_anchors_window() {
        // パターン側の開始日があればそこからウィンドウを取る
        let pattern = weekly(vec![Weekday::Fri], Some(date(2025, 9, 5)), 30);
        let candidates = expand(&pattern, &ParseOptions::default(), date(2025, 7, 1));
        assert_eq!(candidates[0].date, date(2025, 9, 5));
        let last = candidates.last().unwrap();
        assert!(last.date <= date(2025, 9, 5) + Duration::days(30));
    }

    #[test]
    fn test_weekly_explicit_end_wins() {
        let pattern = weekly(vec![Weekday::Fri], None, 90);
        let options = ParseOptions {
            end_date: Some(date(2025, 7, 18)),
            ..Default::default()
        };
        let candidates = expand(&pattern, &options, date(2025, 7, 1));
        assert_eq!(
            candidates.iter().map(|c| c.date).collect::<Vec<_>>(),
            vec![date(2025, 7, 4), date(2025, 7, 11), date(2025, 7, 18)]
        );
    }

    #[test]
    fn test_weekly_empty_days_yields_nothing() {
        let pattern = weekly(vec![], None, 90);
        let candidates = expand(&pattern, &ParseOptions::default(), date(2025, 7, 1));
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_month_range_defaults_to_weekdays() {
        let pattern = SchedulePattern {
            kind: PatternKind::MonthRange {
                start: date(2025, 7, 1),
                end: date(2025, 7, 31),
            },
            duration_days: 90,
        };
        let candidates = expand(&pattern, &ParseOptions::default(), date(2025, 6, 1));
        // 2025 年 7 月の平日は 23 日
        assert_eq!(candidates.len(), 23);
        assert!(candidates
            .iter()
            .all(|c| c.day_of_week != Weekday::Sat && c.day_of_week != Weekday::Sun));
    }

    #[test]
    fn test_month_range_honors_caller_weekday_filter() {
        let pattern = SchedulePattern {
            kind: PatternKind::MonthRange {
                start: date(2025, 7, 1),
                end: date(2025, 7, 31),
            },
            duration_days: 90,
        };
        let options = ParseOptions {
            days_of_week: Some(vec![Weekday::Sat]),
            ..Default::default()
        };
        let candidates = expand(&pattern, &options, date(2025, 6, 1));
        assert_eq!(
            candidates.iter().map(|c| c.date).collect::<Vec<_>>(),
            vec![
                date(2025, 7, 5),
                date(2025, 7, 12),
                date(2025, 7, 19),
                date(2025, 7, 26)
            ]
        );
    }

    #[test]
    fn test_fallback_fridays_until_end_of_july() {
        let pattern = SchedulePattern {
            kind: PatternKind::Unrecognized,
            duration_days: 90,
        };
        let candidates = expand(&pattern, &ParseOptions::default(), date(2025, 7, 1));
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
    fn test_fallback_starts_strictly_after_today() {
        // 金曜当日に呼んでも当日は含まない
        let friday = date(2025, 7, 4);
        let pattern = SchedulePattern {
            kind: PatternKind::Unrecognized,
            duration_days: 90,
        };
        let candidates = expand(&pattern, &ParseOptions::default(), friday);
        assert_eq!(candidates[0].date, date(2025, 7, 11));
    }

    #[test]
    fn test_next_friday_from_friday_is_a_week_later() {
        let friday = date(2025, 7, 11);
        assert_eq!(next_friday(friday), date(2025, 7, 18));
    }

    #[test]
    fn test_next_friday_from_monday() {
        let monday = date(2025, 7, 7);
        let next = next_friday(monday);
        assert_eq!(next, date(2025, 7, 11));
        assert_eq!(next.weekday(), Weekday::Fri);
        let diff = (next - monday).num_days();
        assert!((1..=6).contains(&diff));
    }
}
