//! パターン抽出
//!
//! 自然言語の日程テキストから繰り返しパターンを抽出します。
//! 独立した正規表現プローブを固定の優先順で当て、最初に認識した
//! パターンだけを採用します (具体日付 > 毎週 > 月範囲 > 未認識)。

use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, Weekday};
use regex::Regex;
use tracing::warn;

use crate::types::glyph_to_weekday;

/// 認識した日程パターン
///
/// 1 回の解析で有効になるのは必ず 1 種類だけです。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternKind {
    /// 具体的な日付の列挙 (例: "1月15日、1月22日")
    ///
    /// 暦順に整列し、重複は除きます。
    SpecificDates(BTreeSet<NaiveDate>),
    /// 毎週の繰り返し (例: "毎週月水金"、"4月以降毎週火")
    Weekly {
        days: Vec<Weekday>,
        /// 開始月指定から求めた明示的な開始日
        start: Option<NaiveDate>,
    },
    /// 月単位の期間指定 (例: "7月から9月")
    MonthRange { start: NaiveDate, end: NaiveDate },
    /// どのパターンにも一致しない
    Unrecognized,
}

/// 抽出結果。パターン本体と期間ヒントを持ちます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulePattern {
    pub kind: PatternKind,
    /// 期間ヒント (日数)。終了日が明示されないときの展開幅になります。
    pub duration_days: i64,
}

/// パターン抽出用の正規表現一式
struct Probes {
    /// "N月N日" の列挙
    specific_date: Regex,
    /// "毎週" + 曜日グリフ列
    weekly: Regex,
    /// 毎週パターンに付く開始月指定 ("N月以降" / "N月から")
    weekly_start_month: Regex,
    /// "N月からN月" の期間指定
    month_range: Regex,
}

fn probes() -> &'static Probes {
    static PROBES: OnceLock<Probes> = OnceLock::new();
    PROBES.get_or_init(Probes::new)
}

impl Probes {
    fn new() -> Self {
        // [0-9] 固定。\d だと全角数字まで拾ってしまう
        Self {
            specific_date: Regex::new(r"([0-9]{1,2})月([0-9]{1,2})日").unwrap(),
            weekly: Regex::new(r"毎週([月火水木金土日]+)").unwrap(),
            weekly_start_month: Regex::new(r"([0-9]{1,2})月以降|([0-9]{1,2})月から").unwrap(),
            month_range: Regex::new(r"([0-9]{1,2})月から([0-9]{1,2})月").unwrap(),
        }
    }
}

/// 解析用にテキストを正規化 (小文字化 + 空白除去)
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// テキストから日程パターンを抽出
///
/// 除外指定は事前に取り除かれている前提です。年の明示が無い日付は
/// `today` の年で解釈します。
pub fn extract_pattern(text: &str, today: NaiveDate) -> SchedulePattern {
    let text = normalize(text);
    let probes = probes();
    let duration_days = duration_hint(&text, today);

    // 具体的な日付の列挙。1 つでも見つかれば他のパターンは見ない
    let mut saw_literal = false;
    let mut dates = BTreeSet::new();
    for caps in probes.specific_date.captures_iter(&text) {
        saw_literal = true;
        let month: u32 = caps[1].parse().unwrap_or(0);
        let day: u32 = caps[2].parse().unwrap_or(0);
        match NaiveDate::from_ymd_opt(today.year(), month, day) {
            Some(date) => {
                dates.insert(date);
            }
            None => {
                warn!(month, day, "暦上存在しない日付指定をスキップ");
            }
        }
    }
    if saw_literal {
        return SchedulePattern {
            kind: PatternKind::SpecificDates(dates),
            duration_days,
        };
    }

    // 毎週パターン
    if let Some(caps) = probes.weekly.captures(&text) {
        let days: Vec<Weekday> = caps[1].chars().filter_map(glyph_to_weekday).collect();
        let start = probes
            .weekly_start_month
            .captures(&text)
            .and_then(|m| m.get(1).or_else(|| m.get(2)))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .and_then(|month| weekly_start_date(month, &days, today));
        return SchedulePattern {
            kind: PatternKind::Weekly { days, start },
            duration_days,
        };
    }

    // 月範囲パターン
    if let Some(caps) = probes.month_range.captures(&text) {
        let start_month: u32 = caps[1].parse().unwrap_or(0);
        let end_month: u32 = caps[2].parse().unwrap_or(0);
        if let Some((start, end)) = month_range_bounds(start_month, end_month, today.year()) {
            return SchedulePattern {
                kind: PatternKind::MonthRange { start, end },
                duration_days,
            };
        }
    }

    SchedulePattern {
        kind: PatternKind::Unrecognized,
        duration_days,
    }
}

/// 毎週パターンの開始日を計算
///
/// 指定月がまだ過ぎていなければ今年、過ぎていれば来年として月初を取り、
/// 月内で最初に該当曜日へ当たる日を探します。見つからなければ月初。
fn weekly_start_date(month: u32, days: &[Weekday], today: NaiveDate) -> Option<NaiveDate> {
    let year = if month >= today.month() {
        today.year()
    } else {
        today.year() + 1
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let mut day = first;
    while day.month() == month {
        if days.contains(&day.weekday()) {
            return Some(day);
        }
        day = day.succ_opt()?;
    }
    Some(first)
}

/// 月範囲の両端 (開始月の 1 日から終了月の末日まで、同一年内)
///
/// 終了月が開始月より前の場合は逆転した範囲になり、展開すると空になります。
/// 年またぎの解釈はしません。
fn month_range_bounds(
    start_month: u32,
    end_month: u32,
    year: i32,
) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, start_month, 1)?;
    let end = last_day_of_month(year, end_month)?;
    Some((start, end))
}

/// 指定月の末日
fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    next_first.pred_opt()
}

/// 期間ヒントを推定 (日数)
///
/// 固定フレーズの包含チェックを順に適用し、後のものが勝ちます。
fn duration_hint(normalized: &str, today: NaiveDate) -> i64 {
    let mut duration = 90;
    if normalized.contains("来月まで") {
        duration = 60;
    }
    if normalized.contains("半年") {
        duration = 180;
    }
    if normalized.contains("1年") {
        duration = 365;
    }
    if normalized.contains("年末まで") {
        if let Some(year_end) = NaiveDate::from_ymd_opt(today.year(), 12, 31) {
            duration = (year_end - today).num_days();
        }
    }
    duration
}
