//! 除外日付の解決
//!
//! "7/11は除く" や "ただし7月21日は除く" のような除外指定を抽出し、
//! パターン解析の前にテキストから取り除きます。除外構文が
//! 繰り返しパターンとして誤認識されるのを防ぐため、抽出と除去は
//! 必ずセットで使います。

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::types::DateCandidate;

/// 除外指定の正規表現一式
struct ExclusionProbes {
    /// "M/D は除く" 系 (区切りは / - 月 のいずれか)
    slash_style: Regex,
    /// "ただし M月D日 は除く" 系
    tadashi_style: Regex,
    /// 除去用。読点付き ただし句
    strip_tadashi_comma: Regex,
    /// 除去用。ただし句
    strip_tadashi: Regex,
    /// 除去用。読点付き M/D 句
    strip_slash_comma: Regex,
    /// 除去用。M/D 句
    strip_slash: Regex,
}

fn probes() -> &'static ExclusionProbes {
    static PROBES: OnceLock<ExclusionProbes> = OnceLock::new();
    PROBES.get_or_init(ExclusionProbes::new)
}

impl ExclusionProbes {
    fn new() -> Self {
        Self {
            slash_style: Regex::new(r"([0-9]{1,2})[/\-月]([0-9]{1,2})日?\s*[はを]*(?:除外|除く)")
                .unwrap(),
            tadashi_style: Regex::new(
                r"ただし\s*([0-9]{1,2})\s*月\s*([0-9]{1,2})\s*日[はを]*(?:除外|除く)",
            )
            .unwrap(),
            strip_tadashi_comma: Regex::new(r"[、，]\s*ただし.*?(?:除外|除く)").unwrap(),
            strip_tadashi: Regex::new(r"\s*ただし.*?(?:除外|除く)").unwrap(),
            strip_slash_comma: Regex::new(
                r"[、，]\s*[0-9]{1,2}[/\-月][0-9]{1,2}日?\s*[はを]*(?:除外|除く)",
            )
            .unwrap(),
            strip_slash: Regex::new(r"\s*[0-9]{1,2}[/\-月][0-9]{1,2}日?\s*[はを]*(?:除外|除く)")
                .unwrap(),
        }
    }
}

/// テキストから除外日付を抽出
///
/// 年の指定は無いので今年として解釈し、既に過ぎた日付は翌年へ
/// 繰り上げます (12 月に「1月5日は除く」と言うケース)。
pub fn extract_exclusions(text: &str, today: NaiveDate) -> HashSet<NaiveDate> {
    let probes = probes();
    let mut excluded = HashSet::new();

    for caps in probes
        .slash_style
        .captures_iter(text)
        .chain(probes.tadashi_style.captures_iter(text))
    {
        let month: u32 = caps[1].parse().unwrap_or(0);
        let day: u32 = caps[2].parse().unwrap_or(0);
        if let Some(date) = resolve_exclusion(month, day, today) {
            excluded.insert(date);
        }
    }

    excluded
}

/// 月日を今年または翌年の日付に解決
fn resolve_exclusion(month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    let date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if date < today {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day)
    } else {
        Some(date)
    }
}

/// 除外指定の句をテキストから取り除く
pub fn strip_exclusions(text: &str) -> String {
    let probes = probes();
    let text = probes.strip_tadashi_comma.replace_all(text, "");
    let text = probes.strip_tadashi.replace_all(&text, "");
    let text = probes.strip_slash_comma.replace_all(&text, "");
    let text = probes.strip_slash.replace_all(&text, "");
    text.trim().to_string()
}

/// 候補リストに除外を適用
///
/// 年月日がすべて一致する候補だけを落とします。適用は冪等です。
pub fn apply_exclusions(
    candidates: Vec<DateCandidate>,
    exclusions: &HashSet<NaiveDate>,
) -> Vec<DateCandidate> {
    if exclusions.is_empty() {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|candidate| !exclusions.contains(&candidate.date))
        .collect()
}
