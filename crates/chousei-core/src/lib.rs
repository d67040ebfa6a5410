//! 調整さん向け日程推論エンジン
//!
//! 自然言語 (日本語) の日程テキストを解析し、調整さんの候補日欄に
//! そのまま貼り付けられる形式の日程候補リストを生成します。
//! 解析は純粋な計算で、共有状態もバックグラウンドタスクも持ちません。

pub mod exclusion;
pub mod expand;
pub mod format;
pub mod parser;
pub mod pattern;
pub mod types;

pub use parser::ScheduleParser;
pub use pattern::{PatternKind, SchedulePattern};
pub use types::{DateCandidate, EventData, EventResult, ParseOptions, DEFAULT_TIME_LABEL};
