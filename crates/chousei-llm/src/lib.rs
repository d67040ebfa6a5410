//! Gemini による日程推論
//!
//! 日程テキストの解析を Gemini API に委譲し、出力の検証・整形と
//! 失敗時のローカルフォールバックを提供します。API キーが無い環境では
//! このクレートを使わず、chousei-core のローカルエンジンだけで動かせます。

mod calculator;
mod client;
mod error;
mod prompt;
mod types;

pub use calculator::GeminiDateCalculator;
pub use client::GeminiClient;
pub use error::{LlmError, Result};
