//! chousei-browser: 調整さんフォームの自動操作
//!
//! headless Chrome で <https://chouseisan.com/> のイベント作成フォームを
//! 埋めて送信し、発行されたイベント URL を取り出します。
//!
//! このクレートは日程の解析を一切知りません。受け取るのはタイトル、
//! メモ、時間ラベル、整形済みの候補行リストだけです。
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chousei_browser::{ChouseisanDriver, DriverConfig};
//! use chousei_core::EventData;
//!
//! let driver = ChouseisanDriver::launch(DriverConfig::default())?;
//! let result = driver.create_event(&EventData {
//!     title: "飲み会".to_string(),
//!     memo: None,
//!     time_label: Some("19:30〜".to_string()),
//!     date_candidates: vec!["7月4日(金) 19:30〜".to_string()],
//! });
//! ```

pub mod driver;
pub mod error;

pub use driver::{ChouseisanDriver, DriverConfig, DriverConfigBuilder};
pub use error::{AutomationError, Result};
