//! String analysis module - derives structural properties from raw strings / 字符串分析模块
//!
//! Architecture principles / 架构原则：
//! - Pure functions only: no I/O, no shared state / 纯函数，无I/O，无共享状态
//! - `analyze` and `fingerprint` are total: every `&str` is valid input / 对任意输入都有定义
//! - Storage and HTTP call into this module, never the other way around / 调用方向单向

pub mod analyzer;
pub mod fingerprint;
pub mod frequency;

pub use analyzer::{analyze, Properties};
pub use fingerprint::{fingerprint, Fingerprint};
pub use frequency::CharacterFrequency;

use chrono::{DateTime, Utc};

/// Analyzed string record, the durable unit / 已分析的字符串记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedString {
    /// Original input, preserved exactly / 原始输入
    pub value: String,
    pub fingerprint: Fingerprint,
    pub properties: Properties,
    /// Assigned once at creation / 创建时间
    pub created_at: DateTime<Utc>,
}

impl AnalyzedString {
    /// Analyze a new string, timestamped now / 分析新字符串
    pub fn new(value: impl Into<String>) -> Self {
        Self::with_created_at(value, Utc::now())
    }

    pub fn with_created_at(value: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        let value = value.into();
        Self {
            fingerprint: fingerprint(&value),
            properties: analyze(&value),
            value,
            created_at,
        }
    }
}
