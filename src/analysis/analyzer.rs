//! Analyzer - computes the property record of a string / 字符串属性分析
//!
//! Properties / 属性：
//! - length: character count / 字符数
//! - is_palindrome: lower-cased, spaces removed, compared to its reverse / 回文判断
//! - unique_characters: distinct characters, case-sensitive / 不同字符数（区分大小写）
//! - word_count: whitespace-delimited tokens / 单词数
//! - character_frequency: per-character counts in first-occurrence order / 字符频率

use serde::{Deserialize, Serialize};

use super::frequency::CharacterFrequency;

/// Derived string properties, immutable once computed / 字符串属性
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    pub length: usize,
    pub is_palindrome: bool,
    pub unique_characters: usize,
    pub word_count: usize,
    #[serde(rename = "character_frequency_map")]
    pub character_frequency: CharacterFrequency,
}

/// Analyze a string / 分析字符串
///
/// Total and deterministic: the empty string yields length 0, palindrome true,
/// no words and an empty frequency map.
pub fn analyze(value: &str) -> Properties {
    let character_frequency = CharacterFrequency::from_text(value);

    Properties {
        length: value.chars().count(),
        is_palindrome: is_palindrome(value),
        // Raw characters, no case folding / 不做大小写折叠
        unique_characters: character_frequency.len(),
        word_count: value.split_whitespace().count(),
        character_frequency,
    }
}

/// Normalize for the palindrome check: lower-case and drop U+0020 only / 回文标准化
pub fn normalize_for_palindrome(value: &str) -> String {
    value.to_lowercase().chars().filter(|c| *c != ' ').collect()
}

/// Check palindrome on the normalized form / 回文检测
pub fn is_palindrome(value: &str) -> bool {
    let normalized: Vec<char> = normalize_for_palindrome(value).chars().collect();
    normalized.iter().eq(normalized.iter().rev())
}
