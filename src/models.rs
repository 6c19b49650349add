use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalyzedString, CharacterFrequency};
use crate::filter::FilterCriteria;

/// Row of the `string_analysis` table / 数据表行
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StringRow {
    pub id: String,
    pub value: String,
    pub length: i64,
    pub is_palindrome: bool,
    pub unique_characters: i64,
    pub word_count: i64,
    /// JSON object, keys in first-occurrence order / JSON 对象
    pub character_frequency_map: String,
    pub created_at: String,
}

/// RFC 3339 UTC timestamp with millisecond precision and a `Z` suffix / 时间格式
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringProperties {
    pub length: usize,
    pub is_palindrome: bool,
    pub unique_characters: usize,
    pub word_count: usize,
    pub sha256_hash: String,
    pub character_frequency_map: CharacterFrequency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringResponse {
    pub id: String,
    pub value: String,
    pub properties: StringProperties,
    pub created_at: String,
}

impl From<&AnalyzedString> for StringResponse {
    fn from(record: &AnalyzedString) -> Self {
        let props = &record.properties;
        Self {
            id: record.fingerprint.to_string(),
            value: record.value.clone(),
            properties: StringProperties {
                length: props.length,
                is_palindrome: props.is_palindrome,
                unique_characters: props.unique_characters,
                word_count: props.word_count,
                sha256_hash: record.fingerprint.to_string(),
                character_frequency_map: props.character_frequency.clone(),
            },
            created_at: format_timestamp(&record.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringListResponse {
    pub data: Vec<StringResponse>,
    pub count: usize,
    pub filters_applied: FilterCriteria,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpretedQuery {
    pub original: String,
    pub parsed_filters: FilterCriteria,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaturalLanguageResponse {
    pub data: Vec<StringResponse>,
    pub count: usize,
    pub interpreted_query: InterpretedQuery,
}

/// Structured filter parameters of `GET /strings` / 结构化过滤参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListStringsQuery {
    #[serde(default, alias = "palindrome")]
    pub is_palindrome: Option<bool>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub word_count: Option<usize>,
    #[serde(default)]
    pub contains_character: Option<String>,
}

impl ListStringsQuery {
    /// Validate into criteria / 校验并转换
    pub fn into_criteria(self) -> Result<FilterCriteria, String> {
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err("min_length cannot be greater than max_length".to_string());
            }
        }

        let contains_character = match self.contains_character {
            Some(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => return Err("contains_character must be a single character".to_string()),
                }
            }
            None => None,
        };

        Ok(FilterCriteria {
            is_palindrome: self.is_palindrome,
            min_length: self.min_length,
            max_length: self.max_length,
            word_count: self.word_count,
            contains_character,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NaturalLanguageQuery {
    #[serde(default)]
    pub query: Option<String>,
}
