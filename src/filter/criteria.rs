//! Filter criteria and evaluator / 过滤条件与求值
//!
//! Every populated field is a constraint; evaluation is their conjunction.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::error::QueryError;
use crate::analysis::{AnalyzedString, Properties};

/// Filter criteria, all fields optional / 过滤条件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_palindrome: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains_character: Option<char>,
}

impl FilterCriteria {
    pub fn builder() -> CriteriaBuilder {
        CriteriaBuilder::default()
    }

    /// True when no dimension is constrained / 无任何条件
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Evaluate against a stored record / 对记录求值
    pub fn matches(&self, record: &AnalyzedString) -> bool {
        self.matches_properties(&record.properties)
    }

    /// Evaluate against a property record, stopping at the first failed predicate / 对属性求值
    pub fn matches_properties(&self, props: &Properties) -> bool {
        if let Some(expected) = self.is_palindrome {
            if props.is_palindrome != expected {
                return false;
            }
        }
        if let Some(min) = self.min_length {
            if props.length < min {
                return false;
            }
        }
        if let Some(max) = self.max_length {
            if props.length > max {
                return false;
            }
        }
        if let Some(words) = self.word_count {
            if props.word_count != words {
                return false;
            }
        }
        if let Some(c) = self.contains_character {
            if !props.character_frequency.contains(c) {
                return false;
            }
        }
        true
    }
}

/// Free-function form of [`FilterCriteria::matches`] / 求值函数
pub fn matches(criteria: &FilterCriteria, record: &AnalyzedString) -> bool {
    criteria.matches(record)
}

/// Accumulates criteria, refusing to overwrite a field with a different value / 条件累加器
#[derive(Debug, Clone, Default)]
pub struct CriteriaBuilder {
    criteria: FilterCriteria,
}

impl CriteriaBuilder {
    pub fn is_palindrome(&mut self, value: bool) -> Result<&mut Self, QueryError> {
        set_once(&mut self.criteria.is_palindrome, "is_palindrome", value)?;
        Ok(self)
    }

    pub fn min_length(&mut self, value: usize) -> Result<&mut Self, QueryError> {
        set_once(&mut self.criteria.min_length, "min_length", value)?;
        Ok(self)
    }

    pub fn max_length(&mut self, value: usize) -> Result<&mut Self, QueryError> {
        set_once(&mut self.criteria.max_length, "max_length", value)?;
        Ok(self)
    }

    pub fn word_count(&mut self, value: usize) -> Result<&mut Self, QueryError> {
        set_once(&mut self.criteria.word_count, "word_count", value)?;
        Ok(self)
    }

    pub fn contains_character(&mut self, value: char) -> Result<&mut Self, QueryError> {
        set_once(&mut self.criteria.contains_character, "contains_character", value)?;
        Ok(self)
    }

    /// Finish, rejecting an empty length range / 完成构建
    pub fn build(&self) -> Result<FilterCriteria, QueryError> {
        if let (Some(min_length), Some(max_length)) = (self.criteria.min_length, self.criteria.max_length) {
            if min_length > max_length {
                return Err(QueryError::EmptyRange { min_length, max_length });
            }
        }
        Ok(self.criteria)
    }
}

fn set_once<T>(slot: &mut Option<T>, field: &'static str, value: T) -> Result<(), QueryError>
where
    T: Copy + PartialEq + Display,
{
    match *slot {
        Some(existing) if existing != value => Err(QueryError::Conflict {
            field,
            first: existing.to_string(),
            second: value.to_string(),
        }),
        _ => {
            *slot = Some(value);
            Ok(())
        }
    }
}
