//! Ordered character frequency map / 有序字符频率表
//!
//! Keys keep first-occurrence order so identical input always serializes the same way.

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Character to occurrence count, in first-occurrence order / 字符频率
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterFrequency {
    entries: Vec<(char, usize)>,
}

impl CharacterFrequency {
    /// Count every character of the raw text / 统计原始文本中的字符
    pub fn from_text(text: &str) -> Self {
        let mut positions: HashMap<char, usize> = HashMap::new();
        let mut entries: Vec<(char, usize)> = Vec::new();

        for c in text.chars() {
            match positions.get(&c) {
                Some(&idx) => entries[idx].1 += 1,
                None => {
                    positions.insert(c, entries.len());
                    entries.push((c, 1));
                }
            }
        }

        Self { entries }
    }

    /// Occurrences of `c`, 0 when absent / 字符出现次数
    pub fn count(&self, c: char) -> usize {
        self.entries
            .iter()
            .find(|(k, _)| *k == c)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn contains(&self, c: char) -> bool {
        self.count(c) > 0
    }

    /// Number of distinct characters / 不同字符数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, usize)> + '_ {
        self.entries.iter().copied()
    }
}

impl Serialize for CharacterFrequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (c, n) in &self.entries {
            map.serialize_entry(c, n)?;
        }
        map.end()
    }
}

struct FrequencyVisitor;

impl<'de> Visitor<'de> for FrequencyVisitor {
    type Value = CharacterFrequency;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of single characters to counts")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries: Vec<(char, usize)> = Vec::with_capacity(access.size_hint().unwrap_or(0));

        while let Some((key, count)) = access.next_entry::<String, usize>()? {
            let mut chars = key.chars();
            let c = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => return Err(de::Error::custom(format!("invalid character key: {:?}", key))),
            };
            if entries.iter().any(|(k, _)| *k == c) {
                return Err(de::Error::custom(format!("duplicate character key: {:?}", key)));
            }
            entries.push((c, count));
        }

        Ok(CharacterFrequency { entries })
    }
}

impl<'de> Deserialize<'de> for CharacterFrequency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FrequencyVisitor)
    }
}
