//! Natural language translator - maps free text onto filter criteria / 自然语言查询解析
//!
//! Rule pipeline / 规则流水线：
//! - The query is lower-cased once / 查询先转小写
//! - Every rule scans the whole query, every occurrence counts / 每条规则扫描整个查询
//! - A phrase is read once: a match overlapping text an earlier rule already
//!   matched is skipped / 已被前面规则匹配的片段不再重复解析
//! - All matches write into one accumulating builder; a second, different value
//!   for the same field is a conflict, never an overwrite / 同字段不同值即冲突
//!
//! The rule set is an ordinary value built at startup and handed to the translator.

use std::ops::Range;

use regex::{Captures, Regex};

use super::criteria::{CriteriaBuilder, FilterCriteria};
use super::error::QueryError;

/// Number token: digits or a number word up to twenty / 数字：阿拉伯数字或英文单词
const NUMBER: &str = r"(?P<n>\d+|zero|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|thirteen|fourteen|fifteen|sixteen|seventeen|eighteen|nineteen|twenty)";

/// Unit after a length number / 长度单位
///
/// Words are captured too so "longer than 2 words" is refused instead of read as characters.
const LENGTH_UNIT: &str = r"(?P<unit>characters?|chars?|letters?|words?)";

const NUMBER_WORDS: [&str; 21] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen", "twenty",
];

/// What a matched rule writes into the criteria / 规则效果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// `word_count = n` / 固定单词数
    WordCount(usize),
    /// `word_count = <n>` from the `n` capture
    WordCountFromNumber,
    /// `is_palindrome`, false when the `neg` capture is present / 回文
    Palindrome,
    /// `min_length = <n> + 1`
    LongerThan,
    /// `max_length = <n> - 1`
    ShorterThan,
    /// `min_length = <n>`
    AtLeast,
    /// `max_length = <n>`
    AtMost,
    /// `contains_character = <ch>` from the `ch` capture
    ContainsCaptured,
    /// `contains_character = c` / 固定字符
    Contains(char),
}

impl Effect {
    fn apply(&self, caps: &Captures<'_>, builder: &mut CriteriaBuilder) -> Result<(), QueryError> {
        match *self {
            Effect::WordCount(n) => {
                builder.word_count(n)?;
            }
            Effect::WordCountFromNumber => {
                // "more than 2 words" names no exact count / 比较短语不是精确单词数
                if caps.name("cmp").is_some() {
                    return Err(QueryError::Unrecognized {
                        query: caps[0].to_string(),
                    });
                }
                builder.word_count(captured_number(caps)?)?;
            }
            Effect::Palindrome => {
                builder.is_palindrome(caps.name("neg").is_none())?;
            }
            Effect::LongerThan => {
                check_length_unit(caps)?;
                let n = captured_number(caps)?;
                let min = n.checked_add(1).ok_or_else(|| QueryError::Unsatisfiable {
                    field: "min_length",
                    reason: format!("no string is longer than {} characters", n),
                })?;
                builder.min_length(min)?;
            }
            Effect::ShorterThan => {
                check_length_unit(caps)?;
                let n = captured_number(caps)?;
                let max = n.checked_sub(1).ok_or_else(|| QueryError::Unsatisfiable {
                    field: "max_length",
                    reason: "no string is shorter than 0 characters".to_string(),
                })?;
                builder.max_length(max)?;
            }
            Effect::AtLeast => {
                check_length_unit(caps)?;
                builder.min_length(captured_number(caps)?)?;
            }
            Effect::AtMost => {
                check_length_unit(caps)?;
                builder.max_length(captured_number(caps)?)?;
            }
            Effect::ContainsCaptured => {
                let c = caps
                    .name("ch")
                    .and_then(|m| m.as_str().chars().next())
                    .ok_or_else(|| QueryError::Unrecognized {
                        query: caps[0].to_string(),
                    })?;
                builder.contains_character(c)?;
            }
            Effect::Contains(c) => {
                builder.contains_character(c)?;
            }
        }
        Ok(())
    }
}

/// Parse digits or a number word / 解析数字
pub fn parse_number(text: &str) -> Result<usize, QueryError> {
    if let Some(n) = NUMBER_WORDS.iter().position(|w| *w == text) {
        return Ok(n);
    }
    text.parse::<usize>().map_err(|_| QueryError::InvalidNumber {
        text: text.to_string(),
    })
}

fn captured_number(caps: &Captures<'_>) -> Result<usize, QueryError> {
    match caps.name("n") {
        Some(m) => parse_number(m.as_str()),
        None => Err(QueryError::InvalidNumber {
            text: caps[0].to_string(),
        }),
    }
}

/// Lengths are counted in characters only / 长度只按字符计
fn check_length_unit(caps: &Captures<'_>) -> Result<(), QueryError> {
    match caps.name("unit") {
        Some(unit) if unit.as_str().starts_with("word") => Err(QueryError::UnsupportedUnit {
            phrase: caps[0].to_string(),
        }),
        _ => Ok(()),
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// A trigger pattern plus its effect / 规则：触发模式 + 效果
#[derive(Debug, Clone)]
pub struct Rule {
    name: &'static str,
    pattern: Regex,
    effect: Effect,
}

impl Rule {
    /// Build a rule; the pattern runs against the lower-cased query / 创建规则
    pub fn new(name: &'static str, pattern: &str, effect: Effect) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            effect,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Apply every occurrence outside `claimed`, recording the spans it reads.
    /// Returns whether the rule fired at all / 应用规则
    fn apply(
        &self,
        query: &str,
        claimed: &mut Vec<Range<usize>>,
        builder: &mut CriteriaBuilder,
    ) -> Result<bool, QueryError> {
        let mut fired = false;
        for caps in self.pattern.captures_iter(query) {
            let span = caps.get(0).map(|m| m.range()).unwrap_or_default();
            if claimed.iter().any(|c| overlaps(c, &span)) {
                tracing::trace!("Rule {} skipped {:?}, already read", self.name, &caps[0]);
                continue;
            }
            fired = true;
            tracing::trace!("Rule {} matched {:?}", self.name, &caps[0]);
            self.effect.apply(&caps, builder)?;
            claimed.push(span);
        }
        Ok(fired)
    }
}

/// Ordered, immutable list of rules / 有序规则集
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Append a rule, returning the extended set / 追加规则
    pub fn with(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Built-in vocabulary / 内置词汇
    pub fn standard() -> Result<Self, regex::Error> {
        let rules = vec![
            Rule::new("single_word", r"\b(?:single|one)[\s-]+words?\b", Effect::WordCount(1))?,
            Rule::new(
                "exact_word_count",
                &format!(r"\b(?:(?:exactly|with|having)\s+)+{}\s+words?\b", NUMBER),
                Effect::WordCountFromNumber,
            )?,
            Rule::new(
                "hyphenated_word_count",
                &format!(r"\b{}-words?\b", NUMBER),
                Effect::WordCountFromNumber,
            )?,
            Rule::new(
                "palindrome",
                r"\b(?P<neg>non-?|not\s+(?:an?\s+)?)?palindrom(?:e|es|ic)\b",
                Effect::Palindrome,
            )?,
            Rule::new(
                "longer_than",
                &format!(r"\blonger\s+than\s+{}(?:\s+{})?\b", NUMBER, LENGTH_UNIT),
                Effect::LongerThan,
            )?,
            Rule::new(
                "shorter_than",
                &format!(r"\bshorter\s+than\s+{}(?:\s+{})?\b", NUMBER, LENGTH_UNIT),
                Effect::ShorterThan,
            )?,
            Rule::new(
                "at_least",
                &format!(r"\bat\s+least\s+{}\s+{}\b", NUMBER, LENGTH_UNIT),
                Effect::AtLeast,
            )?,
            Rule::new(
                "at_most",
                &format!(r"\bat\s+most\s+{}\s+{}\b", NUMBER, LENGTH_UNIT),
                Effect::AtMost,
            )?,
            Rule::new(
                "contains_letter",
                r#"\b(?:contain(?:s|ing)?|with)\s+(?:the\s+|a\s+)?(?:letter|character|char)\s+['"]?(?P<ch>[^\s'"])['"]?(?:$|\W)"#,
                Effect::ContainsCaptured,
            )?,
            Rule::new(
                "contains_bare",
                r#"\bcontain(?:s|ing)?\s+(?:(?:the|an?)\s+)?['"]?(?P<ch>\p{L})['"]?(?:$|\W)"#,
                Effect::ContainsCaptured,
            )?,
            Rule::new("first_vowel", r"\bfirst\s+vowel\b", Effect::Contains('a'))?,
            // Last, so comparative and length phrases claim their numbers first / 放在最后
            Rule::new(
                "bare_word_count",
                &format!(
                    r"\b(?:(?P<cmp>more|fewer|less|over|under)\s+(?:than\s+)?)?{}\s+words?\b",
                    NUMBER
                ),
                Effect::WordCountFromNumber,
            )?,
        ];
        Ok(Self::new(rules))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Translates free text into [`FilterCriteria`] / 自然语言翻译器
#[derive(Debug, Clone)]
pub struct Translator {
    rules: RuleSet,
}

impl Translator {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Translate a query / 翻译查询
    ///
    /// Fails with a parse-kind error when nothing matched, and a conflict-kind
    /// error when matches disagree or the length range is empty.
    pub fn translate(&self, query: &str) -> Result<FilterCriteria, QueryError> {
        let folded = query.to_lowercase();
        let mut builder = FilterCriteria::builder();
        let mut claimed = Vec::new();
        let mut matched = false;

        for rule in self.rules.iter() {
            if rule.apply(&folded, &mut claimed, &mut builder)? {
                matched = true;
            }
        }

        if !matched {
            return Err(QueryError::Unrecognized {
                query: query.trim().to_string(),
            });
        }

        let criteria = builder.build()?;
        tracing::debug!("Translated {:?} into {:?}", query, criteria);
        Ok(criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::QueryErrorKind;

    fn translator() -> Translator {
        Translator::new(RuleSet::standard().unwrap())
    }

    fn translate(query: &str) -> Result<FilterCriteria, QueryError> {
        translator().translate(query)
    }

    #[test]
    fn test_single_word_palindromic() {
        assert_eq!(
            translate("all single word palindromic strings").unwrap(),
            FilterCriteria {
                word_count: Some(1),
                is_palindrome: Some(true),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_longer_than() {
        assert_eq!(
            translate("strings longer than 10 characters").unwrap(),
            FilterCriteria {
                min_length: Some(11),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_shorter_than_and_bounds() {
        assert_eq!(
            translate("Strings shorter than 5 characters").unwrap().max_length,
            Some(4)
        );
        assert_eq!(
            translate("at least 3 characters").unwrap().min_length,
            Some(3)
        );
        assert_eq!(
            translate("at most twelve chars").unwrap().max_length,
            Some(12)
        );
    }

    #[test]
    fn test_range_from_one_query() {
        let criteria = translate("longer than 2 characters and shorter than 9 characters").unwrap();
        assert_eq!(criteria.min_length, Some(3));
        assert_eq!(criteria.max_length, Some(8));
    }

    #[test]
    fn test_contains_letter() {
        assert_eq!(
            translate("strings containing the letter z").unwrap().contains_character,
            Some('z')
        );
        assert_eq!(
            translate("words that contains x").unwrap().contains_character,
            Some('x')
        );
        assert_eq!(
            translate("with the letter 'q'").unwrap().contains_character,
            Some('q')
        );
    }

    #[test]
    fn test_first_vowel() {
        let criteria = translate("palindromic strings that contain the first vowel").unwrap();
        assert_eq!(criteria.is_palindrome, Some(true));
        assert_eq!(criteria.contains_character, Some('a'));
        assert_eq!(criteria.word_count, None);
    }

    #[test]
    fn test_negated_palindrome() {
        assert_eq!(translate("non-palindromic strings").unwrap().is_palindrome, Some(false));
        assert_eq!(translate("strings that are not palindromes").unwrap().is_palindrome, Some(false));
    }

    #[test]
    fn test_word_counts() {
        assert_eq!(translate("strings with exactly 2 words").unwrap().word_count, Some(2));
        assert_eq!(translate("three-word strings").unwrap().word_count, Some(3));
        assert_eq!(translate("one word strings").unwrap().word_count, Some(1));
    }

    #[test]
    fn test_gibberish_is_parse_error() {
        let err = translate("gibberish query with no patterns").unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::Parse);
        assert!(matches!(err, QueryError::Unrecognized { .. }));
        assert_eq!(translate("").unwrap_err().kind(), QueryErrorKind::Parse);
    }

    #[test]
    fn test_conflicting_word_counts() {
        let err = translate("strings with exactly 2 words and exactly 3 words").unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::Conflict);
        assert_eq!(err.fields(), vec!["word_count"]);
    }

    #[test]
    fn test_single_word_conflicts_with_two_words() {
        let err = translate("single word strings with exactly 2 words").unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::Conflict);
    }

    #[test]
    fn test_conflicting_characters() {
        let err = translate("containing the letter z with the first vowel").unwrap_err();
        assert_eq!(
            err,
            QueryError::Conflict {
                field: "contains_character",
                first: "z".to_string(),
                second: "a".to_string(),
            }
        );
    }

    #[test]
    fn test_palindrome_and_negation_conflict() {
        let err = translate("palindromes that are not palindromes").unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::Conflict);
    }

    #[test]
    fn test_empty_range_is_conflict() {
        let err = translate("longer than 10 characters and shorter than 5 characters").unwrap_err();
        assert_eq!(err, QueryError::EmptyRange { min_length: 11, max_length: 4 });
        assert_eq!(err.kind(), QueryErrorKind::Conflict);
    }

    #[test]
    fn test_shorter_than_zero_is_conflict() {
        let err = translate("strings shorter than 0 characters").unwrap_err();
        assert!(matches!(err, QueryError::Unsatisfiable { field: "max_length", .. }));
    }

    #[test]
    fn test_oversized_number_is_parse_error() {
        let err = translate("longer than 999999999999999999999999999 characters").unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::Parse);
    }

    #[test]
    fn test_custom_rule_set() {
        let rules = RuleSet::default().with(Rule::new("mirror", r"\bmirror\b", Effect::Palindrome).unwrap());
        let translator = Translator::new(rules);
        assert_eq!(translator.rules().len(), 1);
        assert_eq!(translator.translate("Mirror strings").unwrap().is_palindrome, Some(true));
        assert!(translator.translate("palindromes").is_err());
    }

    #[test]
    fn test_article_before_letter_is_read_once() {
        assert_eq!(
            translate("strings containing a letter z").unwrap().contains_character,
            Some('z')
        );
        assert_eq!(
            translate("strings that contain a z").unwrap().contains_character,
            Some('z')
        );
        // A lone article is still the letter itself / 单独的 a 仍是字符
        assert_eq!(translate("strings that contains a").unwrap().contains_character, Some('a'));
    }

    #[test]
    fn test_word_unit_is_not_a_length() {
        for query in [
            "strings longer than 2 words",
            "strings shorter than three words",
            "at least 2 words",
            "at most 4 words",
        ] {
            let err = translate(query).unwrap_err();
            assert!(matches!(err, QueryError::UnsupportedUnit { .. }), "{query}: {err:?}");
            assert_eq!(err.kind(), QueryErrorKind::Parse);
        }
        assert_eq!(translate("longer than 4").unwrap().min_length, Some(5));
    }

    #[test]
    fn test_bare_word_count() {
        assert_eq!(translate("strings of 2 words").unwrap().word_count, Some(2));
        assert_eq!(translate("palindromes of one word").unwrap().word_count, Some(1));

        let err = translate("strings of 2 words and 3 words").unwrap_err();
        assert_eq!(err.fields(), vec!["word_count"]);

        let err = translate("strings with more than 2 words").unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::Parse);
    }

    #[test]
    fn test_overlapping_phrasings() {
        let cases: Vec<(&str, FilterCriteria)> = vec![
            (
                "containing a letter x",
                FilterCriteria { contains_character: Some('x'), ..Default::default() },
            ),
            (
                "contains the letter q",
                FilterCriteria { contains_character: Some('q'), ..Default::default() },
            ),
            (
                "with a character 'k'",
                FilterCriteria { contains_character: Some('k'), ..Default::default() },
            ),
            (
                "strings with exactly one word",
                FilterCriteria { word_count: Some(1), ..Default::default() },
            ),
            (
                "having 2 words",
                FilterCriteria { word_count: Some(2), ..Default::default() },
            ),
            (
                "single word strings of one word",
                FilterCriteria { word_count: Some(1), ..Default::default() },
            ),
            (
                "at least 5 characters and longer than 4 characters",
                FilterCriteria { min_length: Some(5), ..Default::default() },
            ),
            (
                "at most 8 chars and shorter than 9 characters",
                FilterCriteria { max_length: Some(8), ..Default::default() },
            ),
            (
                "two word palindromes containing the letter a",
                FilterCriteria {
                    word_count: Some(2),
                    is_palindrome: Some(true),
                    contains_character: Some('a'),
                    ..Default::default()
                },
            ),
            (
                "palindromic strings that contain a first vowel",
                FilterCriteria {
                    is_palindrome: Some(true),
                    contains_character: Some('a'),
                    ..Default::default()
                },
            ),
        ];

        for (query, expected) in cases {
            assert_eq!(translate(query), Ok(expected), "query: {query}");
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("7"), Ok(7));
        assert_eq!(parse_number("twenty"), Ok(20));
        assert!(parse_number("lots").is_err());
    }
}
