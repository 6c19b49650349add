//! Filter module - criteria model, evaluator and natural language translator / 过滤模块
//!
//! Both query paths end in the same place / 两条查询路径：
//! - structured parameters → `FilterCriteria`
//! - free text → `Translator` → `FilterCriteria`
//!
//! `FilterCriteria::matches` is then applied to each stored record.

pub mod criteria;
pub mod error;
pub mod translator;

pub use criteria::{matches, CriteriaBuilder, FilterCriteria};
pub use error::{QueryError, QueryErrorKind};
pub use translator::{Effect, Rule, RuleSet, Translator};
