pub mod analysis;
pub mod config;
pub mod db;
pub mod filter;
pub mod models;

pub use analysis::{analyze, fingerprint, AnalyzedString, Fingerprint, Properties};
pub use filter::{matches, FilterCriteria, QueryError, QueryErrorKind, RuleSet, Translator};
