use thiserror::Error;

/// Natural language query errors / 自然语言查询错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unable to parse natural language query: {query:?}")]
    Unrecognized { query: String },

    #[error("invalid number in query: {text:?}")]
    InvalidNumber { text: String },

    #[error("length must be counted in characters: {phrase:?}")]
    UnsupportedUnit { phrase: String },

    #[error("conflicting values for {field}: {first} and {second}")]
    Conflict {
        field: &'static str,
        first: String,
        second: String,
    },

    #[error("min_length ({min_length}) is greater than max_length ({max_length})")]
    EmptyRange { min_length: usize, max_length: usize },

    #[error("{field} cannot be satisfied: {reason}")]
    Unsatisfiable { field: &'static str, reason: String },
}

/// Coarse error class surfaced to callers / 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Query not understood / 无法解析
    Parse,
    /// Query understood but self-contradictory / 条件冲突
    Conflict,
}

impl QueryError {
    pub fn kind(&self) -> QueryErrorKind {
        match self {
            Self::Unrecognized { .. }
            | Self::InvalidNumber { .. }
            | Self::UnsupportedUnit { .. } => QueryErrorKind::Parse,
            Self::Conflict { .. } | Self::EmptyRange { .. } | Self::Unsatisfiable { .. } => {
                QueryErrorKind::Conflict
            }
        }
    }

    /// Fields involved in a conflict / 冲突涉及的字段
    pub fn fields(&self) -> Vec<&'static str> {
        match self {
            Self::Conflict { field, .. } | Self::Unsatisfiable { field, .. } => vec![*field],
            Self::EmptyRange { .. } => vec!["min_length", "max_length"],
            Self::Unrecognized { .. }
            | Self::InvalidNumber { .. }
            | Self::UnsupportedUnit { .. } => Vec::new(),
        }
    }
}
