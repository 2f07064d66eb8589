use thiserror::Error;

/// Rejected user input for listing parameters and form dates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown sort order `{0}`, expected `new` or `old`")]
    UnknownSortOrder(String),
    #[error("unknown layout `{0}`, expected `list` or `grid`")]
    UnknownLayout(String),
    #[error("invalid calendar date `{input}`, expected YYYY-MM-DD")]
    InvalidDate { input: String },
}
