use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown form field: {0}")]
    UnknownForm(String),

    #[error("unknown stage: {0}")]
    UnknownStage(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}
