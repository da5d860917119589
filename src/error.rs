use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Missing upstream table '{0}'")]
    MissingTable(String),

    #[error("Cannot rank an empty partition")]
    EmptyPartition,

    #[error("Non-finite {field} for '{id}'")]
    NonFinite { id: String, field: &'static str },

    #[error("Spread multiplier must be finite and non-negative, got {0}")]
    InvalidSpread(f64),
}
