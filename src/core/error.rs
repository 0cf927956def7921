use thiserror::Error;

use super::types::Field;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The retainer schedule only covers one to three units per client.
    #[error("configuration error: unsupported units-per-client value {0}")]
    UnsupportedUnitsPerClient(f64),

    #[error("field `{field}` expects a non-negative whole number, got {value}")]
    InvalidCount { field: Field, value: f64 },

    #[error("field `{field}` expects {expected}")]
    ValueKind { field: Field, expected: &'static str },

    #[error("unknown assumption field `{0}`")]
    UnknownField(String),

    #[error("unknown revenue line `{0}`")]
    UnknownLine(String),

    #[error("unknown scenario `{0}`")]
    UnknownScenario(String),
}
