use thiserror::Error;

/// Errors raised while constructing policy model values.
///
/// These are programmer errors: a builder was finished without a required
/// field, or a textual operator could not be parsed. Evaluation never
/// produces them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{builder}: missing required field `{field}`")]
    MissingField {
        builder: &'static str,
        field: &'static str,
    },

    #[error("unknown constraint operator: {0}")]
    UnknownOperator(String),
}

/// Result type for model construction.
pub type Result<T> = std::result::Result<T, ModelError>;
