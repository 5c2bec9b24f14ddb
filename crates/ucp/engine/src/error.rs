use thiserror::Error;

/// Errors from the policy engine.
///
/// Evaluation and planning never fail with these: binding gaps and missing
/// functions are reported as problems or filtered plan steps. Errors are
/// reserved for malformed builder state, static validation and
/// configuration loading.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{builder}: missing required field `{field}`")]
    MissingField {
        builder: &'static str,
        field: &'static str,
    },

    #[error("invalid policy: {}", problems.join("; "))]
    InvalidPolicy { problems: Vec<String> },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Raised by a validator function that could not complete its check.
///
/// The engine turns it into a reported problem at the call site; it never
/// stops the other validators of the same phase.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidatorError {
    pub message: String,
}

impl ValidatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
