// toolshape-core/src/errors.rs
use thiserror::Error;

/// Errors a parser can hand back to its caller.
///
/// Malformed lines never show up here: they are skipped where they are
/// found. Only conditions the caller has to act on become a `ParseError`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A caller-supplied value looks like a command-line flag.
    #[error("invalid input for parameter '{param}': '{value}' looks like a command-line flag")]
    InvalidInput { param: String, value: String },

    /// Input that had to be a single well-formed document was not.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// A parser option is unusable (empty delimiter and the like).
    #[error("invalid parser option: {0}")]
    InvalidOption(String),

    /// A finished Result could not be turned into JSON.
    #[error("failed to serialize result: {0}")]
    Serialization(String),
}

impl ParseError {
    pub fn invalid_input(param: impl Into<String>, value: impl Into<String>) -> Self {
        ParseError::InvalidInput {
            param: param.into(),
            value: value.into(),
        }
    }
}

/// Errors reading or validating a `Toolshape.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse configuration TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A derived count disagrees with the list it is supposed to summarize.
///
/// This is a defect in an assembler, never a runtime condition; tests call
/// `verify_counts()` on every fixture to catch it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("count mismatch on '{field}': stored {stored}, list has {actual}")]
pub struct CountMismatch {
    pub field: &'static str,
    pub stored: usize,
    pub actual: usize,
}

/// Compares one stored count with the length of its filtered list.
pub(crate) fn check_count(
    field: &'static str,
    stored: usize,
    actual: usize,
) -> Result<(), CountMismatch> {
    if stored == actual {
        Ok(())
    } else {
        Err(CountMismatch {
            field,
            stored,
            actual,
        })
    }
}
