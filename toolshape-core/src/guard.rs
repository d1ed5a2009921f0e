// toolshape-core/src/guard.rs

//! Rejects caller-supplied values that a tool would read as a flag.
//!
//! Every string that ends up inside an argument list goes through [`guard`]
//! (or [`guard_all`] for arrays) before the argument list is built. The
//! check is a pure predicate: it never rewrites the value.

use crate::errors::ParseError;
use tracing::warn;

/// Fails with [`ParseError::InvalidInput`] when `value`, after trimming
/// leading whitespace, starts with `-`.
pub fn guard(value: &str, param: &str) -> Result<(), ParseError> {
    if value.trim_start().starts_with('-') {
        warn!(param = param, value = value, "Rejected flag-like input");
        return Err(ParseError::invalid_input(param, value));
    }
    Ok(())
}

/// Runs [`guard`] on every element, stopping at the first offender.
pub fn guard_all<S: AsRef<str>>(values: &[S], param: &str) -> Result<(), ParseError> {
    values.iter().try_for_each(|v| guard(v.as_ref(), param))
}
