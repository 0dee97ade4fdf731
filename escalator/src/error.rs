use thiserror::Error;

use crate::ElementId;

/// Errors reported synchronously by the escalator's public API.
///
/// Every fallible operation validates its arguments before mutating anything, so an `Err`
/// always leaves the escalator untouched.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EscalatorError {
    /// An argument was outside its accepted domain (a count below one, a negative height, a
    /// frozen column as scroll target, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An index did not refer to an existing row or column.
    #[error("index {index} is out of bounds (valid range {start}..{end})")]
    IndexOutOfBounds {
        index: isize,
        start: usize,
        end: usize,
    },

    /// The target exists but is not in a state that supports the request, e.g. a logical row
    /// that is currently not materialized.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// The position ledger has no entry for an element.
    #[error("element {0:?} has no recorded position")]
    UnknownElement(ElementId),
}

impl EscalatorError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn out_of_bounds(index: impl TryInto<isize>, start: usize, end: usize) -> Self {
        Self::IndexOutOfBounds {
            index: index.try_into().unwrap_or(isize::MAX),
            start,
            end,
        }
    }
}

pub type Result<T, E = EscalatorError> = core::result::Result<T, E>;
