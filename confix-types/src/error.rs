//! Construction-time errors for the data model.
//!
//! These never enter the solve pipeline: a request that fails here is rejected before
//! the solver or the model sees it.

use crate::value::ValueKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The input does not parse against the symbol's value kind.
    #[error("invalid value `{value}`{}: expected {expected}", for_symbol(.symbol))]
    InvalidValue {
        symbol: Option<String>,
        value: String,
        expected: &'static str,
    },

    /// A typed value of the wrong variant was supplied for a symbol.
    #[error("symbol `{symbol}` takes a {expected:?} value, got {actual:?}")]
    KindMismatch {
        symbol: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// Two fixes in one diagnosis name the same symbol with different values.
    #[error("diagnosis names `{symbol}` with conflicting values")]
    InconsistentDiagnosis { symbol: String },

    /// Two requests in one batch name the same symbol with different values.
    #[error("requests name `{symbol}` with conflicting values")]
    ConflictingRequests { symbol: String },
}

impl ValueError {
    /// Attach the symbol name to an `InvalidValue` that was produced without one.
    pub fn with_symbol(self, name: &str) -> Self {
        match self {
            ValueError::InvalidValue {
                symbol: None,
                value,
                expected,
            } => ValueError::InvalidValue {
                symbol: Some(name.to_string()),
                value,
                expected,
            },
            other => other,
        }
    }
}

fn for_symbol(symbol: &Option<String>) -> String {
    match symbol {
        Some(name) => format!(" for `{name}`"),
        None => String::new(),
    }
}
