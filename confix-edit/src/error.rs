//! Error types for confix-edit.

use confix_types::RejectReason;
use thiserror::Error;

/// The model refused a single write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("write to `{symbol}` rejected: {reason}")]
pub struct WriteRejected {
    pub symbol: String,
    pub reason: String,
}

impl WriteRejected {
    pub fn new(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

impl From<WriteRejected> for RejectReason {
    fn from(err: WriteRejected) -> Self {
        RejectReason::Refused {
            symbol: err.symbol,
            message: err.reason,
        }
    }
}
