//! Single-symbol changes: what the user asked for and what the solver proposes.
//!
//! [`ValueRequest`] and [`SymbolFix`] carry the same data and compare by the same rule
//! (symbol name plus desired value). They are separate types so that solver output can
//! never be mistaken for user intent.

use crate::error::ValueError;
use crate::symbol::SymbolRef;
use crate::value::SymbolValue;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Deserialize)]
struct RawChange {
    symbol: SymbolRef,
    desired: SymbolValue,
}

/// A user-intended change to one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawChange")]
pub struct ValueRequest {
    symbol: SymbolRef,
    desired: SymbolValue,
}

impl ValueRequest {
    /// Build a request from raw input such as `y`, `m`, `n` or a string value.
    pub fn parse(symbol: SymbolRef, input: &str) -> Result<Self, ValueError> {
        let desired = symbol.parse_value(input)?;
        Ok(Self { symbol, desired })
    }

    /// Build a request from an already-typed value.
    pub fn new(symbol: SymbolRef, desired: SymbolValue) -> Result<Self, ValueError> {
        let desired = symbol.normalize(desired)?;
        Ok(Self { symbol, desired })
    }

    pub fn symbol(&self) -> &SymbolRef {
        &self.symbol
    }

    pub fn desired(&self) -> &SymbolValue {
        &self.desired
    }

    pub fn is_met_by(&self, current: &SymbolValue) -> bool {
        &self.desired == current
    }
}

impl TryFrom<RawChange> for ValueRequest {
    type Error = ValueError;

    fn try_from(raw: RawChange) -> Result<Self, Self::Error> {
        ValueRequest::new(raw.symbol, raw.desired)
    }
}

impl fmt::Display for ValueRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.symbol, self.desired)
    }
}

/// Refuse a batch that asks for two different values of one symbol.
///
/// Repeating the same request is allowed.
pub fn check_requests(requests: &[ValueRequest]) -> Result<(), ValueError> {
    for (i, req) in requests.iter().enumerate() {
        let clash = requests[..i].iter().any(|earlier| {
            earlier.symbol() == req.symbol() && earlier.desired() != req.desired()
        });
        if clash {
            return Err(ValueError::ConflictingRequests {
                symbol: req.symbol().name().to_string(),
            });
        }
    }
    Ok(())
}

/// A solver-proposed corrective change to one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawChange")]
pub struct SymbolFix {
    symbol: SymbolRef,
    desired: SymbolValue,
}

impl SymbolFix {
    pub fn new(symbol: SymbolRef, desired: SymbolValue) -> Result<Self, ValueError> {
        let desired = symbol.normalize(desired)?;
        Ok(Self { symbol, desired })
    }

    pub fn parse(symbol: SymbolRef, input: &str) -> Result<Self, ValueError> {
        let desired = symbol.parse_value(input)?;
        Ok(Self { symbol, desired })
    }

    pub fn symbol(&self) -> &SymbolRef {
        &self.symbol
    }

    pub fn desired(&self) -> &SymbolValue {
        &self.desired
    }

    pub fn is_met_by(&self, current: &SymbolValue) -> bool {
        &self.desired == current
    }
}

impl TryFrom<RawChange> for SymbolFix {
    type Error = ValueError;

    fn try_from(raw: RawChange) -> Result<Self, Self::Error> {
        SymbolFix::new(raw.symbol, raw.desired)
    }
}

impl fmt::Display for SymbolFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.symbol, self.desired)
    }
}
