//! Inspection rows handed to presentation layers.

use crate::change::ValueRequest;
use crate::symbol::SymbolRef;
use crate::value::SymbolValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Satisfied,
    Unsatisfied,
}

/// Whether one request currently holds in the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStatus {
    pub request: ValueRequest,
    pub current: SymbolValue,
    pub state: RequestState,
}

impl RequestStatus {
    pub fn new(request: ValueRequest, current: SymbolValue) -> Self {
        let state = if request.is_met_by(&current) {
            RequestState::Satisfied
        } else {
            RequestState::Unsatisfied
        };
        Self {
            request,
            current,
            state,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.state == RequestState::Satisfied
    }
}

/// One fix of a diagnosis next to the symbol's current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixRow {
    pub symbol: SymbolRef,
    pub current: SymbolValue,
    pub desired: SymbolValue,
}

impl FixRow {
    /// False when the model already holds the desired value.
    pub fn changes(&self) -> bool {
        self.current != self.desired
    }
}
