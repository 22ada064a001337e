//! Shared data model for the confix workspace.
//!
//! # Design constraints
//! - Symbols are referenced, never owned: a [`SymbolRef`] is a handle resolved by the
//!   external configuration model.
//! - Requests (user input) and fixes (solver output) stay distinct types even though
//!   they compare by the same rule.
//! - Everything here is serializable so presentation layers can ship it as JSON.

pub mod change;
pub mod diagnosis;
pub mod error;
pub mod outcome;
pub mod report;
pub mod symbol;
pub mod value;

pub use change::{SymbolFix, ValueRequest, check_requests};
pub use diagnosis::{Diagnosis, DiagnosisSet, remove_duplicates};
pub use error::ValueError;
pub use outcome::{
    OutcomeEnvelope, RejectReason, Rejection, SolveOutcome, UnresolvableReason, WriteOrigin,
    WriteRecord,
};
pub use report::{FixRow, RequestState, RequestStatus};
pub use symbol::{SymbolRef, SymbolType};
pub use value::{SymbolValue, Tristate, ValueKind};

/// Schema identifiers.
pub mod schema {
    pub const CONFIX_OUTCOME_V1: &str = "confix.outcome.v1";
}
