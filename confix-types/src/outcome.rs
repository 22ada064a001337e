use crate::diagnosis::{Diagnosis, DiagnosisSet};
use crate::symbol::SymbolRef;
use crate::value::SymbolValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Terminal result of one solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SolveOutcome {
    /// The requests hold without any diagnosis.
    ///
    /// `written` is false when the requests already matched the model and nothing was
    /// touched, true when they were written directly because the solver found no conflict.
    NoConflict { written: bool },

    /// A diagnosis was committed to the model (sync path only).
    Applied {
        diagnosis: Diagnosis,
        /// Candidates tried, including the one that succeeded.
        attempts: usize,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        writes: Vec<WriteRecord>,
    },

    /// The solver saw no conflict but nothing was written yet (async path only).
    ///
    /// The requests do not hold in the model; the host writes them with
    /// `commit(.., None, requests)`.
    RequestsPending,

    /// Deduplicated candidates awaiting review (async path only).
    Diagnoses { diagnoses: DiagnosisSet },

    /// No diagnosis could be applied.
    Unresolvable { reason: UnresolvableReason },

    /// The run was cancelled; any solver output was discarded (async path only).
    Cancelled,

    /// The solver failed or the worker died (async path only).
    Failed { message: String },
}

impl SolveOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            SolveOutcome::NoConflict { .. } => "no_conflict",
            SolveOutcome::Applied { .. } => "applied",
            SolveOutcome::RequestsPending => "requests_pending",
            SolveOutcome::Diagnoses { .. } => "diagnoses",
            SolveOutcome::Unresolvable { .. } => "unresolvable",
            SolveOutcome::Cancelled => "cancelled",
            SolveOutcome::Failed { .. } => "failed",
        }
    }

    /// True when the requested change now holds in the model.
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            SolveOutcome::NoConflict { .. } | SolveOutcome::Applied { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnresolvableReason {
    /// The solver ran and returned no diagnosis.
    NoDiagnoses,
    /// Every candidate was rejected by the model.
    AllRejected { rejections: Vec<Rejection> },
    /// The solver saw no conflict but the model refused the requested values.
    RequestsRejected { reason: RejectReason },
}

/// One rejected candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Zero-based position in the deduplicated diagnosis set.
    pub candidate: usize,
    pub diagnosis_id: Uuid,
    pub reason: RejectReason,
}

/// Why a Fix Applicator attempt was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RejectReason {
    /// The model refused a write.
    Refused { symbol: String, message: String },
    /// A write was accepted but recomputation left a different value.
    NotHeld {
        symbol: String,
        desired: SymbolValue,
        actual: SymbolValue,
    },
    /// The diagnosis proposes a different value for a requested symbol.
    ConflictsWithRequest { symbol: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Refused { symbol, message } => {
                write!(f, "write to {symbol} refused: {message}")
            }
            RejectReason::NotHeld {
                symbol,
                desired,
                actual,
            } => write!(f, "{symbol} reverted to {actual} (wanted {desired})"),
            RejectReason::ConflictsWithRequest { symbol } => {
                write!(f, "diagnosis contradicts the request for {symbol}")
            }
        }
    }
}

/// Where a write in an apply attempt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOrigin {
    Fix,
    Request,
}

/// One symbol write performed during an apply attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRecord {
    pub symbol: SymbolRef,
    pub origin: WriteOrigin,
    pub before: SymbolValue,
    pub desired: SymbolValue,
    pub after: SymbolValue,
    pub held: bool,
}

/// Versioned wrapper for shipping an outcome to a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEnvelope {
    pub schema: String,
    pub outcome: SolveOutcome,
}

impl From<SolveOutcome> for OutcomeEnvelope {
    fn from(outcome: SolveOutcome) -> Self {
        Self {
            schema: crate::schema::CONFIX_OUTCOME_V1.to_string(),
            outcome,
        }
    }
}
