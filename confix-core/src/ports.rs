//! Port traits for collaborators the pipeline does not own.

use confix_types::{DiagnosisSet, ValueRequest};

/// The external constraint solver.
///
/// Returns `Ok(None)` when the requests introduce no conflict, and otherwise the
/// candidate diagnoses in preference order (possibly empty, possibly with duplicates).
/// A call may block for a long time and is never interrupted.
pub trait Solver {
    fn solve(&self, requests: &[ValueRequest]) -> anyhow::Result<Option<DiagnosisSet>>;
}

impl<F> Solver for F
where
    F: Fn(&[ValueRequest]) -> anyhow::Result<Option<DiagnosisSet>>,
{
    fn solve(&self, requests: &[ValueRequest]) -> anyhow::Result<Option<DiagnosisSet>> {
        self(requests)
    }
}
