//! BDD harness (cucumber-rs).
//!
//! Step definitions live in `tests/cucumber.rs`; this crate holds the fixtures they share.

use anyhow::anyhow;
use confix_core::{ConfigModel, Solver};
use confix_types::{Diagnosis, DiagnosisSet, SymbolFix, ValueRequest};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Upper bound on how long a held solver waits before giving up.
pub const HOLD_LIMIT: Duration = Duration::from_secs(10);

/// Split `"A=y B=n"` into `(name, value)` pairs.
pub fn parse_assignments(text: &str) -> anyhow::Result<Vec<(&str, &str)>> {
    text.split_whitespace()
        .map(|pair| {
            pair.split_once('=')
                .ok_or_else(|| anyhow!("expected NAME=value, got `{pair}`"))
        })
        .collect()
}

/// Build a diagnosis from `"A=y B=n"` using the model's symbol types.
pub fn diagnosis_from<M: ConfigModel>(model: &M, text: &str) -> anyhow::Result<Diagnosis> {
    let fixes = parse_assignments(text)?
        .into_iter()
        .map(|(name, value)| {
            let symbol = model
                .find_symbol(name)
                .ok_or_else(|| anyhow!("unknown symbol `{name}`"))?;
            Ok(SymbolFix::parse(symbol, value)?)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Diagnosis::new(fixes)?)
}

/// Solver that blocks inside `solve` until [`HeldSolver::release`] is called.
///
/// Once released it stays open, so later calls return at once.
#[derive(Debug)]
pub struct HeldSolver {
    response: Option<DiagnosisSet>,
    released: Mutex<bool>,
    opened: Condvar,
    calls: AtomicUsize,
}

impl HeldSolver {
    pub fn new(response: Option<DiagnosisSet>) -> Self {
        Self {
            response,
            released: Mutex::new(false),
            opened: Condvar::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn release(&self) {
        let mut released = self.released.lock().unwrap_or_else(PoisonError::into_inner);
        *released = true;
        self.opened.notify_all();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Solver for HeldSolver {
    fn solve(&self, _requests: &[ValueRequest]) -> anyhow::Result<Option<DiagnosisSet>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let released = self.released.lock().unwrap_or_else(PoisonError::into_inner);
        let (released, _) = self
            .opened
            .wait_timeout_while(released, HOLD_LIMIT, |open| !*open)
            .unwrap_or_else(PoisonError::into_inner);
        if !*released {
            anyhow::bail!("held solver was never released");
        }
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confix_core::adapters::InMemoryModel;
    use confix_types::{SymbolType, Tristate};
    use std::sync::Arc;

    #[test]
    fn assignments_split_on_whitespace() {
        let pairs = parse_assignments("A=y  B=n").expect("pairs");
        assert_eq!(pairs, vec![("A", "y"), ("B", "n")]);
        assert!(parse_assignments("A").is_err());
    }

    #[test]
    fn diagnosis_uses_model_types() {
        let model = InMemoryModel::new()
            .with_symbol("A", SymbolType::Bool, Tristate::No)
            .with_symbol("B", SymbolType::Tristate, Tristate::No);
        let d = diagnosis_from(&model, "A=m B=m").expect("diagnosis");
        assert_eq!(d.fix_for("A").map(|f| f.desired().as_str()), Some("y"));
        assert_eq!(d.fix_for("B").map(|f| f.desired().as_str()), Some("m"));
        assert!(diagnosis_from(&model, "C=y").is_err());
    }

    #[test]
    fn held_solver_returns_after_release() {
        let solver = Arc::new(HeldSolver::new(None));
        let worker = {
            let solver = Arc::clone(&solver);
            std::thread::spawn(move || solver.solve(&[]))
        };
        solver.release();
        let result = worker.join().expect("join");
        assert!(matches!(result, Ok(None)));
        assert_eq!(solver.calls(), 1);
    }
}
