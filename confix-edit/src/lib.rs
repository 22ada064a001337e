//! Fix applicator for confix diagnoses.
//!
//! Responsibilities:
//! - Define the [`ConfigModel`] port the applicator writes through.
//! - Write a diagnosis (plus the requests it unblocks) into the model, recomputing after
//!   each write.
//! - Roll the model back to its checkpoint when any write is refused or does not hold,
//!   so the next candidate starts from a clean baseline.

mod error;

pub use error::WriteRejected;

use confix_types::{
    Diagnosis, RejectReason, SymbolRef, SymbolValue, ValueKind, ValueRequest, WriteOrigin,
    WriteRecord,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Narrow interface to the external configuration model.
///
/// The applicator only mutates the model through `set_value` and `recompute`, and
/// relies on `checkpoint`/`restore` to undo a rejected attempt.
pub trait ConfigModel {
    /// Opaque snapshot of every value the applicator might touch.
    type Checkpoint;

    fn find_symbol(&self, name: &str) -> Option<SymbolRef>;

    fn current_value(&self, symbol: &SymbolRef) -> SymbolValue;

    fn set_value(&mut self, symbol: &SymbolRef, value: &SymbolValue) -> Result<(), WriteRejected>;

    /// Propagate implied and derived values after a write to `symbol`.
    fn recompute(&mut self, symbol: &SymbolRef);

    fn persist(&mut self) -> anyhow::Result<()>;

    fn checkpoint(&self) -> Self::Checkpoint;

    fn restore(&mut self, checkpoint: Self::Checkpoint);

    /// Required write order for dependent symbols, if the model has one.
    ///
    /// Symbols missing from the returned list are written after the listed ones.
    fn write_order(&self, symbols: &[SymbolRef]) -> Option<Vec<SymbolRef>> {
        let _ = symbols;
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Upper bound on write passes; `None` allows one pass per pending write.
    pub max_passes: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApplyStatus {
    Applied,
    Rejected { reason: RejectReason },
}

/// Result of one applicator attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub status: ApplyStatus,
    pub writes: Vec<WriteRecord>,
    pub passes: usize,
}

impl ApplyReport {
    pub fn is_applied(&self) -> bool {
        matches!(self.status, ApplyStatus::Applied)
    }

    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match &self.status {
            ApplyStatus::Applied => None,
            ApplyStatus::Rejected { reason } => Some(reason),
        }
    }

    fn rejected(reason: RejectReason) -> Self {
        Self {
            status: ApplyStatus::Rejected { reason },
            writes: Vec::new(),
            passes: 0,
        }
    }
}

/// Write `diagnosis` and then `requests` into the model as one attempt.
///
/// On rejection the model is restored to the state it had on entry.
pub fn apply_diagnosis<M: ConfigModel>(
    model: &mut M,
    diagnosis: &Diagnosis,
    requests: &[ValueRequest],
    opts: &ApplyOptions,
) -> ApplyReport {
    let checkpoint = model.checkpoint();
    let report = attempt(model, Some(diagnosis), requests, opts);
    if !report.is_applied() {
        model.restore(checkpoint);
    }
    report
}

/// Write `requests` alone, used when the solver reports no conflict.
pub fn apply_requests<M: ConfigModel>(
    model: &mut M,
    requests: &[ValueRequest],
    opts: &ApplyOptions,
) -> ApplyReport {
    let checkpoint = model.checkpoint();
    let report = attempt(model, None, requests, opts);
    if !report.is_applied() {
        model.restore(checkpoint);
    }
    report
}

/// Run an attempt and restore the model afterwards, whatever the result.
pub fn preview_diagnosis<M: ConfigModel>(
    model: &mut M,
    diagnosis: &Diagnosis,
    requests: &[ValueRequest],
    opts: &ApplyOptions,
) -> ApplyReport {
    let checkpoint = model.checkpoint();
    let report = attempt(model, Some(diagnosis), requests, opts);
    model.restore(checkpoint);
    report
}

/// Plan and execute one attempt; restoring is left to the caller.
fn attempt<M: ConfigModel>(
    model: &mut M,
    diagnosis: Option<&Diagnosis>,
    requests: &[ValueRequest],
    opts: &ApplyOptions,
) -> ApplyReport {
    match plan_writes(model, diagnosis, requests) {
        Ok(writes) => execute_writes(model, writes, opts),
        Err(reason) => ApplyReport::rejected(reason),
    }
}

#[derive(Debug, Clone)]
struct PendingWrite {
    symbol: SymbolRef,
    desired: SymbolValue,
    origin: WriteOrigin,
    before: SymbolValue,
}

fn plan_writes<M: ConfigModel>(
    model: &M,
    diagnosis: Option<&Diagnosis>,
    requests: &[ValueRequest],
) -> Result<Vec<PendingWrite>, RejectReason> {
    let mut writes: Vec<PendingWrite> = Vec::new();

    for fix in diagnosis.into_iter().flatten() {
        if let Some(req) = requests.iter().find(|r| r.symbol() == fix.symbol())
            && req.desired() != fix.desired()
        {
            return Err(RejectReason::ConflictsWithRequest {
                symbol: fix.symbol().name().to_string(),
            });
        }
        writes.push(PendingWrite {
            symbol: fix.symbol().clone(),
            desired: fix.desired().clone(),
            origin: WriteOrigin::Fix,
            before: model.current_value(fix.symbol()),
        });
    }

    for req in requests {
        if let Some(planned) = writes.iter().find(|w| &w.symbol == req.symbol()) {
            if &planned.desired != req.desired() {
                return Err(RejectReason::ConflictsWithRequest {
                    symbol: req.symbol().name().to_string(),
                });
            }
            continue;
        }
        writes.push(PendingWrite {
            symbol: req.symbol().clone(),
            desired: req.desired().clone(),
            origin: WriteOrigin::Request,
            before: model.current_value(req.symbol()),
        });
    }

    order_writes(model, &mut writes);
    Ok(writes)
}

fn order_writes<M: ConfigModel>(model: &M, writes: &mut [PendingWrite]) {
    let symbols: Vec<SymbolRef> = writes.iter().map(|w| w.symbol.clone()).collect();
    match model.write_order(&symbols) {
        Some(order) => {
            writes.sort_by_key(|w| {
                order
                    .iter()
                    .position(|s| s == &w.symbol)
                    .unwrap_or(usize::MAX)
            });
        }
        None => {
            // Boolean parents first: non-boolean symbols are often hidden until then.
            writes.sort_by_key(|w| match w.symbol.value_kind() {
                ValueKind::Boolean => 0u8,
                ValueKind::NonBoolean => 1u8,
            });
        }
    }
}

fn execute_writes<M: ConfigModel>(
    model: &mut M,
    writes: Vec<PendingWrite>,
    opts: &ApplyOptions,
) -> ApplyReport {
    let max_passes = opts.max_passes.unwrap_or(writes.len()).max(1);
    let mut refusals: Vec<Option<WriteRejected>> = vec![None; writes.len()];
    let mut pending: Vec<usize> = (0..writes.len()).collect();
    let mut passes = 0;

    while !pending.is_empty() && passes < max_passes {
        passes += 1;
        let mut refused = Vec::new();

        for &idx in &pending {
            let write = &writes[idx];
            match model.set_value(&write.symbol, &write.desired) {
                Ok(()) => {
                    debug!(symbol = %write.symbol, value = %write.desired, pass = passes, "write accepted");
                    model.recompute(&write.symbol);
                    refusals[idx] = None;
                }
                Err(err) => {
                    debug!(symbol = %write.symbol, pass = passes, error = %err, "write refused");
                    refusals[idx] = Some(err);
                    refused.push(idx);
                }
            }
        }

        let progressed = refused.len() < pending.len();
        pending = refused;
        if !progressed {
            break;
        }
    }

    let records: Vec<WriteRecord> = writes
        .into_iter()
        .map(|w| {
            let after = model.current_value(&w.symbol);
            WriteRecord {
                held: after == w.desired,
                symbol: w.symbol,
                origin: w.origin,
                before: w.before,
                desired: w.desired,
                after,
            }
        })
        .collect();

    let reason = pending
        .first()
        .and_then(|&idx| refusals[idx].clone())
        .map(RejectReason::from)
        .or_else(|| {
            records
                .iter()
                .find(|r| !r.held)
                .map(|r| RejectReason::NotHeld {
                    symbol: r.symbol.name().to_string(),
                    desired: r.desired.clone(),
                    actual: r.after.clone(),
                })
        });

    let status = match reason {
        Some(reason) => {
            warn!(%reason, passes, "apply attempt rejected");
            ApplyStatus::Rejected { reason }
        }
        None => ApplyStatus::Applied,
    };

    ApplyReport {
        status,
        writes: records,
        passes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confix_types::{SymbolFix, SymbolType, Tristate};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    /// Flat model: writes always land, optional refusals and an ordering hint.
    #[derive(Default)]
    struct FlatModel {
        values: BTreeMap<String, SymbolValue>,
        refuse: Vec<String>,
        order: Option<Vec<String>>,
        log: Vec<String>,
    }

    impl ConfigModel for FlatModel {
        type Checkpoint = BTreeMap<String, SymbolValue>;

        fn find_symbol(&self, _name: &str) -> Option<SymbolRef> {
            None
        }

        fn current_value(&self, symbol: &SymbolRef) -> SymbolValue {
            self.values
                .get(symbol.name())
                .cloned()
                .unwrap_or(SymbolValue::Boolean(Tristate::No))
        }

        fn set_value(
            &mut self,
            symbol: &SymbolRef,
            value: &SymbolValue,
        ) -> Result<(), WriteRejected> {
            if self.refuse.iter().any(|n| n == symbol.name()) {
                return Err(WriteRejected::new(symbol.name(), "locked"));
            }
            self.log.push(symbol.name().to_string());
            self.values.insert(symbol.name().to_string(), value.clone());
            Ok(())
        }

        fn recompute(&mut self, _symbol: &SymbolRef) {}

        fn persist(&mut self) -> anyhow::Result<()> {
            Ok(())
        }

        fn checkpoint(&self) -> Self::Checkpoint {
            self.values.clone()
        }

        fn restore(&mut self, checkpoint: Self::Checkpoint) {
            self.values = checkpoint;
        }

        fn write_order(&self, _symbols: &[SymbolRef]) -> Option<Vec<SymbolRef>> {
            self.order.as_ref().map(|names| {
                names
                    .iter()
                    .map(|n| SymbolRef::new(n.clone(), SymbolType::Tristate))
                    .collect()
            })
        }
    }

    fn tri(name: &str, v: &str) -> SymbolFix {
        SymbolFix::parse(SymbolRef::new(name, SymbolType::Tristate), v).unwrap()
    }

    fn string_fix(name: &str, v: &str) -> SymbolFix {
        SymbolFix::parse(SymbolRef::new(name, SymbolType::String), v).unwrap()
    }

    #[test]
    fn booleans_are_written_before_strings_by_default() {
        let mut model = FlatModel::default();
        let d = Diagnosis::new(vec![string_fix("CMDLINE", "quiet"), tri("A", "y")]).unwrap();

        let report = apply_diagnosis(&mut model, &d, &[], &ApplyOptions::default());
        assert!(report.is_applied());
        assert_eq!(model.log, vec!["A".to_string(), "CMDLINE".to_string()]);
    }

    #[test]
    fn model_ordering_hint_wins() {
        let mut model = FlatModel {
            order: Some(vec!["C".into(), "A".into()]),
            ..FlatModel::default()
        };
        let d = Diagnosis::new(vec![tri("A", "y"), tri("B", "y"), tri("C", "y")]).unwrap();

        apply_diagnosis(&mut model, &d, &[], &ApplyOptions::default());
        assert_eq!(
            model.log,
            vec!["C".to_string(), "A".to_string(), "B".to_string()]
        );
    }

    #[test]
    fn refused_write_restores_checkpoint() {
        let mut model = FlatModel {
            refuse: vec!["B".into()],
            ..FlatModel::default()
        };
        let d = Diagnosis::new(vec![tri("A", "y"), tri("B", "y")]).unwrap();

        let report = apply_diagnosis(&mut model, &d, &[], &ApplyOptions::default());
        assert_eq!(
            report.reject_reason(),
            Some(&RejectReason::Refused {
                symbol: "B".into(),
                message: "locked".into()
            })
        );
        assert!(model.values.is_empty());
    }

    #[test]
    fn conflicting_request_rejects_before_any_write() {
        let mut model = FlatModel::default();
        let d = Diagnosis::new(vec![tri("A", "n")]).unwrap();
        let req = ValueRequest::parse(SymbolRef::new("A", SymbolType::Tristate), "y").unwrap();

        let report = apply_diagnosis(&mut model, &d, &[req], &ApplyOptions::default());
        assert_eq!(
            report.reject_reason(),
            Some(&RejectReason::ConflictsWithRequest { symbol: "A".into() })
        );
        assert!(model.log.is_empty());
        assert_eq!(report.passes, 0);
    }

    #[test]
    fn request_already_named_by_fix_is_written_once() {
        let mut model = FlatModel::default();
        let d = Diagnosis::new(vec![tri("A", "y")]).unwrap();
        let req = ValueRequest::parse(SymbolRef::new("A", SymbolType::Tristate), "y").unwrap();

        let report = apply_diagnosis(&mut model, &d, &[req], &ApplyOptions::default());
        assert!(report.is_applied());
        assert_eq!(report.writes.len(), 1);
        assert_eq!(report.writes[0].origin, WriteOrigin::Fix);
    }

    #[test]
    fn contradictory_requests_reject_before_any_write() {
        let mut model = FlatModel::default();
        let a = SymbolRef::new("A", SymbolType::Tristate);
        let reqs = [
            ValueRequest::parse(a.clone(), "y").unwrap(),
            ValueRequest::parse(a.clone(), "n").unwrap(),
        ];

        let report = apply_requests(&mut model, &reqs, &ApplyOptions::default());
        assert_eq!(
            report.reject_reason(),
            Some(&RejectReason::ConflictsWithRequest { symbol: "A".into() })
        );
        assert!(model.log.is_empty());

        let repeated = [
            ValueRequest::parse(a.clone(), "m").unwrap(),
            ValueRequest::parse(a, "m").unwrap(),
        ];
        let report = apply_requests(&mut model, &repeated, &ApplyOptions::default());
        assert!(report.is_applied());
        assert_eq!(model.log, vec!["A".to_string()]);
    }

    #[test]
    fn refused_request_restores_checkpoint() {
        let mut model = FlatModel {
            refuse: vec!["B".into()],
            ..FlatModel::default()
        };
        let reqs = [
            ValueRequest::parse(SymbolRef::new("A", SymbolType::Tristate), "y").unwrap(),
            ValueRequest::parse(SymbolRef::new("B", SymbolType::Tristate), "y").unwrap(),
        ];

        let report = apply_requests(&mut model, &reqs, &ApplyOptions::default());
        assert!(!report.is_applied());
        assert_eq!(model.log, vec!["A".to_string()]);
        assert!(model.values.is_empty());
    }

    #[test]
    fn preview_always_restores() {
        let mut model = FlatModel::default();
        let d = Diagnosis::new(vec![tri("A", "m")]).unwrap();

        let report = preview_diagnosis(&mut model, &d, &[], &ApplyOptions::default());
        assert!(report.is_applied());
        assert_eq!(report.writes[0].after, SymbolValue::Boolean(Tristate::Mod));
        assert!(model.values.is_empty());
    }

    #[test]
    fn empty_attempt_is_applied_without_passes() {
        let mut model = FlatModel::default();
        let report = apply_requests(&mut model, &[], &ApplyOptions::default());
        assert!(report.is_applied());
        assert_eq!(report.passes, 0);
        assert!(report.writes.is_empty());
    }
}
