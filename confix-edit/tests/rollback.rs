//! Rollback and retry behaviour of the applicator against a dependency-aware model.

use confix_edit::{
    ApplyOptions, ApplyStatus, ConfigModel, WriteRejected, apply_diagnosis, apply_requests,
};
use confix_types::{
    Diagnosis, RejectReason, SymbolFix, SymbolRef, SymbolType, SymbolValue, Tristate,
    ValueRequest,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

/// `deps[a] = b` means `a` may only be enabled while `b` is `y`; disabling `b` forces `a` off.
#[derive(Default, Clone)]
struct DepModel {
    values: BTreeMap<String, Tristate>,
    deps: BTreeMap<String, String>,
    /// Symbols whose value is pinned by recomputation regardless of writes.
    pinned: BTreeMap<String, Tristate>,
    writes: usize,
}

impl DepModel {
    fn with(values: &[(&str, Tristate)]) -> Self {
        Self {
            values: values.iter().map(|(n, t)| (n.to_string(), *t)).collect(),
            ..Self::default()
        }
    }

    fn get(&self, name: &str) -> Tristate {
        self.values.get(name).copied().unwrap_or(Tristate::No)
    }
}

impl ConfigModel for DepModel {
    type Checkpoint = BTreeMap<String, Tristate>;

    fn find_symbol(&self, name: &str) -> Option<SymbolRef> {
        self.values
            .contains_key(name)
            .then(|| SymbolRef::new(name, SymbolType::Bool))
    }

    fn current_value(&self, symbol: &SymbolRef) -> SymbolValue {
        SymbolValue::Boolean(self.get(symbol.name()))
    }

    fn set_value(&mut self, symbol: &SymbolRef, value: &SymbolValue) -> Result<(), WriteRejected> {
        let Some(t) = value.as_tristate() else {
            return Err(WriteRejected::new(symbol.name(), "not a tristate"));
        };
        if t.is_enabled()
            && let Some(dep) = self.deps.get(symbol.name())
            && self.get(dep) != Tristate::Yes
        {
            return Err(WriteRejected::new(
                symbol.name(),
                format!("depends on {dep}"),
            ));
        }
        self.writes += 1;
        self.values.insert(symbol.name().to_string(), t);
        Ok(())
    }

    fn recompute(&mut self, symbol: &SymbolRef) {
        if let Some(t) = self.pinned.get(symbol.name()) {
            self.values.insert(symbol.name().to_string(), *t);
        }
        if self.get(symbol.name()) != Tristate::Yes {
            let dependents: Vec<String> = self
                .deps
                .iter()
                .filter(|(_, dep)| dep.as_str() == symbol.name())
                .map(|(a, _)| a.clone())
                .collect();
            for a in dependents {
                self.values.insert(a, Tristate::No);
            }
        }
    }

    fn persist(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn checkpoint(&self) -> Self::Checkpoint {
        self.values.clone()
    }

    fn restore(&mut self, checkpoint: Self::Checkpoint) {
        self.values = checkpoint;
    }
}

fn sym(name: &str) -> SymbolRef {
    SymbolRef::new(name, SymbolType::Bool)
}

fn fix(name: &str, v: &str) -> SymbolFix {
    SymbolFix::parse(sym(name), v).expect("fix")
}

fn request(name: &str, v: &str) -> ValueRequest {
    ValueRequest::parse(sym(name), v).expect("request")
}

#[test]
fn dependent_request_lands_after_its_fix() {
    let mut model = DepModel::with(&[("Y", Tristate::No), ("Z", Tristate::No)]);
    model.deps.insert("Y".into(), "Z".into());

    let d = Diagnosis::new(vec![fix("Z", "y")]).expect("diag");
    let report = apply_diagnosis(&mut model, &d, &[request("Y", "y")], &ApplyOptions::default());

    assert!(report.is_applied());
    assert_eq!(model.get("Y"), Tristate::Yes);
    assert_eq!(model.get("Z"), Tristate::Yes);
}

#[test]
fn refused_write_is_retried_in_a_later_pass() {
    let mut model = DepModel::with(&[("A", Tristate::No), ("B", Tristate::No)]);
    model.deps.insert("A".into(), "B".into());

    // A sorts first and is refused until B is enabled.
    let d = Diagnosis::new(vec![fix("A", "y"), fix("B", "y")]).expect("diag");
    let report = apply_diagnosis(&mut model, &d, &[], &ApplyOptions::default());

    assert!(report.is_applied());
    assert_eq!(report.passes, 2);
    assert_eq!(model.get("A"), Tristate::Yes);
}

#[test]
fn pass_limit_turns_retry_into_rejection() {
    let mut model = DepModel::with(&[("A", Tristate::No), ("B", Tristate::No)]);
    model.deps.insert("A".into(), "B".into());

    let d = Diagnosis::new(vec![fix("A", "y"), fix("B", "y")]).expect("diag");
    let opts = ApplyOptions {
        max_passes: Some(1),
    };
    let report = apply_diagnosis(&mut model, &d, &[], &opts);

    assert!(matches!(
        report.reject_reason(),
        Some(RejectReason::Refused { symbol, .. }) if symbol == "A"
    ));
    assert_eq!(model.get("A"), Tristate::No);
    assert_eq!(model.get("B"), Tristate::No);
}

#[test]
fn value_reverted_by_recompute_is_not_held() {
    let mut model = DepModel::with(&[("P", Tristate::No), ("Q", Tristate::No)]);
    model.pinned.insert("P".into(), Tristate::No);

    let d = Diagnosis::new(vec![fix("P", "y"), fix("Q", "y")]).expect("diag");
    let report = apply_diagnosis(&mut model, &d, &[], &ApplyOptions::default());

    assert_eq!(
        report.status,
        ApplyStatus::Rejected {
            reason: RejectReason::NotHeld {
                symbol: "P".into(),
                desired: SymbolValue::Boolean(Tristate::Yes),
                actual: SymbolValue::Boolean(Tristate::No),
            }
        }
    );
    // Q was accepted during the attempt but must not survive the rollback.
    assert_eq!(model.get("Q"), Tristate::No);
}

#[test]
fn second_candidate_leaves_no_residue_from_first() {
    let mut model = DepModel::with(&[
        ("X", Tristate::No),
        ("A", Tristate::No),
        ("B", Tristate::No),
        ("L", Tristate::No),
    ]);
    model.deps.insert("L".into(), "LOCKED".into());

    let baseline = model.values.clone();
    let d1 = Diagnosis::new(vec![fix("A", "y"), fix("L", "y")]).expect("d1");
    let d2 = Diagnosis::new(vec![fix("B", "y")]).expect("d2");
    let req = [request("X", "y")];

    let first = apply_diagnosis(&mut model, &d1, &req, &ApplyOptions::default());
    assert!(!first.is_applied());
    assert_eq!(model.values, baseline);

    let second = apply_diagnosis(&mut model, &d2, &req, &ApplyOptions::default());
    assert!(second.is_applied());
    assert_eq!(model.get("A"), Tristate::No);
    assert_eq!(model.get("B"), Tristate::Yes);
    assert_eq!(model.get("X"), Tristate::Yes);
    assert_eq!(model.get("L"), Tristate::No);
}

#[test]
fn write_records_capture_before_and_after() {
    let mut model = DepModel::with(&[("X", Tristate::Mod)]);
    let report = apply_requests(&mut model, &[request("X", "y")], &ApplyOptions::default());

    assert_eq!(report.writes.len(), 1);
    let rec = &report.writes[0];
    assert_eq!(rec.before, SymbolValue::Boolean(Tristate::Mod));
    assert_eq!(rec.after, SymbolValue::Boolean(Tristate::Yes));
    assert!(rec.held);
    assert_eq!(model.writes, 1);
}
