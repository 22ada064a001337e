//! In-memory port implementations for embedding and testing.

use crate::ports::Solver;
use confix_edit::{ConfigModel, WriteRejected};
use confix_types::{
    Diagnosis, DiagnosisSet, SymbolRef, SymbolType, SymbolValue, Tristate, ValueRequest,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    ty: SymbolType,
    value: SymbolValue,
}

/// A small kconfig-like model held in memory.
///
/// Dependencies follow kconfig's `depends on` rule: a boolean symbol's value is capped
/// by the lowest value among its dependencies (an `m` cap counts as `y` for plain
/// `bool` symbols), and a non-boolean symbol is only writable while all of its
/// dependencies are enabled. Recomputation re-applies the caps across the whole model.
#[derive(Debug, Clone, Default)]
pub struct InMemoryModel {
    symbols: BTreeMap<String, Entry>,
    depends: BTreeMap<String, Vec<String>>,
    locked: Vec<String>,
    fail_persist: bool,
    persist_count: usize,
    write_count: usize,
}

impl InMemoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol(
        mut self,
        name: &str,
        ty: SymbolType,
        value: impl Into<SymbolValue>,
    ) -> Self {
        self.define(name, ty, value);
        self
    }

    pub fn define(&mut self, name: &str, ty: SymbolType, value: impl Into<SymbolValue>) {
        self.symbols.insert(
            name.to_string(),
            Entry {
                ty,
                value: value.into(),
            },
        );
    }

    /// Declare `dependent depends on dependency`.
    pub fn depends_on(mut self, dependent: &str, dependency: &str) -> Self {
        self.depends
            .entry(dependent.to_string())
            .or_default()
            .push(dependency.to_string());
        self
    }

    /// Refuse every write to `name`.
    pub fn lock(mut self, name: &str) -> Self {
        self.locked.push(name.to_string());
        self
    }

    pub fn set_fail_persist(&mut self, fail: bool) {
        self.fail_persist = fail;
    }

    pub fn symbol(&self, name: &str) -> Option<SymbolRef> {
        self.find_symbol(name)
    }

    pub fn value(&self, name: &str) -> Option<&SymbolValue> {
        self.symbols.get(name).map(|e| &e.value)
    }

    /// Every symbol's value, by name.
    pub fn values(&self) -> BTreeMap<String, SymbolValue> {
        self.symbols
            .iter()
            .map(|(k, e)| (k.clone(), e.value.clone()))
            .collect()
    }

    pub fn persist_count(&self) -> usize {
        self.persist_count
    }

    /// Accepted writes, including ones later rolled back.
    pub fn write_count(&self) -> usize {
        self.write_count
    }

    /// The highest boolean value `name` may currently take.
    fn cap(&self, name: &str) -> Tristate {
        let Some(deps) = self.depends.get(name) else {
            return Tristate::Yes;
        };
        let cap = deps
            .iter()
            .map(|d| {
                self.symbols
                    .get(d)
                    .and_then(|e| e.value.as_tristate())
                    .unwrap_or(Tristate::No)
            })
            .min()
            .unwrap_or(Tristate::Yes);

        match self.symbols.get(name).map(|e| e.ty) {
            Some(SymbolType::Bool) if cap == Tristate::Mod => Tristate::Yes,
            _ => cap,
        }
    }

    fn depth(&self, name: &str, budget: usize) -> usize {
        if budget == 0 {
            return 0;
        }
        self.depends
            .get(name)
            .map(|deps| {
                deps.iter()
                    .map(|d| 1 + self.depth(d, budget - 1))
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }
}

impl ConfigModel for InMemoryModel {
    type Checkpoint = BTreeMap<String, SymbolValue>;

    fn find_symbol(&self, name: &str) -> Option<SymbolRef> {
        self.symbols
            .get(name)
            .map(|e| SymbolRef::new(name, e.ty))
    }

    fn current_value(&self, symbol: &SymbolRef) -> SymbolValue {
        match self.symbols.get(symbol.name()) {
            Some(e) => e.value.clone(),
            None if symbol.symbol_type().is_boolean() => SymbolValue::Boolean(Tristate::No),
            None => SymbolValue::NonBoolean(String::new()),
        }
    }

    fn set_value(&mut self, symbol: &SymbolRef, value: &SymbolValue) -> Result<(), WriteRejected> {
        let name = symbol.name();
        let Some(entry) = self.symbols.get(name) else {
            return Err(WriteRejected::new(name, "unknown symbol"));
        };
        if self.locked.iter().any(|l| l == name) {
            return Err(WriteRejected::new(name, "symbol is locked"));
        }
        if entry.ty.value_kind() != value.kind() {
            return Err(WriteRejected::new(name, "value kind does not match symbol type"));
        }

        let cap = self.cap(name);
        match value {
            SymbolValue::Boolean(t) if *t > cap => {
                return Err(WriteRejected::new(
                    name,
                    format!("dependencies limit the value to {cap}"),
                ));
            }
            SymbolValue::NonBoolean(_) if cap == Tristate::No => {
                return Err(WriteRejected::new(name, "symbol is not visible"));
            }
            _ => {}
        }

        self.write_count += 1;
        if let Some(entry) = self.symbols.get_mut(name) {
            entry.value = value.clone();
        }
        Ok(())
    }

    fn recompute(&mut self, symbol: &SymbolRef) {
        // Caps only shrink, so this settles within one round per symbol.
        for _ in 0..=self.symbols.len() {
            let lowered: Vec<(String, Tristate)> = self
                .symbols
                .iter()
                .filter_map(|(name, e)| {
                    let current = e.value.as_tristate()?;
                    let cap = self.cap(name);
                    (current > cap).then(|| (name.clone(), cap))
                })
                .collect();
            if lowered.is_empty() {
                break;
            }
            for (name, cap) in lowered {
                debug!(trigger = %symbol, symbol = %name, value = %cap, "recompute lowered value");
                if let Some(e) = self.symbols.get_mut(&name) {
                    e.value = SymbolValue::Boolean(cap);
                }
            }
        }
    }

    fn persist(&mut self) -> anyhow::Result<()> {
        if self.fail_persist {
            anyhow::bail!("persist failed: configuration store is read-only");
        }
        self.persist_count += 1;
        Ok(())
    }

    fn checkpoint(&self) -> Self::Checkpoint {
        self.values()
    }

    fn restore(&mut self, checkpoint: Self::Checkpoint) {
        for (name, value) in checkpoint {
            if let Some(e) = self.symbols.get_mut(&name) {
                e.value = value;
            }
        }
    }

    fn write_order(&self, symbols: &[SymbolRef]) -> Option<Vec<SymbolRef>> {
        if self.depends.is_empty() {
            return None;
        }
        // Dependencies before dependents.
        let budget = self.symbols.len();
        let mut ordered = symbols.to_vec();
        ordered.sort_by_key(|s| self.depth(s.name(), budget));
        Some(ordered)
    }
}

#[derive(Debug, Clone)]
enum Response {
    NoConflict,
    Diagnoses(DiagnosisSet),
    Fail(String),
}

/// Solver returning a fixed response and counting calls.
#[derive(Debug)]
pub struct StaticSolver {
    response: Response,
    calls: AtomicUsize,
}

impl StaticSolver {
    pub fn no_conflict() -> Self {
        Self::from_response(Response::NoConflict)
    }

    pub fn with_diagnoses(diagnoses: Vec<Diagnosis>) -> Self {
        Self::from_response(Response::Diagnoses(DiagnosisSet::new(diagnoses)))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::from_response(Response::Fail(message.into()))
    }

    fn from_response(response: Response) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Solver for StaticSolver {
    fn solve(&self, requests: &[ValueRequest]) -> anyhow::Result<Option<DiagnosisSet>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        debug!(requests = requests.len(), "static solver called");
        match &self.response {
            Response::NoConflict => Ok(None),
            Response::Diagnoses(set) => Ok(Some(set.clone())),
            Response::Fail(message) => Err(anyhow::anyhow!("{message}")),
        }
    }
}
