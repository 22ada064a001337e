#![no_main]

//! Fuzz target for the blocking resolve pipeline against an in-memory model.
//!
//! Whatever the solver proposes, an unresolved outcome must leave the model exactly as
//! it was, and a resolved one must leave every request holding.

use confix_core::adapters::{InMemoryModel, StaticSolver};
use confix_core::{ConfigModel, ResolveSettings, resolve};
use confix_types::{Diagnosis, SolveOutcome, SymbolFix, SymbolType, Tristate, ValueRequest};
use libfuzzer_sys::fuzz_target;

const NAMES: [&str; 5] = ["A", "B", "C", "D", "E"];

#[derive(Debug, arbitrary::Arbitrary)]
struct Input {
    initial: [u8; 5],
    bool_mask: u8,
    depends: Vec<(u8, u8)>,
    locked: Option<u8>,
    requests: Vec<(u8, u8)>,
    diagnoses: Vec<Vec<(u8, u8)>>,
    max_passes: Option<u8>,
}

fn tristate(raw: u8) -> Tristate {
    match raw % 3 {
        0 => Tristate::No,
        1 => Tristate::Mod,
        _ => Tristate::Yes,
    }
}

fn name(raw: u8) -> &'static str {
    NAMES[raw as usize % NAMES.len()]
}

fuzz_target!(|input: Input| {
    let mut model = InMemoryModel::new();
    for (i, raw) in input.initial.iter().enumerate() {
        let ty = if input.bool_mask & (1 << i) != 0 {
            SymbolType::Bool
        } else {
            SymbolType::Tristate
        };
        let value = match (ty, tristate(*raw)) {
            (SymbolType::Bool, Tristate::Mod) => Tristate::Yes,
            (_, t) => t,
        };
        model.define(NAMES[i], ty, value);
    }
    for (a, b) in input.depends.iter().take(6) {
        if name(*a) != name(*b) {
            model = model.depends_on(name(*a), name(*b));
        }
    }
    if let Some(l) = input.locked {
        model = model.lock(name(l));
    }

    let lookup = |n: u8| model.find_symbol(name(n)).expect("defined symbol");
    let requests: Vec<ValueRequest> = input
        .requests
        .iter()
        .take(3)
        .filter_map(|(n, v)| ValueRequest::parse(lookup(*n), tristate(*v).as_token()).ok())
        .collect();
    let diagnoses: Vec<Diagnosis> = input
        .diagnoses
        .iter()
        .take(4)
        .filter_map(|fixes| {
            let fixes = fixes
                .iter()
                .take(4)
                .filter_map(|(n, v)| SymbolFix::parse(lookup(*n), tristate(*v).as_token()).ok());
            Diagnosis::new(fixes).ok()
        })
        .collect();

    let solver = if diagnoses.is_empty() {
        StaticSolver::no_conflict()
    } else {
        StaticSolver::with_diagnoses(diagnoses)
    };
    let settings = ResolveSettings {
        max_passes: input.max_passes.map(|p| usize::from(p % 8) + 1),
        ..ResolveSettings::default()
    };

    let baseline = model.values();
    let Ok(outcome) = resolve(&settings, &solver, &mut model, &requests) else {
        return;
    };
    match outcome {
        SolveOutcome::NoConflict { .. } | SolveOutcome::Applied { .. } => {
            for r in &requests {
                assert!(r.is_met_by(&model.current_value(r.symbol())), "{r} does not hold");
            }
        }
        SolveOutcome::Unresolvable { .. } => assert_eq!(model.values(), baseline),
        other => panic!("blocking resolve produced {other:?}"),
    }
});
