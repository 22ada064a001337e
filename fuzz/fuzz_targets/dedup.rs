#![no_main]

//! Fuzz target for diagnosis equality and duplicate removal.

use confix_types::{
    Diagnosis, DiagnosisSet, SymbolFix, SymbolRef, SymbolType, SymbolValue, Tristate,
    remove_duplicates,
};
use libfuzzer_sys::fuzz_target;

const NAMES: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

fn fix(name: u8, value: u8) -> SymbolFix {
    let symbol = SymbolRef::new(NAMES[name as usize % NAMES.len()], SymbolType::Tristate);
    let value = match value % 3 {
        0 => Tristate::No,
        1 => Tristate::Mod,
        _ => Tristate::Yes,
    };
    SymbolFix::new(symbol, SymbolValue::Boolean(value)).expect("tristate fix")
}

fuzz_target!(|raw: Vec<Vec<(u8, u8)>>| {
    let diagnoses: Vec<Diagnosis> = raw
        .into_iter()
        .filter_map(|fixes| Diagnosis::new(fixes.into_iter().map(|(n, v)| fix(n, v))).ok())
        .collect();

    let unique = remove_duplicates(&diagnoses);
    assert!(unique.len() <= diagnoses.len());

    for (i, a) in unique.iter().enumerate() {
        for b in &unique[i + 1..] {
            assert_ne!(a, b);
        }
        assert!(diagnoses.contains(a));
    }
    for d in &diagnoses {
        assert!(unique.contains(d));
    }

    assert_eq!(remove_duplicates(&unique), unique);
    assert_eq!(DiagnosisSet::new(diagnoses).deduplicated().into_vec(), unique);
});
