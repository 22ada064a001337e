//! Property-based tests for diagnosis equality and deduplication.
//!
//! These tests verify that:
//! - Diagnosis equality ignores fix order and repeats
//! - Deduplication is idempotent and keeps first occurrences in order
//! - Every input diagnosis is represented in the deduplicated output

use confix_types::{Diagnosis, SymbolFix, SymbolRef, SymbolType, Tristate, remove_duplicates};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn arb_tristate() -> impl Strategy<Value = Tristate> {
    prop_oneof![Just(Tristate::No), Just(Tristate::Mod), Just(Tristate::Yes)]
}

/// Fix maps over a small symbol pool so duplicates show up often.
fn arb_fix_map() -> impl Strategy<Value = BTreeMap<String, Tristate>> {
    prop::collection::btree_map(
        prop::sample::select(vec!["A", "B", "C", "D"]).prop_map(str::to_string),
        arb_tristate(),
        1..4,
    )
}

fn to_fixes(map: &BTreeMap<String, Tristate>) -> Vec<SymbolFix> {
    map.iter()
        .map(|(name, t)| {
            SymbolFix::new(SymbolRef::new(name.clone(), SymbolType::Tristate), (*t).into())
                .unwrap()
        })
        .collect()
}

fn arb_diagnoses() -> impl Strategy<Value = Vec<Diagnosis>> {
    prop::collection::vec(arb_fix_map(), 0..8).prop_map(|maps| {
        maps.iter()
            .map(|m| Diagnosis::new(to_fixes(m)).unwrap())
            .collect()
    })
}

proptest! {
    #[test]
    fn equality_ignores_order(map in arb_fix_map()) {
        let fixes = to_fixes(&map);
        let mut reversed = fixes.clone();
        reversed.reverse();
        let mut doubled = fixes.clone();
        doubled.extend(fixes.iter().cloned());

        let a = Diagnosis::new(fixes).unwrap();
        let b = Diagnosis::new(reversed).unwrap();
        let c = Diagnosis::new(doubled).unwrap();

        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &c);
        prop_assert_eq!(a.stable_id(), b.stable_id());
    }

    #[test]
    fn dedup_is_idempotent(diagnoses in arb_diagnoses()) {
        let once = remove_duplicates(&diagnoses);
        let twice = remove_duplicates(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn dedup_output_has_no_equal_pair(diagnoses in arb_diagnoses()) {
        let out = remove_duplicates(&diagnoses);
        for i in 0..out.len() {
            for j in (i + 1)..out.len() {
                prop_assert_ne!(&out[i], &out[j]);
            }
        }
    }

    #[test]
    fn dedup_keeps_first_occurrences_in_order(diagnoses in arb_diagnoses()) {
        let out = remove_duplicates(&diagnoses);

        let mut expected: Vec<Diagnosis> = Vec::new();
        for d in &diagnoses {
            if !expected.contains(d) {
                expected.push(d.clone());
            }
        }
        prop_assert_eq!(&out, &expected);

        for d in &diagnoses {
            prop_assert!(out.contains(d));
        }
    }
}
