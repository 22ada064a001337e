#![no_main]

//! Fuzz target for value parsing against each symbol type.
//!
//! Accepted input must produce a request that its own desired value satisfies and
//! whose canonical text parses back to the same value.

use confix_types::{SymbolFix, SymbolRef, SymbolType, ValueRequest};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, arbitrary::Arbitrary)]
struct Input {
    ty: u8,
    name: String,
    value: String,
}

fn symbol_type(raw: u8) -> SymbolType {
    match raw % 5 {
        0 => SymbolType::Bool,
        1 => SymbolType::Tristate,
        2 => SymbolType::Int,
        3 => SymbolType::Hex,
        _ => SymbolType::String,
    }
}

fuzz_target!(|input: Input| {
    let symbol = SymbolRef::new(input.name, symbol_type(input.ty));

    let Ok(request) = ValueRequest::parse(symbol.clone(), &input.value) else {
        return;
    };
    assert_eq!(request.desired().kind(), symbol.value_kind());
    assert!(request.is_met_by(request.desired()));

    let canonical = request.desired().to_string();
    let again = ValueRequest::parse(symbol.clone(), &canonical).expect("canonical text parses");
    assert_eq!(again.desired(), request.desired());

    let fix = SymbolFix::parse(symbol, &input.value).expect("fix parses like a request");
    assert_eq!(fix.desired(), request.desired());
});
