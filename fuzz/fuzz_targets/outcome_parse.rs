#![no_main]

//! Fuzz target for deserializing outcome and diagnosis JSON.
//!
//! Malformed input must be rejected without panicking; accepted input must serialize.

use confix_types::{Diagnosis, DiagnosisSet, OutcomeEnvelope, SolveOutcome, ValueRequest};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(envelope) = serde_json::from_str::<OutcomeEnvelope>(s) {
        let _ = serde_json::to_string(&envelope);
    }
    if let Ok(outcome) = serde_json::from_str::<SolveOutcome>(s) {
        let _ = serde_json::to_string(&outcome);
    }
    if let Ok(diagnosis) = serde_json::from_str::<Diagnosis>(s) {
        // Construction goes through validation, so the stable id is always computable.
        let _ = diagnosis.stable_id();
    }
    let _ = serde_json::from_str::<DiagnosisSet>(s);
    let _ = serde_json::from_str::<Vec<ValueRequest>>(s);
});
