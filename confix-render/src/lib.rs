//! Rendering helpers (markdown) for diagnosis sets, fix tables and outcomes.

use confix_types::{
    DiagnosisSet, FixRow, RejectReason, RequestStatus, SolveOutcome, UnresolvableReason,
    WriteOrigin,
};

pub fn render_diagnosis_set_md(set: &DiagnosisSet) -> String {
    let mut out = String::new();
    out.push_str("# confix diagnoses\n\n");
    out.push_str(&format!("- Candidates: {}\n\n", set.len()));

    if set.is_empty() {
        out.push_str("_No diagnoses._\n");
        return out;
    }

    for (i, d) in set.iter().enumerate() {
        out.push_str(&format!("### {}. `{}`\n\n", i + 1, d.stable_id()));
        for fix in d.iter() {
            out.push_str(&format!(
                "- `{}` := `{}`\n",
                fix.symbol().name(),
                fix.desired()
            ));
        }
        out.push('\n');
    }

    out
}

/// Solution table: one row per fix with the symbol's current value.
pub fn render_fix_rows_md(rows: &[FixRow]) -> String {
    let mut out = String::new();
    if rows.is_empty() {
        out.push_str("_No fixes._\n");
        return out;
    }

    out.push_str("| Symbol | Current | Desired | Change |\n");
    out.push_str("|---|---|---|---|\n");
    for row in rows {
        out.push_str(&format!(
            "| `{}` | `{}` | `{}` | {} |\n",
            row.symbol.name(),
            row.current,
            row.desired,
            if row.changes() { "yes" } else { "no" }
        ));
    }
    out
}

/// Conflicts table: one row per request, marking whether it holds.
pub fn render_request_status_md(rows: &[RequestStatus]) -> String {
    let mut out = String::new();
    if rows.is_empty() {
        out.push_str("_No requests._\n");
        return out;
    }

    out.push_str("| Symbol | Requested | Current | State |\n");
    out.push_str("|---|---|---|---|\n");
    for row in rows {
        out.push_str(&format!(
            "| `{}` | `{}` | `{}` | {} |\n",
            row.request.symbol().name(),
            row.request.desired(),
            row.current,
            if row.is_satisfied() {
                "satisfied"
            } else {
                "unsatisfied"
            }
        ));
    }
    out
}

pub fn render_outcome_md(outcome: &SolveOutcome) -> String {
    let mut out = String::new();
    out.push_str("# confix outcome\n\n");
    out.push_str(&format!("- Outcome: `{}`\n", outcome.label()));

    match outcome {
        SolveOutcome::NoConflict { written } => {
            out.push_str(&format!("- Written: `{}`\n", written));
        }
        SolveOutcome::Applied {
            diagnosis,
            attempts,
            writes,
        } => {
            out.push_str(&format!("- Diagnosis: `{}`\n", diagnosis.stable_id()));
            out.push_str(&format!("- Attempts: {}\n", attempts));
            if !writes.is_empty() {
                out.push_str("\n**Writes**\n\n");
                for w in writes {
                    let origin = match w.origin {
                        WriteOrigin::Fix => "fix",
                        WriteOrigin::Request => "request",
                    };
                    out.push_str(&format!(
                        "- `{}` ({}) {} → {}{}\n",
                        w.symbol.name(),
                        origin,
                        w.before,
                        w.after,
                        if w.held { "" } else { " (not held)" }
                    ));
                }
            }
        }
        SolveOutcome::RequestsPending => {
            out.push_str("- No conflict; requests not yet written\n");
        }
        SolveOutcome::Diagnoses { diagnoses } => {
            out.push_str(&format!("- Candidates: {}\n", diagnoses.len()));
            for (i, d) in diagnoses.iter().enumerate() {
                let fixes = d
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                out.push_str(&format!("  {}. `{}`\n", i + 1, fixes));
            }
        }
        SolveOutcome::Unresolvable { reason } => match reason {
            UnresolvableReason::NoDiagnoses => {
                out.push_str("- Reason: solver found no diagnosis\n");
            }
            UnresolvableReason::RequestsRejected { reason } => {
                out.push_str(&format!("- Reason: {}\n", reason_label(reason)));
                out.push_str(&format!("- Detail: {}\n", reason));
            }
            UnresolvableReason::AllRejected { rejections } => {
                out.push_str(&format!("- Rejected candidates: {}\n", rejections.len()));
                out.push_str("\n**Rejections**\n\n");
                for r in rejections {
                    out.push_str(&format!(
                        "- {}. `{}` `{}`: {}\n",
                        r.candidate + 1,
                        r.diagnosis_id,
                        reason_label(&r.reason),
                        r.reason
                    ));
                }
            }
        },
        SolveOutcome::Cancelled => {}
        SolveOutcome::Failed { message } => {
            out.push_str(&format!("- Message: {}\n", message));
        }
    }

    out
}

fn reason_label(r: &RejectReason) -> &'static str {
    match r {
        RejectReason::Refused { .. } => "refused",
        RejectReason::NotHeld { .. } => "not_held",
        RejectReason::ConflictsWithRequest { .. } => "conflicts_with_request",
    }
}
