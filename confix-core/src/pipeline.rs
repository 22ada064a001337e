//! Blocking resolve pipeline.
//!
//! Runs entirely on the caller's thread: solve, deduplicate, try candidates in order,
//! commit the first one the model accepts, persist.

use crate::inspect::requests_met;
use crate::ports::Solver;
use crate::settings::ResolveSettings;
use confix_edit::{ApplyReport, ConfigModel, apply_diagnosis, apply_requests};
use confix_types::{
    Diagnosis, DiagnosisSet, Rejection, SolveOutcome, UnresolvableReason, ValueError, ValueRequest,
    check_requests,
};
use tracing::{debug, info, warn};

/// Errors that abort a resolve. Exit code 2 = bad input, 1 = runtime fault.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("symbol `{0}` not found")]
    NotFound(String),

    #[error(transparent)]
    InvalidValue(#[from] ValueError),

    #[error("no value requests given")]
    EmptyRequest,

    #[error("solver failed: {0:#}")]
    Solver(#[source] anyhow::Error),

    /// The model holds the applied state but could not be written to storage.
    #[error("persist configuration: {0:#}")]
    Persist(#[source] anyhow::Error),
}

impl ResolveError {
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ResolveError::NotFound(_) | ResolveError::InvalidValue(_) | ResolveError::EmptyRequest
        )
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_input_error() { 2 } else { 1 }
    }
}

/// Look up `name` and parse `input` against its type.
pub fn build_request<M: ConfigModel>(
    model: &M,
    name: &str,
    input: &str,
) -> Result<ValueRequest, ResolveError> {
    let symbol = model
        .find_symbol(name)
        .ok_or_else(|| ResolveError::NotFound(name.to_string()))?;
    Ok(ValueRequest::parse(symbol, input)?)
}

/// Build requests from `(name, value)` pairs, failing on the first bad one.
pub fn build_requests<M: ConfigModel>(
    model: &M,
    inputs: &[(&str, &str)],
) -> Result<Vec<ValueRequest>, ResolveError> {
    inputs
        .iter()
        .map(|(name, input)| build_request(model, name, input))
        .collect()
}

/// First request whose symbol the model does not know.
pub(crate) fn missing_symbol<'a, M: ConfigModel>(
    model: &M,
    requests: &'a [ValueRequest],
) -> Option<&'a str> {
    requests
        .iter()
        .map(|r| r.symbol().name())
        .find(|name| model.find_symbol(name).is_none())
}

/// Every symbol known and no symbol asked for twice with different values.
fn check_input<M: ConfigModel>(model: &M, requests: &[ValueRequest]) -> Result<(), ResolveError> {
    if let Some(name) = missing_symbol(model, requests) {
        return Err(ResolveError::NotFound(name.to_string()));
    }
    Ok(check_requests(requests)?)
}

pub(crate) fn log_candidates(settings: &ResolveSettings, candidates: &DiagnosisSet) {
    for (idx, d) in candidates.iter().enumerate() {
        let fixes = d
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        if settings.verbose {
            info!(candidate = idx, id = %d.stable_id(), %fixes, "diagnosis");
        } else {
            debug!(candidate = idx, id = %d.stable_id(), %fixes, "diagnosis");
        }
    }
}

fn persist<M: ConfigModel>(settings: &ResolveSettings, model: &mut M) -> Result<(), ResolveError> {
    if !settings.persist {
        debug!("persistence disabled");
        return Ok(());
    }
    model.persist().map_err(|e| {
        warn!(error = %e, "persist failed; model keeps the applied values");
        ResolveError::Persist(e)
    })
}

/// Resolve `requests` against `model`, committing at most one diagnosis.
pub fn resolve<M: ConfigModel>(
    settings: &ResolveSettings,
    solver: &dyn Solver,
    model: &mut M,
    requests: &[ValueRequest],
) -> Result<SolveOutcome, ResolveError> {
    if requests.is_empty() {
        return Err(ResolveError::EmptyRequest);
    }
    check_input(model, requests)?;

    if requests_met(model, requests) {
        info!("requests already hold; nothing to do");
        return Ok(SolveOutcome::NoConflict { written: false });
    }

    let Some(set) = solver.solve(requests).map_err(ResolveError::Solver)? else {
        debug!("solver reports no conflict; writing requests");
        return commit(settings, model, None, requests);
    };

    let candidates = set.deduplicated();
    debug!(
        raw = set.len(),
        unique = candidates.len(),
        "deduplicated diagnoses"
    );
    if candidates.is_empty() {
        info!("solver found no diagnosis");
        return Ok(SolveOutcome::Unresolvable {
            reason: UnresolvableReason::NoDiagnoses,
        });
    }
    log_candidates(settings, &candidates);

    let opts = settings.apply_options();
    let mut rejections = Vec::new();
    for (idx, diagnosis) in candidates.iter().enumerate() {
        let report = apply_diagnosis(model, diagnosis, requests, &opts);
        match rejection(idx, diagnosis, &report) {
            Some(rejected) => {
                debug!(candidate = idx, reason = %rejected.reason, "candidate rejected");
                rejections.push(rejected);
            }
            None => {
                persist(settings, model)?;
                info!(candidate = idx, id = %diagnosis.stable_id(), "diagnosis applied");
                return Ok(SolveOutcome::Applied {
                    diagnosis: diagnosis.clone(),
                    attempts: idx + 1,
                    writes: report.writes,
                });
            }
        }
    }

    warn!(candidates = candidates.len(), "every diagnosis was rejected");
    Ok(SolveOutcome::Unresolvable {
        reason: UnresolvableReason::AllRejected { rejections },
    })
}

/// Apply a reviewed diagnosis (or the requests alone) and persist.
///
/// This is the deliberate, single-threaded commit step that follows a background
/// solve.
pub fn commit<M: ConfigModel>(
    settings: &ResolveSettings,
    model: &mut M,
    diagnosis: Option<&Diagnosis>,
    requests: &[ValueRequest],
) -> Result<SolveOutcome, ResolveError> {
    check_input(model, requests)?;
    let opts = settings.apply_options();

    let Some(diagnosis) = diagnosis else {
        let report = apply_requests(model, requests, &opts);
        if let Some(reason) = report.reject_reason() {
            warn!(%reason, "requests rejected by the model");
            return Ok(SolveOutcome::Unresolvable {
                reason: UnresolvableReason::RequestsRejected {
                    reason: reason.clone(),
                },
            });
        }
        persist(settings, model)?;
        return Ok(SolveOutcome::NoConflict { written: true });
    };

    let report = apply_diagnosis(model, diagnosis, requests, &opts);
    if let Some(rejected) = rejection(0, diagnosis, &report) {
        warn!(reason = %rejected.reason, "diagnosis rejected by the model");
        return Ok(SolveOutcome::Unresolvable {
            reason: UnresolvableReason::AllRejected {
                rejections: vec![rejected],
            },
        });
    }
    persist(settings, model)?;
    Ok(SolveOutcome::Applied {
        diagnosis: diagnosis.clone(),
        attempts: 1,
        writes: report.writes,
    })
}

fn rejection(candidate: usize, diagnosis: &Diagnosis, report: &ApplyReport) -> Option<Rejection> {
    report.reject_reason().map(|reason| Rejection {
        candidate,
        diagnosis_id: diagnosis.stable_id(),
        reason: reason.clone(),
    })
}
