//! Cancellable background solves for interactive hosts.
//!
//! A [`SolveSession`] runs the solver off the caller's thread and stops at the
//! deduplicated diagnosis set; it never writes to the model. The host reviews the
//! result and commits with [`crate::pipeline::commit`].
//!
//! Run lifecycle: `Running` then exactly one of `Completed`, `Cancelled`, `Failed`.
//! The session reports `Idle` again once the caller has taken the outcome.

use crate::cancel::CancelToken;
use crate::inspect::requests_met;
use crate::pipeline::{log_candidates, missing_symbol};
use crate::ports::Solver;
use crate::settings::{BusyPolicy, ResolveSettings};
use chrono::{DateTime, Utc};
use confix_edit::ConfigModel;
use confix_types::{SolveOutcome, UnresolvableReason, ValueError, ValueRequest, check_requests};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{Semaphore, oneshot, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Cancelled | RunState::Failed
        )
    }

    fn of(outcome: &SolveOutcome) -> Self {
        match outcome {
            SolveOutcome::Cancelled => RunState::Cancelled,
            SolveOutcome::Failed { .. } => RunState::Failed,
            _ => RunState::Completed,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a solve is already running")]
    Busy,

    #[error("no value requests given")]
    EmptyRequest,

    #[error("symbol `{0}` not found")]
    NotFound(String),

    #[error(transparent)]
    InvalidValue(#[from] ValueError),
}

type Delivery = (SolveOutcome, DateTime<Utc>);

/// Caller's side of one background solve.
pub struct SolveHandle {
    id: Uuid,
    token: CancelToken,
    state: watch::Receiver<RunState>,
    started_at: DateTime<Utc>,
    rx: Option<oneshot::Receiver<Delivery>>,
    delivered: Option<Delivery>,
    observed: Arc<AtomicBool>,
}

impl SolveHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Raise the cancellation flag; the worker honours it at its next checkpoint.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.clone()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the worker reached its terminal state, once the outcome has been taken.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.delivered.as_ref().map(|(_, at)| *at)
    }

    /// Non-blocking poll for hosts driving their own event loop.
    pub fn try_outcome(&mut self) -> Option<SolveOutcome> {
        if let Some((outcome, _)) = &self.delivered {
            return Some(outcome.clone());
        }
        let rx = self.rx.as_mut()?;
        let delivery = match rx.try_recv() {
            Ok(delivery) => delivery,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => worker_lost(),
        };
        Some(self.take(delivery))
    }

    /// Wait for the terminal outcome.
    pub async fn wait(mut self) -> SolveOutcome {
        if let Some((outcome, _)) = self.delivered.take() {
            return outcome;
        }
        let delivery = match self.rx.take() {
            Some(rx) => rx.await.unwrap_or_else(|_| worker_lost()),
            None => worker_lost(),
        };
        self.take(delivery)
    }

    fn take(&mut self, delivery: Delivery) -> SolveOutcome {
        self.rx = None;
        self.observed.store(true, Ordering::SeqCst);
        let outcome = delivery.0.clone();
        self.delivered = Some(delivery);
        outcome
    }
}

fn worker_lost() -> Delivery {
    (
        SolveOutcome::Failed {
            message: "solve worker stopped without a result".to_string(),
        },
        Utc::now(),
    )
}

struct ActiveRun {
    id: Uuid,
    token: CancelToken,
    state: watch::Receiver<RunState>,
    observed: Arc<AtomicBool>,
}

impl ActiveRun {
    fn is_running(&self) -> bool {
        *self.state.borrow() == RunState::Running
    }

    fn visible_state(&self) -> RunState {
        if self.observed.load(Ordering::SeqCst) {
            RunState::Idle
        } else {
            *self.state.borrow()
        }
    }
}

/// Serializes background solves against one solver.
pub struct SolveSession {
    runtime: Handle,
    solver: Arc<dyn Solver + Send + Sync>,
    settings: ResolveSettings,
    lane: Arc<Semaphore>,
    active: Mutex<Option<ActiveRun>>,
}

impl SolveSession {
    pub fn new(
        runtime: Handle,
        solver: Arc<dyn Solver + Send + Sync>,
        settings: ResolveSettings,
    ) -> Self {
        Self {
            runtime,
            solver,
            settings,
            lane: Arc::new(Semaphore::new(1)),
            active: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &ResolveSettings {
        &self.settings
    }

    /// State of the most recent run, or `Idle` once its outcome has been taken.
    pub fn state(&self) -> RunState {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active
            .as_ref()
            .map(ActiveRun::visible_state)
            .unwrap_or(RunState::Idle)
    }

    pub fn cancel(&self, handle: &SolveHandle) {
        handle.cancel();
    }

    /// Cancel whatever run is current, if any.
    pub fn cancel_active(&self) {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(run) = active.as_ref() {
            run.token.cancel();
        }
    }

    /// Start a background solve for `requests`.
    ///
    /// The model is only read here, on the caller's thread: requests that already hold
    /// complete at once with `NoConflict { written: false }` and no solver call. When the
    /// solver sees no conflict the run ends `RequestsPending`; nothing has been written.
    pub fn start_resolve<M: ConfigModel>(
        &self,
        model: &M,
        requests: Vec<ValueRequest>,
    ) -> Result<SolveHandle, SessionError> {
        if requests.is_empty() {
            return Err(SessionError::EmptyRequest);
        }
        if let Some(name) = missing_symbol(model, &requests) {
            return Err(SessionError::NotFound(name.to_string()));
        }
        check_requests(&requests)?;

        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(prev) = active.as_ref().filter(|run| run.is_running()) {
            match self.settings.on_busy {
                BusyPolicy::Reject => return Err(SessionError::Busy),
                BusyPolicy::CancelPrevious => {
                    info!(previous = %prev.id, "cancelling previous solve");
                    prev.token.cancel();
                }
            }
        }

        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let token = CancelToken::new();
        let (state_tx, state_rx) = watch::channel(RunState::Running);
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let observed = Arc::new(AtomicBool::new(false));

        if requests_met(model, &requests) {
            info!(run = %id, "requests already hold; solve skipped");
            finish(&state_tx, outcome_tx, SolveOutcome::NoConflict { written: false });
        } else {
            info!(run = %id, requests = requests.len(), "solve started");
            let worker = Worker {
                id,
                solver: Arc::clone(&self.solver),
                lane: Arc::clone(&self.lane),
                token: token.clone(),
                settings: self.settings.clone(),
                requests,
            };
            self.runtime.spawn(async move {
                let outcome = worker.run().await;
                finish(&state_tx, outcome_tx, outcome);
            });
        }

        *active = Some(ActiveRun {
            id,
            token: token.clone(),
            state: state_rx.clone(),
            observed: Arc::clone(&observed),
        });

        Ok(SolveHandle {
            id,
            token,
            state: state_rx,
            started_at,
            rx: Some(outcome_rx),
            delivered: None,
            observed,
        })
    }
}

impl Drop for SolveSession {
    fn drop(&mut self) {
        self.cancel_active();
    }
}

/// Publish the terminal state, then hand over the outcome.
fn finish(
    state_tx: &watch::Sender<RunState>,
    outcome_tx: oneshot::Sender<Delivery>,
    outcome: SolveOutcome,
) {
    state_tx.send_replace(RunState::of(&outcome));
    // The handle may already be gone; nobody is left to tell.
    let _ = outcome_tx.send((outcome, Utc::now()));
}

struct Worker {
    id: Uuid,
    solver: Arc<dyn Solver + Send + Sync>,
    lane: Arc<Semaphore>,
    token: CancelToken,
    settings: ResolveSettings,
    requests: Vec<ValueRequest>,
}

impl Worker {
    async fn run(self) -> SolveOutcome {
        let permit = tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                debug!(run = %self.id, "cancelled while waiting for the solver");
                return SolveOutcome::Cancelled;
            }
            permit = Arc::clone(&self.lane).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    return SolveOutcome::Failed {
                        message: "solver lane closed".to_string(),
                    };
                }
            },
        };

        if self.token.is_cancelled() {
            debug!(run = %self.id, "cancelled before the solver call");
            return SolveOutcome::Cancelled;
        }

        let solver = Arc::clone(&self.solver);
        let requests = self.requests.clone();
        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            solver.solve(&requests)
        })
        .await;

        if self.token.is_cancelled() {
            debug!(run = %self.id, "cancelled during the solver call; output discarded");
            return SolveOutcome::Cancelled;
        }

        match result {
            Err(join) => {
                warn!(run = %self.id, error = %join, "solver task aborted");
                SolveOutcome::Failed {
                    message: format!("solver task aborted: {join}"),
                }
            }
            Ok(Err(err)) => {
                warn!(run = %self.id, error = %err, "solver failed");
                SolveOutcome::Failed {
                    message: format!("{err:#}"),
                }
            }
            Ok(Ok(None)) => {
                info!(run = %self.id, "no conflict; requests left for the host to commit");
                SolveOutcome::RequestsPending
            }
            Ok(Ok(Some(set))) => {
                let diagnoses = set.deduplicated();
                if diagnoses.is_empty() {
                    info!(run = %self.id, "solver found no diagnosis");
                    return SolveOutcome::Unresolvable {
                        reason: UnresolvableReason::NoDiagnoses,
                    };
                }
                log_candidates(&self.settings, &diagnoses);
                info!(run = %self.id, candidates = diagnoses.len(), "solve completed");
                SolveOutcome::Diagnoses { diagnoses }
            }
        }
    }
}
