//! Embeddable core library for confix.
//!
//! Provides a clap-free entry point for resolving kconfig value requests against an
//! external configuration model and an external solver.
//!
//! # Port traits
//!
//! - [`ConfigModel`] (re-exported from `confix-edit`): symbol lookup, value reads and
//!   writes, recomputation, persistence, checkpoint/restore.
//! - [`Solver`](ports::Solver): turns value requests into candidate diagnoses.
//!
//! The [`adapters`] module provides in-memory implementations for embedding and tests.
//!
//! # Entry points
//!
//! - [`resolve`](pipeline::resolve): blocking solve, apply and persist.
//! - [`commit`](pipeline::commit): apply one reviewed diagnosis and persist.
//! - [`SolveSession`](session::SolveSession): cancellable background solve that stops
//!   at the diagnosis set.

pub mod adapters;
pub mod cancel;
pub mod config;
pub mod inspect;
pub mod pipeline;
pub mod ports;
pub mod session;
pub mod settings;
pub mod telemetry;

pub use confix_edit::{ConfigModel, WriteRejected};
pub use pipeline::{ResolveError, build_request, build_requests, commit, resolve};
pub use ports::Solver;
pub use session::{RunState, SessionError, SolveHandle, SolveSession};
pub use settings::{BusyPolicy, ResolveSettings};
