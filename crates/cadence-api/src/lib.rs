//! # Cadence API
//!
//! Job lifecycle engine and the HTTP surface in front of it.
//!
//! - **Job**: registry of live jobs and the interval scheduler that drives them
//! - **Guard**: credential sessions kept for the profile guard feature
//! - **HTTP**: axum routes translating requests into scheduler calls
//!
//! ## Job lifecycle
//!
//! ```text
//!  submit ──► resolve id ──► derive token ──► registry insert ──► Active
//!                                                                   │
//!               ┌──────────────── tick ok, count < target ◄─────────┤
//!               │                                                   │
//!               ▼                                                   │
//!            Active ── count == target / deadline ──► Completing ───┼──► Terminated
//!               │                                  (observation     │    (entry removed)
//!               └── tick failed / stopped ─────────────window)──────┘
//! ```

pub mod error;
pub mod guard;
pub mod http;
pub mod job;
pub mod server;
pub mod state;

pub use error::{ApiError, SchedulerError};
pub use guard::{GuardSession, GuardSessionStore};
pub use http::routes::create_router;
pub use job::{
    JobHandle, JobListing, JobRecord, JobRegistry, JobScheduler, JobStatus, SchedulerSettings,
};
pub use server::{ApiServer, ServerSettings};
pub use state::{AppState, CredentialRules};
