//! Job lifecycle module.
//!
//! Bounded interval jobs: creation, per-tick execution, termination and
//! deferred cleanup.

mod definition;
mod registry;
pub mod routes;
mod scheduler;

pub use definition::{JobListing, JobRecord, JobStatus};
pub use registry::JobRegistry;
pub use scheduler::{JobHandle, JobScheduler, SchedulerSettings};
