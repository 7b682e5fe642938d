//! HTTP interface module.

pub(crate) mod monitoring;
pub mod routes;
