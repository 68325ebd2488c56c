//! CasePrep: Interview & Progress bounded context.
//!
//! Responsible for interview templates as read by this service, the
//! per-interview progress state machine, and the persistence gateways the
//! rest of the system consumes.

pub mod application;
pub mod domain;
