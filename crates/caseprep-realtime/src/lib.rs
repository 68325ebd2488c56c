//! CasePrep: question-scoped realtime session credentials.
//!
//! Compiles per-question instructions, requests an ephemeral session from the
//! realtime provider through a failover key pool, and wraps the result with
//! the interview, requester and question it is bound to.

pub mod application;
pub mod domain;
pub mod provider;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
