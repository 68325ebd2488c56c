//! Shared test doubles and utilities for the CasePrep service.

mod auth;
mod clock;
mod rng;

pub use auth::{AllowAllAuthorizer, DenyAllAuthorizer};
pub use clock::{FixedClock, fixed_now};
pub use rng::{MockRng, SequenceRng};
