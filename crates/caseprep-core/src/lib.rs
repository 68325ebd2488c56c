//! CasePrep Core: shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that all bounded
//! contexts depend on: time, randomness, commands, the error taxonomy and
//! the authorization model. It contains no infrastructure code.

pub mod auth;
pub mod clock;
pub mod command;
pub mod error;
pub mod rng;
