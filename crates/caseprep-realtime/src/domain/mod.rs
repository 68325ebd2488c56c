//! Domain model for session credential issuance.

pub mod commands;
pub mod instructions;
pub mod key_pool;
pub mod session;
