//! Application layer: the credential issuer and its command handler.

pub mod command_handlers;
pub mod issuer;
