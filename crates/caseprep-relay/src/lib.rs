//! CasePrep: time-boxed relay (TURN/STUN) credentials.
//!
//! Independent of interview state. A [`RelayCredentialSource`] either derives
//! credentials locally from a shared secret ([`local::HmacRelaySource`]) or
//! requests them from a provider ([`twilio::TwilioRelaySource`]);
//! [`failover::FailoverRelaySource`] chains the two.

pub mod credential;
pub mod failover;
pub mod local;
pub mod twilio;

pub use credential::{RelayCredential, RelayCredentialSource};
