//! CasePrep API: library surface for the HTTP server and its tests.

pub mod config;
pub mod demo;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod telemetry;
