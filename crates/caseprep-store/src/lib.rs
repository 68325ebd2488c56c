//! CasePrep: interview and template stores.
//!
//! [`memory`] keeps state in-process and is explicitly non-durable; [`pg`]
//! persists to PostgreSQL. Both implement the repository traits from
//! `caseprep-interview` with the same compare-and-swap contract on
//! `save_progress`.

pub mod memory;
pub mod pg;
pub mod schema;
