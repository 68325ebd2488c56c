//! Test authorizers: fixed-answer `Authorizer` implementations.

use caseprep_core::auth::{Authorizer, Capability, Requester};
use uuid::Uuid;

/// Grants the admin capability to every requester.
#[derive(Debug, Clone, Copy)]
pub struct AllowAllAuthorizer;

impl Authorizer for AllowAllAuthorizer {
    fn authorize(&self, _requester: &Requester, _owner_id: Uuid) -> Option<Capability> {
        Some(Capability::Admin)
    }
}

/// Denies every requester, including owners.
#[derive(Debug, Clone, Copy)]
pub struct DenyAllAuthorizer;

impl Authorizer for DenyAllAuthorizer {
    fn authorize(&self, _requester: &Requester, _owner_id: Uuid) -> Option<Capability> {
        None
    }
}
