//! Authorization model.
//!
//! Authentication happens outside this service; handlers receive an already
//! identified [`Requester`]. Whether that requester may act on a resource is a
//! capability decision delegated to an injected [`Authorizer`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Role asserted for a requester by the upstream identity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A regular participant.
    #[default]
    Member,
    /// An operator with access to every interview.
    Admin,
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            other => Err(DomainError::Unauthorized(format!("unknown role '{other}'"))),
        }
    }
}

/// An identified caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    /// The caller's user identifier.
    pub user_id: Uuid,
    /// The caller's role.
    pub role: Role,
}

impl Requester {
    /// Creates a member requester.
    #[must_use]
    pub fn member(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Member,
        }
    }

    /// Creates an admin requester.
    #[must_use]
    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.user_id, self.role)
    }
}

/// The capability under which a requester is allowed to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The requester owns the resource.
    Owner,
    /// The requester holds elevated privilege.
    Admin,
}

/// Capability check for interview-scoped operations.
pub trait Authorizer: Send + Sync {
    /// Returns the capability `requester` holds over a resource owned by
    /// `owner_id`, or `None` if access is denied.
    fn authorize(&self, requester: &Requester, owner_id: Uuid) -> Option<Capability>;
}

/// Default authorizer: admins may act on anything, members on what they own.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnershipAuthorizer;

impl Authorizer for OwnershipAuthorizer {
    fn authorize(&self, requester: &Requester, owner_id: Uuid) -> Option<Capability> {
        match requester.role {
            Role::Admin => Some(Capability::Admin),
            Role::Member if requester.user_id == owner_id => Some(Capability::Owner),
            Role::Member => None,
        }
    }
}

/// Grants only the admin capability; owners without the admin role are
/// denied. Used for operations (such as progress reset) that the
/// authenticated surface restricts to operators.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminOnlyAuthorizer;

impl Authorizer for AdminOnlyAuthorizer {
    fn authorize(&self, requester: &Requester, _owner_id: Uuid) -> Option<Capability> {
        (requester.role == Role::Admin).then_some(Capability::Admin)
    }
}

/// Runs `authorizer` and converts a denial into `DomainError::Forbidden`.
///
/// # Errors
///
/// Returns `DomainError::Forbidden` if the authorizer denies access.
pub fn require_capability(
    authorizer: &dyn Authorizer,
    requester: &Requester,
    owner_id: Uuid,
    interview_id: Uuid,
) -> Result<Capability, DomainError> {
    authorizer
        .authorize(requester, owner_id)
        .ok_or(DomainError::Forbidden {
            requester: requester.user_id,
            interview_id,
        })
}
