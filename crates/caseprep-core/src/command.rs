//! Command abstractions.

use uuid::Uuid;

use crate::auth::Requester;

/// Trait that all commands implement.
///
/// Every command is issued on behalf of a [`Requester`]; handlers use the
/// correlation ID and requester for structured logging and authorization.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;

    /// The identity the command is executed for.
    fn requester(&self) -> &Requester;
}
