use veritrail_core::UserIdentity;
use veritrail_domain::AuditAction;

/// Audit attributes persisted in the same transaction as the mutation they
/// describe.
///
/// Services hand the event to the repository mutation; the repository
/// completes the resource type and identifier, which for inserts are only
/// known once the row exists, and commits the audit row together with the
/// mutation. A failed audit write therefore rolls the mutation back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Actor subject.
    pub subject: String,
    /// Stable action identifier.
    pub action: AuditAction,
    /// Optional human-readable detail.
    pub detail: Option<String>,
}

impl AuditEvent {
    /// Builds an event attributed to the acting identity.
    #[must_use]
    pub fn by(actor: &UserIdentity, action: AuditAction, detail: Option<String>) -> Self {
        Self {
            subject: actor.subject().to_owned(),
            action,
            detail,
        }
    }
}
