//! Fire-and-forget audit trail writer.

use tracing::warn;

use crate::db::{AuditEntry, Store};

/// Wraps the audit repository so callers can append without plumbing
/// error handling: a failed write is the operator's problem, never the
/// request's.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Store,
}

impl AuditRecorder {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Append one entry. Errors are logged and swallowed; the triggering
    /// business operation must never fail or roll back because of audit.
    pub async fn record(&self, entry: AuditEntry) {
        if let Err(e) = self.store.append_audit(entry).await {
            warn!("Failed to write audit log: {e}");
        }
    }
}
