//! Outbound notification seam.
//!
//! Approval hands a reset token to a `Notifier`; the shipped transport
//! writes it to the operator log so an admin can relay the link by hand.
//! Dispatch failures are never fatal to the triggering operation.

use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a password-set token. Returns whether anything was sent.
    async fn send_reset_token(&self, email: &str, token: &str) -> bool;
}

/// Log-only transport.
pub struct LogNotifier {
    client_origin: String,
}

impl LogNotifier {
    #[must_use]
    pub fn new(client_origin: Option<String>) -> Self {
        Self {
            client_origin: client_origin
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_reset_token(&self, email: &str, token: &str) -> bool {
        let link = format!("{}/password-set?token={}", self.client_origin, token);
        info!("Reset token for {email}: {token} (set link: {link})");
        false
    }
}
