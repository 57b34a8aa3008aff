//! Identity bootstrap: establish a session identity before any data access.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use coinsync_core::error::AppError;
use coinsync_core::traits::IdentityProvider;
use coinsync_core::types::Identity;

use crate::context::SyncContext;

/// How bootstrap settled.
#[derive(Debug, Clone)]
pub enum BootstrapOutcome {
    /// A session identity is available.
    Ready(Identity),
    /// Issuance failed; the sync pipeline must not start.
    Failed(AppError),
}

/// Resolves the session identity, issuing an anonymous one when absent.
///
/// No retry: a failed bootstrap stays failed until the owner restarts.
#[derive(Debug, Clone)]
pub struct IdentityBootstrapper {
    provider: Arc<dyn IdentityProvider>,
    timeout: Duration,
}

impl IdentityBootstrapper {
    /// Create a bootstrapper from the sync context.
    pub fn new(ctx: &SyncContext) -> Self {
        Self {
            provider: Arc::clone(&ctx.identity),
            timeout: ctx.config.bootstrap_timeout(),
        }
    }

    /// Settle the session identity.
    pub async fn bootstrap(&self) -> BootstrapOutcome {
        if let Some(identity) = self.provider.current_identity() {
            info!(identity = %identity.id, "Session identity restored");
            return BootstrapOutcome::Ready(identity);
        }

        info!("No session identity, requesting anonymous sign-in");
        match tokio::time::timeout(self.timeout, self.provider.sign_in_anonymously()).await {
            Ok(Ok(identity)) => {
                info!(identity = %identity.id, "Anonymous identity issued");
                BootstrapOutcome::Ready(identity)
            }
            Ok(Err(e)) => {
                error!(error = %e, "Anonymous sign-in failed");
                BootstrapOutcome::Failed(AppError::authentication(e.message))
            }
            Err(_) => {
                error!(timeout = ?self.timeout, "Anonymous sign-in timed out");
                BootstrapOutcome::Failed(AppError::authentication(format!(
                    "anonymous sign-in timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
        }
    }
}
