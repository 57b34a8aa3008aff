//! Identity provider boundary.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::subscription::Subscription;
use crate::types::identity::Identity;

/// Issues and reports session identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug + 'static {
    /// The identity of the persisted session, if one exists.
    fn current_identity(&self) -> Option<Identity>;

    /// Observe auth-state changes.
    ///
    /// The first event reports the current state; later events fire on
    /// every sign-in or sign-out.
    fn observe_auth_state(&self) -> Subscription<Option<Identity>>;

    /// Obtain an identity without user credentials.
    ///
    /// Idempotent within a persisted session: if an identity already
    /// exists it is returned instead of issuing a new one.
    async fn sign_in_anonymously(&self) -> AppResult<Identity>;
}
