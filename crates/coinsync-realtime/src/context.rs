//! Explicitly constructed collaborators shared by the pipeline stages.

use std::sync::Arc;

use coinsync_core::config::SyncConfig;
use coinsync_core::traits::{DocumentStore, IdentityProvider, LiveQuery};

/// Everything the bootstrapper, translator, and publisher need from the
/// outside world. There is no ambient session or store handle; tests
/// swap in fakes here.
#[derive(Debug, Clone)]
pub struct SyncContext {
    /// Session identity issuance and observation.
    pub identity: Arc<dyn IdentityProvider>,
    /// Live package query.
    pub live_query: Arc<dyn LiveQuery>,
    /// Write-back target.
    pub documents: Arc<dyn DocumentStore>,
    /// Sync settings.
    pub config: SyncConfig,
}

impl SyncContext {
    /// Create a context from separate collaborators.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        live_query: Arc<dyn LiveQuery>,
        documents: Arc<dyn DocumentStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            identity,
            live_query,
            documents,
            config,
        }
    }

    /// Create a context where one store plays every role.
    pub fn from_store<S>(store: Arc<S>, config: SyncConfig) -> Self
    where
        S: IdentityProvider + LiveQuery + DocumentStore,
    {
        Self {
            identity: store.clone(),
            live_query: store.clone(),
            documents: store,
            config,
        }
    }
}
