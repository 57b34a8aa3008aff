//! # coinsync-realtime
//!
//! Real-time synchronization core for CoinSync. Provides:
//!
//! - Anonymous identity bootstrap gating all data access
//! - Live package query subscription and snapshot normalization
//! - Balance derivation with a deterministic "latest package" rule
//! - Latest-wins write-back of the per-identity totals document
//! - A view model state machine consumed by a rendering shell
//! - An in-memory store implementing every collaborator trait

pub mod bootstrap;
pub mod context;
pub mod deriver;
pub mod engine;
pub mod metrics;
pub mod publisher;
pub mod store;
pub mod translator;
pub mod view;

pub use bootstrap::{BootstrapOutcome, IdentityBootstrapper};
pub use context::SyncContext;
pub use deriver::AggregateDeriver;
pub use engine::{SyncEngine, SyncHandle};
pub use publisher::{PublishOutcome, WriteBackPublisher};
pub use store::memory::MemoryStore;
pub use translator::{SnapshotTranslator, Translation};
pub use view::{ViewEvent, ViewModel, ViewSnapshot, ViewState};
