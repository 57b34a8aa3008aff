//! Collaborator traits defined in `coinsync-core` and implemented by
//! store adapters.
//!
//! The sync engine only ever talks to the backing store through these
//! three seams, which keeps it testable against in-memory fakes.

pub mod document;
pub mod identity;
pub mod live_query;

pub use document::DocumentStore;
pub use identity::IdentityProvider;
pub use live_query::{LiveQuery, SnapshotEvent};
