//! Observable view model.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, trace};

use coinsync_core::types::AggregateView;

use super::state::{ViewEvent, ViewState, next_state};

/// What the rendering shell consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    /// Current state.
    pub state: ViewState,
    /// Latest derived aggregate, present in `Ready` and `Empty`.
    pub aggregate: Option<AggregateView>,
    /// Advisory copy for error and empty states.
    pub error_message: Option<String>,
    /// Incremented on every accepted event.
    pub revision: u64,
}

impl ViewSnapshot {
    fn initial() -> Self {
        Self {
            state: ViewState::AuthPending,
            aggregate: None,
            error_message: None,
            revision: 0,
        }
    }
}

/// The only mutable shared state of the sync engine.
///
/// Mutated solely by the engine task; observers receive every accepted
/// change through a `watch` channel. Once sealed, nothing changes it.
#[derive(Debug)]
pub struct ViewModel {
    tx: watch::Sender<ViewSnapshot>,
    sealed: AtomicBool,
}

impl ViewModel {
    /// Create a view model in `AuthPending`.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ViewSnapshot::initial());
        Self {
            tx,
            sealed: AtomicBool::new(false),
        }
    }

    /// Observe view changes.
    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.tx.subscribe()
    }

    /// Current rendering.
    pub fn current(&self) -> ViewSnapshot {
        self.tx.borrow().clone()
    }

    /// Apply an event. Returns whether it was accepted.
    pub fn apply(&self, event: ViewEvent) -> bool {
        if self.is_sealed() {
            trace!(event = event.name(), "View model sealed, event ignored");
            return false;
        }

        let mut accepted = false;
        self.tx.send_if_modified(|snap| {
            let Some(next) = next_state(snap.state, &event) else {
                debug!(state = ?snap.state, event = event.name(), "Event not accepted");
                return false;
            };

            if next != snap.state {
                info!(from = ?snap.state, to = ?next, "View state changed");
            }

            snap.state = next;
            snap.error_message = next.advisory().map(str::to_string);
            snap.aggregate = match event {
                ViewEvent::Snapshot(ref view) => Some(view.clone()),
                _ => None,
            };
            snap.revision += 1;
            accepted = true;
            true
        });
        accepted
    }

    /// Stop accepting events. Called once at teardown.
    pub fn seal(&self) {
        if !self.sealed.swap(true, Ordering::SeqCst) {
            debug!("View model sealed");
        }
    }

    /// Whether the view model has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }
}

impl Default for ViewModel {
    fn default() -> Self {
        Self::new()
    }
}
