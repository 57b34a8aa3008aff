//! View states, the events that move between them, and their copy.

use serde::{Deserialize, Serialize};

use coinsync_core::types::AggregateView;

/// Shown when identity bootstrap fails.
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required. Please reload to try again.";

/// Shown when the live query fails.
pub const STREAM_FAILURE_MESSAGE: &str =
    "Failed to load packages. Please check the store access rules.";

/// Shown when no active package exists.
pub const EMPTY_MESSAGE: &str =
    "No package found. Please create a profile and purchase a package first.";

/// Exactly one of these is rendered at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// Waiting for identity bootstrap.
    AuthPending,
    /// Bootstrap failed; terminal until reload.
    AuthFailed,
    /// Signed in, waiting for the first snapshot.
    DataPending,
    /// The live query failed; terminal until reload.
    DataError,
    /// The latest snapshot held no active package.
    Empty,
    /// The latest snapshot held at least one active package.
    Ready,
}

impl ViewState {
    /// States nothing but a reload leaves.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::AuthFailed | Self::DataError)
    }

    /// Progress line for pending states.
    pub fn status_line(self) -> Option<&'static str> {
        match self {
            Self::AuthPending => Some("Authenticating..."),
            Self::DataPending => Some("Loading package..."),
            _ => None,
        }
    }

    /// Advisory copy for error and empty states.
    pub fn advisory(self) -> Option<&'static str> {
        match self {
            Self::AuthFailed => Some(AUTH_REQUIRED_MESSAGE),
            Self::DataError => Some(STREAM_FAILURE_MESSAGE),
            Self::Empty => Some(EMPTY_MESSAGE),
            _ => None,
        }
    }
}

/// Inputs to the view model.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// Bootstrap produced an identity.
    AuthSucceeded,
    /// Bootstrap failed.
    AuthFailed,
    /// A snapshot was translated and derived.
    Snapshot(AggregateView),
    /// The live query failed.
    StreamFailed,
}

impl ViewEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AuthSucceeded => "auth_succeeded",
            Self::AuthFailed => "auth_failed",
            Self::Snapshot(_) => "snapshot",
            Self::StreamFailed => "stream_failed",
        }
    }
}

/// Transition table. `None` means the event is not accepted in `from`.
pub fn next_state(from: ViewState, event: &ViewEvent) -> Option<ViewState> {
    use ViewState::*;

    match (from, event) {
        (AuthPending, ViewEvent::AuthSucceeded) => Some(DataPending),
        (AuthPending, ViewEvent::AuthFailed) => Some(AuthFailed),
        (DataPending | Ready | Empty, ViewEvent::Snapshot(view)) => {
            Some(if view.is_empty() { Empty } else { Ready })
        }
        (DataPending | Ready | Empty, ViewEvent::StreamFailed) => Some(DataError),
        _ => None,
    }
}
