//! View model consumed by the rendering shell.

pub mod model;
pub mod state;

pub use model::{ViewModel, ViewSnapshot};
pub use state::{ViewEvent, ViewState};
