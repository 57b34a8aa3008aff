//! Store backends implementing the collaborator traits.

pub mod memory;
