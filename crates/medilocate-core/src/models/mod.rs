//! Domain models for the medilocate core.

mod inventory;
mod location;

pub use inventory::*;
pub use location::*;
