//! BDD step definitions for the slot monitor

pub mod change_steps;
pub mod delivery_steps;
pub mod lifecycle_steps;
pub mod phase_steps;
