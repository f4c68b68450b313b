//! Combat doctrine for Bulwark.
//!
//! Pure decision functions: engagement envelope, weapon candidate scoring,
//! target priority scoring, launch authorization, and the guidance
//! collaborator interface. Nothing here holds state between calls.

pub mod envelope;
pub mod guidance;
pub mod launch;
pub mod target_priority;
pub mod weapon_scoring;

#[cfg(test)]
mod tests;
