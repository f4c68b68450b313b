//! Systems that run over the simulation context each tick.
//!
//! Systems are plain functions that take `&mut SimulationContext` plus the
//! collaborators they need. They do not own state; all state lives in
//! components and the target registry.

pub mod guard;
pub mod picture;
pub mod team_sync;
pub mod threat_response;
