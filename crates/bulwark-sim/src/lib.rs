//! Decision engine for Bulwark.
//!
//! Owns the hecs ECS world of combat units and missiles in flight, runs the
//! guard, threat response and team systems at a fixed tick rate, and hands
//! back the actuator commands and events each tick produced.

pub mod cascade;
pub mod choreography;
pub mod components;
pub mod context;
pub mod controller;
pub mod countermeasures;
pub mod engine;
pub mod error;
pub mod outbox;
pub mod registry;
pub mod sensors;
pub mod systems;
pub mod teams;
pub mod world_setup;

pub use engine::SimulationEngine;
