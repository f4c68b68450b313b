//! Core types and definitions for the Bulwark combat decision engine.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometry, weapons and loadouts, target and threat records, commands,
//! events, configuration and constants. It has no runtime of its own.

pub mod commands;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod records;
pub mod types;
pub mod weapons;

pub use error::{CoreError, Result};
