//! ECS components attached to unit and missile entities.
//!
//! Plain data from `bulwark-core` (`UnitBody`, `Loadout`, `SensorFit`,
//! `MissileInfo`) is stored directly; the types here only exist on the
//! simulation side.

use bulwark_core::types::{Position, TeamId, UnitId};

/// Identity of a trackable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    pub id: UnitId,
}

/// Team affiliation component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamTag(pub TeamId);

/// Designated coordinates kept for coordinate-guided weapons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpsDatabase {
    pub points: Vec<Position>,
}

impl GpsDatabase {
    /// First stored point within `radius` of `target`.
    pub fn find_near(&self, target: &Position, radius: f64) -> Option<Position> {
        self.points
            .iter()
            .copied()
            .find(|p| p.range_to(target) < radius)
    }
}
