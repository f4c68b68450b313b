//! Plain-data records exchanged with the sensor collaborators: unit bodies,
//! target records, threat snapshots and per-tick sensor feedback.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::{TargetCategory, TargetingMode};
use crate::types::{Position, TeamId, UnitId, Velocity};

/// Kinematic and physical state of a unit as last reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitBody {
    pub position: Position,
    pub velocity: Velocity,
    /// Unit vector along the unit's nose.
    pub forward: DVec3,
    /// Acceleration along the nose (m/s²).
    pub forward_accel: f64,
    pub bank_deg: f64,
    pub mass: f64,
    pub radius: f64,
    pub flying: bool,
    /// Landed, or floating on the water surface.
    pub surface: bool,
    pub underwater: bool,
    /// Disabled by an electromagnetic weapon.
    pub debilitated: bool,
}

impl Default for UnitBody {
    fn default() -> Self {
        Self {
            position: Position::default(),
            velocity: Velocity::default(),
            forward: DVec3::Y,
            forward_accel: 0.0,
            bank_deg: 0.0,
            mass: 1.0,
            radius: 5.0,
            flying: false,
            surface: true,
            underwater: false,
            debilitated: false,
        }
    }
}

impl UnitBody {
    /// Grounded units cannot maneuver to help a turret traverse.
    pub fn is_grounded(&self) -> bool {
        !self.flying
    }
}

/// Flight data carried by a missile's target record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissileInfo {
    pub source: UnitId,
    pub target: Option<UnitId>,
    pub targeting: TargetingMode,
}

/// A trackable entity as seen by every observer this tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub id: UnitId,
    pub team: TeamId,
    pub body: UnitBody,
    pub weapon_count: u32,
    pub is_vip: bool,
    /// Present when the entity is a missile in flight.
    pub missile: Option<MissileInfo>,
    /// The target this entity is itself engaging.
    pub engaging: Option<UnitId>,
}

impl TargetRecord {
    pub fn position(&self) -> Position {
        self.body.position
    }

    pub fn velocity(&self) -> Velocity {
        self.body.velocity
    }

    pub fn is_missile(&self) -> bool {
        self.missile.is_some()
    }

    /// Weapon scoring category. Missiles first, then depth, then contact with
    /// the ground or sea surface.
    pub fn category(&self) -> TargetCategory {
        if self.is_missile() {
            TargetCategory::Missile
        } else if self.body.underwater {
            TargetCategory::Underwater
        } else if self.body.surface && !self.body.flying {
            TargetCategory::Surface
        } else {
            TargetCategory::Airborne
        }
    }
}

/// Missile inbound on the observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomingMissile {
    pub missile: UnitId,
    pub source: Option<UnitId>,
    pub targeting: TargetingMode,
    pub position: Position,
    pub velocity: Velocity,
}

/// Gunfire attributed to a shooter, with the observed miss distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GunfireReport {
    pub source: UnitId,
    pub miss_distance: f64,
}

/// Per-scan threat bundle produced by the sensor collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatSnapshot {
    pub incoming: Vec<IncomingMissile>,
    pub gunfire: Vec<GunfireReport>,
    /// Radar emitter positions seen by the radar-warning receiver.
    pub rwr_emitters: Vec<Position>,
}

impl ThreatSnapshot {
    /// The incoming missile closest to `observer`.
    pub fn nearest_missile(&self, observer: &Position) -> Option<&IncomingMissile> {
        self.incoming.iter().min_by(|a, b| {
            observer
                .range_to(&a.position)
                .total_cmp(&observer.range_to(&b.position))
        })
    }

    pub fn under_fire(&self) -> bool {
        !self.gunfire.is_empty()
    }

    pub fn antirad_inbound(&self) -> bool {
        self.incoming
            .iter()
            .any(|m| m.targeting == TargetingMode::AntiRad)
    }

    /// Whether an emitter lies within `radius` of `point`.
    pub fn emitter_near(&self, point: &Position, radius: f64) -> Option<Position> {
        self.rwr_emitters
            .iter()
            .copied()
            .find(|e| e.range_to(point) <= radius)
    }
}

/// Sensors and defensive devices fitted to a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorFit {
    pub radar: bool,
    pub irst: bool,
    pub rwr: bool,
    pub targeting_pod: bool,
    pub sonar: bool,
    pub jammer: bool,
    pub cloak: bool,
    pub flares: bool,
    pub chaff: bool,
}

/// Lock and aim state reported back by the actuators each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorFeedback {
    pub radar_lock: Option<UnitId>,
    pub heat_lock: Option<Position>,
    pub laser_designation: Option<Position>,
    pub pod_point: Option<Position>,
    /// The selected missile's turret points within its firing field of view.
    pub turret_aimed: bool,
}

/// Closing time in seconds between two bodies, clamped to one hour.
pub fn closing_time(a: &Position, a_vel: &Velocity, b: &Position, b_vel: &Velocity) -> f64 {
    let rel_speed = (a_vel.as_vec() - b_vel.as_vec()).length();
    if rel_speed <= f64::EPSILON {
        return 3600.0;
    }
    (a.range_to(b) / rel_speed).clamp(0.0, 3600.0)
}
