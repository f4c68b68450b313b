//! Commands into the engine (from the host or an operator) and out of it
//! (to the unit's actuators).

use serde::{Deserialize, Serialize};

use crate::config::GuardConfig;
use crate::enums::{CountermeasureKind, SensorKind};
use crate::types::{Position, TeamId, UnitId, WeaponId};
use crate::weapons::Weapon;

/// Control commands processed at the next tick boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlCommand {
    SetGuardMode { unit: UnitId, enabled: bool },
    SetOverrideTarget { unit: UnitId, target: UnitId },
    SetTeam { unit: UnitId, team: TeamId },
    Configure { unit: UnitId, config: Box<GuardConfig> },
    PartAdded { unit: UnitId, weapon: Weapon },
    PartRemoved { unit: UnitId, weapon: WeaponId },
    /// Store designated coordinates for coordinate-guided weapons.
    DesignateGps { unit: UnitId, point: Position },
    /// Drop `count` of every countermeasure type.
    FireAllCountermeasures { unit: UnitId, count: u32 },
    RemoveUnit { unit: UnitId },
}

/// Actuator command issued on behalf of one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actuation {
    pub unit: UnitId,
    pub command: ActuatorCommand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActuatorCommand {
    SelectWeapon { weapon: WeaponId },
    ClearWeapon,
    OpenBays { weapon: WeaponId },
    CloseBays { weapon: WeaponId },
    TurretEnable { weapon: WeaponId },
    TurretStandby { weapon: WeaponId },
    TurretDisable { weapon: WeaponId },
    SlewTurret { weapon: WeaponId, point: Position },
    SlewPod { point: Position },
    PodLockCom,
    EnableSensor { sensor: SensorKind },
    LockRadar { target: UnitId },
    UnlockRadar,
    RadarEmissions { enabled: bool },
    SetGpsTarget { point: Position },
    Fire { weapon: WeaponId, target: UnitId },
    AutoFire {
        weapon: WeaponId,
        target: UnitId,
        burst_secs: f64,
    },
    StopAutoFire { weapon: WeaponId },
    DropCountermeasure { kind: CountermeasureKind },
    Jammer { enabled: bool },
    Cloak { enabled: bool },
    /// Ask the pilot to extend away from an expected detonation point.
    Extend { away_from: Position },
    Ram { target: UnitId },
}
