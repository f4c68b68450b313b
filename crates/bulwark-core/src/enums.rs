//! Enumeration types used throughout the engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Weapon family. Every weapon in a loadout belongs to exactly one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponClass {
    Gun,
    Rocket,
    DefenseLaser,
    Missile,
    Bomb,
    /// Submerged launch weapon: torpedoes and depth charges.
    Slw,
}

impl WeaponClass {
    /// Tag used in loadout files.
    pub fn tag(self) -> &'static str {
        match self {
            WeaponClass::Gun => "Gun",
            WeaponClass::Rocket => "Rocket",
            WeaponClass::DefenseLaser => "DefenseLaser",
            WeaponClass::Missile => "Missile",
            WeaponClass::Bomb => "Bomb",
            WeaponClass::Slw => "Slw",
        }
    }

    /// Classes whose firing is handed off to continuous auto-fire.
    pub fn is_direct_fire(self) -> bool {
        matches!(
            self,
            WeaponClass::Gun | WeaponClass::Rocket | WeaponClass::DefenseLaser
        )
    }
}

impl fmt::Display for WeaponClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for WeaponClass {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Gun" => Ok(WeaponClass::Gun),
            "Rocket" => Ok(WeaponClass::Rocket),
            "DefenseLaser" => Ok(WeaponClass::DefenseLaser),
            "Missile" => Ok(WeaponClass::Missile),
            "Bomb" => Ok(WeaponClass::Bomb),
            "Slw" => Ok(WeaponClass::Slw),
            other => Err(CoreError::UnknownWeaponClass(other.to_owned())),
        }
    }
}

/// Seeker type of a guided weapon, also used to classify incoming missiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetingMode {
    #[default]
    None,
    Radar,
    Heat,
    Laser,
    Gps,
    AntiRad,
}

/// Flight profile of a guided missile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuidanceMode {
    #[default]
    AirToAir,
    AirToGround,
    Ballistic,
    Cruise,
    Unguided,
}

/// Projectile fuze.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuzeType {
    #[default]
    Impact,
    Proximity,
    Timed,
    Flak,
}

impl FuzeType {
    /// Fuzes that detonate near the target rather than on contact.
    pub fn is_airburst(self) -> bool {
        matches!(self, FuzeType::Proximity | FuzeType::Timed | FuzeType::Flak)
    }
}

/// Submerged launch weapon variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlwKind {
    #[default]
    Torpedo,
    DepthCharge,
}

/// Target category used to choose the weapon scoring rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetCategory {
    Missile,
    Airborne,
    Surface,
    Underwater,
}

/// Strategy used to pick the primary vessel target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetStrategy {
    /// Free-for-all: closest target, biased toward the nose and the current target.
    ClosestWithBias,
    /// Weighted priority score.
    #[default]
    HighestPriority,
    /// Target with the fewest friendlies engaging it.
    LeastEngaged,
}

impl TargetStrategy {
    /// Score-driven strategies accept a target before a weapon is available.
    pub fn is_score_driven(self) -> bool {
        !matches!(self, TargetStrategy::LeastEngaged)
    }
}

/// Guard mode controller state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardState {
    #[default]
    Disarmed,
    Scanning,
    Engaging,
}

/// Expendable countermeasure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CountermeasureKind {
    Flare,
    Chaff,
}

/// Defensive subsystem driven by the threat response controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefenseSubsystem {
    Flares,
    Chaff,
    Jammer,
    Cloak,
    Salvo,
}

/// Onboard sensor that an engagement check or choreography may switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    Radar,
    Irst,
    Rwr,
    Sonar,
    TargetingPod,
}
