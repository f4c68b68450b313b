//! Weapon inventory: the weapon sum type, its capability trait, and the
//! per-unit loadout index.
//!
//! Each weapon kind carries its own data; the shared [`Mount`] holds what every
//! kind has in common (name, part, priority tag, range, turret, readiness).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::error::{CoreError, Result};
use crate::types::{PartId, WeaponId};

/// Configured engagement range window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeEnvelope {
    pub min: f64,
    pub max: f64,
}

/// Turret traverse limit, expressed as the maximum angle off the unit's nose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Turret {
    pub max_off_axis_deg: f64,
}

impl Default for Turret {
    fn default() -> Self {
        Self {
            max_off_axis_deg: 180.0,
        }
    }
}

/// Remaining ammunition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ammo {
    /// Powered from the unit's electrical supply.
    Unlimited,
    Rounds(u32),
}

impl Default for Ammo {
    fn default() -> Self {
        Ammo::Rounds(0)
    }
}

impl Ammo {
    pub fn available(self) -> bool {
        match self {
            Ammo::Unlimited => true,
            Ammo::Rounds(n) => n > 0,
        }
    }
}

/// Readiness flags owned by the weapon's own fire/reload logic. Read-only here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Readiness {
    pub overheated: bool,
    pub reloading: bool,
    pub crewed: bool,
    /// Whether the weapon can fire again within the next scan cycle.
    pub ready_soon: bool,
}

impl Default for Readiness {
    fn default() -> Self {
        Self {
            overheated: false,
            reloading: false,
            crewed: true,
            ready_soon: true,
        }
    }
}

/// Attributes shared by every weapon kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mount {
    pub name: String,
    pub part: PartId,
    /// Priority tag. A higher tag always wins weapon selection.
    pub priority: i32,
    /// `None` means the weapon has no configured engagement range.
    pub envelope: Option<RangeEnvelope>,
    pub turret: Option<Turret>,
    /// Housed behind bay doors or on a deployable rail.
    pub bay: bool,
    pub ammo: Ammo,
    pub readiness: Readiness,
}

impl Mount {
    pub fn min_range(&self) -> f64 {
        self.envelope.map_or(0.0, |e| e.min)
    }

    pub fn max_range(&self) -> Option<f64> {
        self.envelope.map(|e| e.max)
    }

    pub fn is_turret(&self) -> bool {
        self.turret.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gun {
    pub mount: Mount,
    pub rpm: f64,
    pub caliber_mm: f64,
    pub bullet_mass_kg: f64,
    pub muzzle_velocity: f64,
    pub fuze: FuzeType,
    pub projectiles_per_shot: u32,
    /// Submunitions per round for cannister shot.
    pub submunitions: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rocket {
    pub mount: Mount,
    pub rpm: f64,
    pub thrust_accel: f64,
    pub thrust_time: f64,
    pub blast_radius: f64,
    pub fuze: FuzeType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Laser {
    pub mount: Mount,
    pub rpm: f64,
    pub damage: f64,
    /// Electromagnetic weapon that drains charge instead of dealing damage.
    pub electro: bool,
    pub charge_per_shot: f64,
    pub pulsed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Missile {
    pub mount: Mount,
    pub targeting: TargetingMode,
    pub guidance: GuidanceMode,
    pub thrust: f64,
    /// Mean flight speed, used for lead computation.
    pub speed: f64,
    pub max_turn_rate: f64,
    pub proximity_radius: f64,
    pub blast_radius: f64,
    pub yield_kg: f64,
    /// Seeker field of regard.
    pub max_off_boresight_deg: f64,
    pub all_aspect: bool,
    pub min_launch_speed: f64,
    /// Electromagnetic-pulse warhead.
    pub emp: bool,
    /// Seeker can use a radar lock to uncage onto the target.
    pub uncaged_lock: bool,
}

impl Default for Missile {
    fn default() -> Self {
        Self {
            mount: Mount::default(),
            targeting: TargetingMode::default(),
            guidance: GuidanceMode::default(),
            thrust: 0.0,
            speed: 0.0,
            max_turn_rate: 0.0,
            proximity_radius: 0.0,
            blast_radius: 0.0,
            yield_kg: 0.0,
            max_off_boresight_deg: 360.0,
            all_aspect: false,
            min_launch_speed: 0.0,
            emp: false,
            uncaged_lock: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bomb {
    pub mount: Mount,
    pub yield_kg: f64,
    pub blast_radius: f64,
    /// Coordinate-guided bomb.
    pub guided: bool,
    pub cluster: u32,
    /// Release rate when rippling a stick of bombs.
    pub ripple_rpm: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Slw {
    pub mount: Mount,
    pub kind: SlwKind,
    pub yield_kg: f64,
    pub blast_radius: f64,
    pub drop_time: f64,
}

/// A weapon mounted on a combat unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum Weapon {
    Gun(Gun),
    Rocket(Rocket),
    DefenseLaser(Laser),
    Missile(Missile),
    Bomb(Bomb),
    Slw(Slw),
}

/// Behaviour shared by every weapon kind.
pub trait WeaponCapability {
    fn class(&self) -> WeaponClass;
    fn short_name(&self) -> &str;
    fn part(&self) -> PartId;
}

impl Weapon {
    pub fn mount(&self) -> &Mount {
        match self {
            Weapon::Gun(w) => &w.mount,
            Weapon::Rocket(w) => &w.mount,
            Weapon::DefenseLaser(w) => &w.mount,
            Weapon::Missile(w) => &w.mount,
            Weapon::Bomb(w) => &w.mount,
            Weapon::Slw(w) => &w.mount,
        }
    }

    pub fn mount_mut(&mut self) -> &mut Mount {
        match self {
            Weapon::Gun(w) => &mut w.mount,
            Weapon::Rocket(w) => &mut w.mount,
            Weapon::DefenseLaser(w) => &mut w.mount,
            Weapon::Missile(w) => &mut w.mount,
            Weapon::Bomb(w) => &mut w.mount,
            Weapon::Slw(w) => &mut w.mount,
        }
    }

    /// Seeker type, `None` for unguided classes.
    pub fn targeting(&self) -> TargetingMode {
        match self {
            Weapon::Missile(m) => m.targeting,
            Weapon::Bomb(b) if b.guided => TargetingMode::Gps,
            _ => TargetingMode::None,
        }
    }

    pub fn blast_radius(&self) -> f64 {
        match self {
            Weapon::Rocket(w) => w.blast_radius,
            Weapon::Missile(w) => w.blast_radius,
            Weapon::Bomb(w) => w.blast_radius,
            Weapon::Slw(w) => w.blast_radius,
            Weapon::Gun(_) | Weapon::DefenseLaser(_) => 0.0,
        }
    }

    /// Weapons that leave the unit and count toward missiles-on-target.
    pub fn is_expendable(&self) -> bool {
        matches!(self, Weapon::Missile(_) | Weapon::Bomb(_) | Weapon::Slw(_))
    }
}

impl WeaponCapability for Weapon {
    fn class(&self) -> WeaponClass {
        match self {
            Weapon::Gun(_) => WeaponClass::Gun,
            Weapon::Rocket(_) => WeaponClass::Rocket,
            Weapon::DefenseLaser(_) => WeaponClass::DefenseLaser,
            Weapon::Missile(_) => WeaponClass::Missile,
            Weapon::Bomb(_) => WeaponClass::Bomb,
            Weapon::Slw(_) => WeaponClass::Slw,
        }
    }

    fn short_name(&self) -> &str {
        &self.mount().name
    }

    fn part(&self) -> PartId {
        self.mount().part
    }
}

/// One loadout entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponSlot {
    pub id: WeaponId,
    pub weapon: Weapon,
}

/// The per-unit weapon index. Ids stay stable across structural changes; the
/// class index is rebuilt whenever a part is added or removed.
#[derive(Debug, Clone, Default)]
pub struct Loadout {
    slots: Vec<WeaponSlot>,
    by_class: HashMap<WeaponClass, Vec<usize>>,
    next_id: u32,
}

impl Loadout {
    pub fn new(weapons: impl IntoIterator<Item = Weapon>) -> Self {
        let mut loadout = Self::default();
        for weapon in weapons {
            loadout.push(weapon);
        }
        loadout.reindex();
        loadout
    }

    /// Decode a JSON array of weapons. Entries with an unknown `class` tag are
    /// a configuration error.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let mut weapons = Vec::with_capacity(entries.len());
        for entry in entries {
            let tag = entry
                .get("class")
                .and_then(|c| c.as_str())
                .ok_or(CoreError::MissingWeaponClass)?;
            tag.parse::<WeaponClass>()?;
            weapons.push(serde_json::from_value::<Weapon>(entry)?);
        }
        Ok(Self::new(weapons))
    }

    /// Add a weapon (part attached). Returns its id.
    pub fn add(&mut self, weapon: Weapon) -> WeaponId {
        let id = self.push(weapon);
        self.reindex();
        id
    }

    /// Remove a weapon (part detached).
    pub fn remove(&mut self, id: WeaponId) -> Option<Weapon> {
        let idx = self.slots.iter().position(|s| s.id == id)?;
        let slot = self.slots.remove(idx);
        self.reindex();
        Some(slot.weapon)
    }

    pub fn get(&self, id: WeaponId) -> Option<&Weapon> {
        self.slots.iter().find(|s| s.id == id).map(|s| &s.weapon)
    }

    pub fn get_mut(&mut self, id: WeaponId) -> Option<&mut Weapon> {
        self.slots
            .iter_mut()
            .find(|s| s.id == id)
            .map(|s| &mut s.weapon)
    }

    pub fn slots(&self) -> &[WeaponSlot] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = (WeaponId, &Weapon)> {
        self.slots.iter().map(|s| (s.id, &s.weapon))
    }

    /// Weapons of a single class, in loadout order.
    pub fn of_class(&self, class: WeaponClass) -> impl Iterator<Item = (WeaponId, &Weapon)> {
        self.by_class
            .get(&class)
            .into_iter()
            .flatten()
            .map(|&i| (self.slots[i].id, &self.slots[i].weapon))
    }

    /// Weapons sharing a short name (same weapon group).
    pub fn group<'a>(&'a self, name: &'a str) -> impl Iterator<Item = (WeaponId, &'a Weapon)> {
        self.iter().filter(move |(_, w)| w.short_name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether any weapon still has something to shoot.
    pub fn has_ammo(&self, infinite_ammo: bool) -> bool {
        self.slots
            .iter()
            .any(|s| infinite_ammo || s.weapon.mount().ammo.available())
    }

    fn push(&mut self, weapon: Weapon) -> WeaponId {
        let id = WeaponId(self.next_id);
        self.next_id += 1;
        self.slots.push(WeaponSlot { id, weapon });
        id
    }

    fn reindex(&mut self) {
        self.by_class.clear();
        for (i, slot) in self.slots.iter().enumerate() {
            self.by_class.entry(slot.weapon.class()).or_default().push(i);
        }
    }
}
