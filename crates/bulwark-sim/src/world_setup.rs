//! Entity spawn factories.
//!
//! Units carry the full controller bundle; missiles in flight carry only
//! what the target registry needs to see them.

use hecs::Entity;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use bulwark_core::config::GuardConfig;
use bulwark_core::enums::{FuzeType, TargetingMode};
use bulwark_core::records::{MissileInfo, SensorFit, UnitBody};
use bulwark_core::types::{Position, TeamId, UnitId, Velocity};
use bulwark_core::weapons::{Ammo, Gun, Loadout, Missile, Mount, RangeEnvelope, Weapon};

use crate::components::{GpsDatabase, TeamTag, Unit};
use crate::context::SimulationContext;
use crate::controller::EngagementController;
use crate::countermeasures::ThreatResponder;
use crate::error::{Result, SimError};

/// Everything needed to put a combat unit into the world.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSpec {
    /// Explicit id; the engine assigns the next free one when absent.
    pub id: Option<UnitId>,
    pub team: TeamId,
    pub body: UnitBody,
    pub loadout: Vec<Weapon>,
    pub sensors: SensorFit,
    pub config: GuardConfig,
    /// Switch guard mode on at spawn.
    pub guard: bool,
    pub gps_points: Vec<Position>,
}

/// A missile in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissileSpec {
    #[serde(default)]
    pub id: Option<UnitId>,
    pub team: TeamId,
    pub body: UnitBody,
    pub info: MissileInfo,
}

fn claim(ctx: &SimulationContext, id: UnitId) -> Result<()> {
    if ctx.index.contains_key(&id) {
        return Err(SimError::DuplicateUnit(id));
    }
    Ok(())
}

/// Spawn a combat unit with its engagement controller and threat responder.
pub fn spawn_unit(ctx: &mut SimulationContext, id: UnitId, spec: UnitSpec) -> Result<Entity> {
    claim(ctx, id)?;
    spec.config.validate()?;
    let entity = ctx.world.spawn((
        Unit { id },
        TeamTag(spec.team),
        spec.body,
        Loadout::new(spec.loadout),
        spec.sensors,
        GpsDatabase {
            points: spec.gps_points,
        },
        ThreatResponder::default(),
        EngagementController::new(spec.config),
    ));
    ctx.index.insert(id, entity);
    Ok(entity)
}

pub fn spawn_missile(ctx: &mut SimulationContext, id: UnitId, spec: MissileSpec) -> Result<Entity> {
    claim(ctx, id)?;
    let mut body = spec.body;
    body.flying = true;
    body.surface = false;
    let entity = ctx
        .world
        .spawn((Unit { id }, TeamTag(spec.team), body, spec.info));
    ctx.index.insert(id, entity);
    Ok(entity)
}

/// Two opposing flights of `per_team` fighters at random positions, all
/// with guard mode on.
pub fn random_skirmish(rng: &mut ChaCha8Rng, per_team: usize) -> Vec<UnitSpec> {
    let mut specs = Vec::with_capacity(per_team * 2);
    for team in [TeamId(1), TeamId(2)] {
        // Team 1 starts south heading north, team 2 the reverse.
        let (base_y, heading) = if team == TeamId(1) {
            (-8_000.0, 1.0)
        } else {
            (8_000.0, -1.0)
        };
        for _ in 0..per_team {
            let x = rng.gen_range(-4_000.0..4_000.0);
            let y = base_y + rng.gen_range(-1_000.0..1_000.0);
            let z = rng.gen_range(2_000.0..6_000.0);
            let speed = rng.gen_range(180.0..260.0);
            let body = UnitBody {
                position: Position::new(x, y, z),
                velocity: Velocity::new(0.0, heading * speed, 0.0),
                forward: glam::DVec3::new(0.0, heading, 0.0),
                mass: rng.gen_range(8.0..20.0),
                radius: 6.0,
                flying: true,
                surface: false,
                ..Default::default()
            };
            let missiles = rng.gen_range(2..=4);
            specs.push(UnitSpec {
                team,
                body,
                loadout: fighter_loadout(missiles),
                sensors: SensorFit {
                    radar: true,
                    rwr: true,
                    flares: true,
                    chaff: true,
                    ..Default::default()
                },
                guard: true,
                ..Default::default()
            });
        }
    }
    specs
}

fn fighter_loadout(missiles: u32) -> Vec<Weapon> {
    let gun = Weapon::Gun(Gun {
        mount: Mount {
            name: "cannon".into(),
            envelope: Some(RangeEnvelope {
                min: 0.0,
                max: 1_500.0,
            }),
            turret: None,
            ammo: Ammo::Rounds(600),
            ..Default::default()
        },
        rpm: 1_200.0,
        caliber_mm: 20.0,
        bullet_mass_kg: 0.1,
        muzzle_velocity: 1_000.0,
        fuze: FuzeType::Impact,
        projectiles_per_shot: 1,
        submunitions: 0,
    });
    let missile = |seeker: TargetingMode| {
        Weapon::Missile(Missile {
            mount: Mount {
                name: format!("{seeker:?} aam").to_lowercase(),
                envelope: Some(RangeEnvelope {
                    min: 500.0,
                    max: 12_000.0,
                }),
                ammo: Ammo::Rounds(1),
                ..Default::default()
            },
            targeting: seeker,
            speed: 900.0,
            max_turn_rate: 30.0,
            blast_radius: 15.0,
            max_off_boresight_deg: 45.0,
            ..Default::default()
        })
    };
    let mut loadout = vec![gun];
    for i in 0..missiles {
        let seeker = if i % 2 == 0 {
            TargetingMode::Radar
        } else {
            TargetingMode::Heat
        };
        loadout.push(missile(seeker));
    }
    loadout
}
