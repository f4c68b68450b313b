//! Weapon candidate scorer.
//!
//! For one target, walks the loadout once and keeps the best usable candidate
//! so far. Comparison is greedy and single-pass: a strictly higher priority tag
//! always wins, then the category's class preference, then the numeric score.
//! Ties keep the earlier candidate.

use bulwark_core::constants::{EMITTER_TOLERANCE, STATIONARY_SPEED};
use bulwark_core::enums::{
    FuzeType, GuidanceMode, SensorKind, SlwKind, TargetCategory, TargetingMode, WeaponClass,
};
use bulwark_core::types::{Position, WeaponId};
use bulwark_core::weapons::{Gun, Laser, Loadout, Weapon, WeaponCapability};

use crate::envelope::{can_engage, in_firing_cone, EnvelopeContext};

const AIR_MISSILE_RANK: u8 = 2;

/// Inputs beyond the envelope that weapon choice depends on.
pub struct ScoringContext<'a> {
    pub envelope: EnvelopeContext<'a>,
    pub gun_range: f64,
    /// This unit's missiles already in flight at the target.
    pub missiles_away: u32,
    pub max_missiles: u32,
    /// A targeting pod is fitted and can designate.
    pub pod_active: bool,
    pub rwr_emitters: &'a [Position],
}

/// Result of a successful weapon selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponChoice {
    pub weapon: WeaponId,
    pub class: WeaponClass,
    pub score: f64,
    pub enable_sensor: Option<SensorKind>,
}

#[derive(Debug, Clone, Copy)]
struct Pick {
    id: WeaponId,
    class: WeaponClass,
    priority: i32,
    rank: u8,
    score: f64,
    accel: f64,
    sensor: Option<SensorKind>,
}

#[derive(Default)]
struct Selector {
    best: Option<Pick>,
}

impl Selector {
    fn offer(&mut self, pick: Pick) {
        let better = match &self.best {
            None => true,
            Some(best) => {
                pick.priority > best.priority
                    || (pick.priority == best.priority
                        && (pick.rank > best.rank
                            || (pick.rank == best.rank && pick.score > best.score)))
            }
        };
        if better {
            self.best = Some(pick);
        }
    }

    fn has_pick(&self) -> bool {
        self.best.is_some()
    }

    /// Acceleration of the rocket picked so far, if any.
    fn rocket_accel(&self) -> Option<f64> {
        self.best
            .filter(|b| b.class == WeaponClass::Rocket)
            .map(|b| b.accel)
    }

    /// A missile preferred over direct fire has already been picked.
    fn missile_with_tdps(&self) -> bool {
        self.best.is_some_and(|b| {
            b.class == WeaponClass::Missile && b.rank >= AIR_MISSILE_RANK && b.score > 0.0
        })
    }
}

/// Pick the best usable weapon against the target in `ctx`. `None` is the
/// normal "nothing to shoot with" outcome.
pub fn select_weapon(loadout: &Loadout, ctx: &ScoringContext) -> Option<WeaponChoice> {
    let mut selector = Selector::default();
    match ctx.envelope.target.category() {
        TargetCategory::Missile => score_vs_missile(loadout, ctx, &mut selector),
        TargetCategory::Airborne => score_vs_air(loadout, ctx, &mut selector),
        TargetCategory::Surface => score_vs_surface(loadout, ctx, &mut selector),
        TargetCategory::Underwater => score_vs_underwater(loadout, ctx, &mut selector),
    }
    selector.best.map(|best| WeaponChoice {
        weapon: best.id,
        class: best.class,
        score: best.score,
        enable_sensor: best.sensor,
    })
}

/// Envelope gate. `None` when unusable, otherwise the sensor to switch on.
fn usable(weapon: &Weapon, ctx: &ScoringContext) -> Option<Option<SensorKind>> {
    let verdict = can_engage(weapon, &ctx.envelope);
    verdict.usable.then_some(verdict.enable_sensor)
}

fn pick(id: WeaponId, weapon: &Weapon, rank: u8, score: f64, sensor: Option<SensorKind>) -> Pick {
    Pick {
        id,
        class: weapon.class(),
        priority: weapon.mount().priority,
        rank,
        score,
        accel: match weapon {
            Weapon::Rocket(r) => r.thrust_accel,
            _ => 0.0,
        },
        sensor,
    }
}

fn below_min_range(weapon: &Weapon, ctx: &ScoringContext) -> bool {
    ctx.envelope.distance < weapon.mount().min_range()
}

fn at_missile_cap(ctx: &ScoringContext) -> bool {
    ctx.missiles_away >= ctx.max_missiles
}

fn laser_power(laser: &Laser, ctx: &ScoringContext) -> f64 {
    let power = if laser.electro {
        laser.charge_per_shot
    } else {
        laser.damage
    };
    if laser.pulsed {
        power * ctx.envelope.tuning.pulsed_laser_factor
    } else {
        power
    }
}

fn cannister_factor(gun: &Gun) -> f64 {
    let mut factor = 1.0;
    if gun.projectiles_per_shot > 1 {
        factor *= 1.0 + f64::from(gun.projectiles_per_shot) / 2.0 / 100.0;
    }
    if gun.submunitions > 1 {
        factor *= 1.0 + f64::from(gun.submunitions) / 2.0 / 100.0;
    }
    factor
}

fn score_vs_missile(loadout: &Loadout, ctx: &ScoringContext, selector: &mut Selector) {
    let tuning = ctx.envelope.tuning;
    let target = ctx.envelope.target;
    for (id, weapon) in loadout.iter() {
        let Some(sensor) = usable(weapon, ctx) else {
            continue;
        };
        let penalty = if below_min_range(weapon, ctx) {
            tuning.min_range_penalty
        } else {
            1.0
        };
        match weapon {
            Weapon::DefenseLaser(laser) => {
                if laser.electro || ctx.envelope.shooter.underwater {
                    continue;
                }
                let score = laser.rpm * laser_power(laser, ctx) * penalty;
                selector.offer(pick(id, weapon, 3, score, sensor));
            }
            Weapon::Gun(gun) => {
                let mut score = gun.rpm * cannister_factor(gun) * penalty;
                if gun.mount.is_turret() {
                    score *= tuning.anti_missile_turret_bonus;
                }
                if gun.fuze.is_airburst() {
                    score *= tuning.fuze_bonus;
                }
                selector.offer(pick(id, weapon, 2, score, sensor));
            }
            Weapon::Rocket(rocket) => {
                let mut score = rocket.rpm / 2.0 * penalty;
                if rocket.mount.is_turret() {
                    score *= tuning.anti_missile_turret_bonus;
                }
                if selector
                    .rocket_accel()
                    .is_some_and(|accel| rocket.thrust_accel > accel)
                {
                    score *= tuning.rocket_accel_bonus;
                }
                if rocket.fuze != FuzeType::Proximity {
                    score *= tuning.contact_fuze_rocket_penalty;
                }
                selector.offer(pick(id, weapon, 2, score, sensor));
            }
            Weapon::Missile(missile) => {
                if at_missile_cap(ctx) || (missile.emp && target.body.debilitated) {
                    continue;
                }
                let tdps = missile.thrust + missile.max_turn_rate;
                selector.offer(pick(id, weapon, 1, tdps, sensor));
            }
            Weapon::Bomb(_) | Weapon::Slw(_) => {}
        }
    }
}

fn score_vs_air(loadout: &Loadout, ctx: &ScoringContext, selector: &mut Selector) {
    let tuning = ctx.envelope.tuning;
    let shooter = ctx.envelope.shooter;
    let target = ctx.envelope.target;
    let target_pos = target.position();
    for (id, weapon) in loadout.iter() {
        let Some(sensor) = usable(weapon, ctx) else {
            continue;
        };
        let mount = weapon.mount();
        let turret = if mount.is_turret() {
            tuning.turret_bonus
        } else {
            1.0
        };
        let min_penalty = if below_min_range(weapon, ctx) {
            tuning.min_range_penalty
        } else {
            1.0
        };
        let cone_penalty = if in_firing_cone(mount, shooter, &target_pos, tuning) {
            1.0
        } else {
            tuning.fire_cone_penalty
        };
        match weapon {
            Weapon::Rocket(rocket) => {
                if selector.missile_with_tdps() {
                    continue;
                }
                let mut score = rocket.rpm * turret;
                if selector
                    .rocket_accel()
                    .is_some_and(|accel| rocket.thrust_accel > accel)
                {
                    score *= tuning.rocket_accel_bonus;
                }
                score *= if rocket.fuze == FuzeType::Proximity {
                    tuning.fuze_bonus
                } else {
                    tuning.unfuzed_rocket_factor
                };
                score *= cone_penalty * min_penalty / 2.0;
                selector.offer(pick(id, weapon, 1, score, sensor));
            }
            Weapon::Gun(gun) => {
                if selector.missile_with_tdps() {
                    continue;
                }
                let fuze = if gun.fuze.is_airburst() {
                    tuning.fuze_bonus
                } else {
                    1.0
                };
                let base = if target.body.radius > tuning.large_target_radius {
                    gun.caliber_mm * 10.0
                } else {
                    gun.rpm * cannister_factor(gun)
                };
                let score = base * turret * fuze * cone_penalty * min_penalty;
                selector.offer(pick(id, weapon, 1, score, sensor));
            }
            Weapon::DefenseLaser(laser) => {
                if laser.electro && target.body.debilitated {
                    continue;
                }
                let penalty = if below_min_range(weapon, ctx) {
                    tuning.laser_min_range_penalty
                } else {
                    1.0
                };
                let score = laser.rpm * laser_power(laser, ctx) * turret * penalty;
                selector.offer(pick(id, weapon, 1, score, sensor));
            }
            Weapon::Missile(missile) => {
                if at_missile_cap(ctx) || (missile.emp && target.body.debilitated) {
                    continue;
                }
                let mut tdps = missile.max_turn_rate + missile.proximity_radius;
                if below_min_range(weapon, ctx) {
                    tdps = -tdps;
                }
                // Surface shooters keep guns for close air targets.
                let rank = if shooter.flying || ctx.envelope.distance > ctx.gun_range {
                    AIR_MISSILE_RANK
                } else {
                    0
                };
                selector.offer(pick(id, weapon, rank, tdps, sensor));
            }
            Weapon::Bomb(_) | Weapon::Slw(_) => {}
        }
    }
}

fn score_vs_surface(loadout: &Loadout, ctx: &ScoringContext, selector: &mut Selector) {
    let tuning = ctx.envelope.tuning;
    let shooter = ctx.envelope.shooter;
    let target = ctx.envelope.target;
    let distance = ctx.envelope.distance;
    let stationary = target.velocity().speed() < STATIONARY_SPEED;
    let target_pos = target.position();

    for (id, weapon) in loadout.iter() {
        let Some(sensor) = usable(weapon, ctx) else {
            continue;
        };
        let blast = weapon.blast_radius();
        match weapon {
            Weapon::Missile(missile) => {
                if shooter.underwater
                    || at_missile_cap(ctx)
                    || (missile.emp && target.body.debilitated)
                {
                    continue;
                }
                let ground_attack = matches!(
                    missile.guidance,
                    GuidanceMode::AirToGround
                        | GuidanceMode::Ballistic
                        | GuidanceMode::Cruise
                        | GuidanceMode::Unguided
                );
                let rank = match missile.targeting {
                    TargetingMode::AntiRad => {
                        let emitting = ctx
                            .rwr_emitters
                            .iter()
                            .any(|e| e.range_to(&target_pos) <= EMITTER_TOLERANCE);
                        if !emitting {
                            continue;
                        }
                        8
                    }
                    TargetingMode::Laser => {
                        if !ctx.pod_active {
                            continue;
                        }
                        6
                    }
                    TargetingMode::Gps | TargetingMode::None if stationary && ground_attack => 7,
                    _ if ground_attack => 6,
                    // Any other usable missile still beats the laser.
                    _ => 1,
                };
                selector.offer(pick(id, weapon, rank, missile.yield_kg, sensor));
            }
            Weapon::Bomb(bomb) => {
                if shooter.underwater || at_missile_cap(ctx) || distance < blast {
                    continue;
                }
                let mut score = bomb.yield_kg;
                if !stationary {
                    score *= tuning.moving_target_yield_factor;
                }
                if bomb.guided {
                    score *= tuning.guided_bomb_factor;
                }
                selector.offer(pick(id, weapon, 5, score, sensor));
            }
            Weapon::Slw(slw) => {
                let launchable = slw.drop_time > 0.0 || !shooter.flying;
                if slw.kind != SlwKind::Torpedo
                    || !launchable
                    || at_missile_cap(ctx)
                    || distance < blast
                {
                    continue;
                }
                selector.offer(pick(id, weapon, 5, slw.yield_kg, sensor));
            }
            Weapon::Rocket(rocket) => {
                if shooter.underwater
                    && distance > rocket.thrust_time * tuning.underwater_rocket_reach_per_thrust_sec
                {
                    continue;
                }
                if distance < blast {
                    continue;
                }
                selector.offer(pick(id, weapon, 4, blast, sensor));
            }
            Weapon::Gun(gun) => {
                if distance > ctx.gun_range && selector.has_pick() {
                    continue;
                }
                let mut score = if target.body.radius > tuning.heavy_ground_target_radius {
                    gun.bullet_mass_kg * gun.muzzle_velocity * gun.rpm
                } else {
                    gun.caliber_mm
                };
                if gun.mount.is_turret() {
                    score *= tuning.turret_bonus;
                }
                if below_min_range(weapon, ctx) {
                    score *= tuning.min_range_penalty;
                }
                selector.offer(pick(id, weapon, 3, score, sensor));
            }
            Weapon::DefenseLaser(laser) => {
                if laser.electro && target.body.debilitated {
                    continue;
                }
                let mut score = laser.rpm * laser_power(laser, ctx);
                if below_min_range(weapon, ctx) {
                    score *= tuning.laser_min_range_penalty;
                }
                selector.offer(pick(id, weapon, 0, score, sensor));
            }
        }
    }
}

fn score_vs_underwater(loadout: &Loadout, ctx: &ScoringContext, selector: &mut Selector) {
    let tuning = ctx.envelope.tuning;
    let shooter = ctx.envelope.shooter;
    let target = ctx.envelope.target;
    let distance = ctx.envelope.distance;

    for (id, weapon) in loadout.iter() {
        let Some(sensor) = usable(weapon, ctx) else {
            continue;
        };
        let blast = weapon.blast_radius();
        match weapon {
            Weapon::Slw(slw) => {
                if distance < blast {
                    continue;
                }
                match slw.kind {
                    SlwKind::DepthCharge => {
                        let above = shooter.position.z >= target.position().z;
                        if shooter.underwater || !above {
                            continue;
                        }
                        selector.offer(pick(id, weapon, 4, slw.yield_kg, sensor));
                    }
                    SlwKind::Torpedo => {
                        if at_missile_cap(ctx) {
                            continue;
                        }
                        selector.offer(pick(id, weapon, 3, slw.yield_kg, sensor));
                    }
                }
            }
            Weapon::Rocket(rocket) => {
                let reach = rocket.thrust_time * tuning.underwater_rocket_reach_per_thrust_sec;
                if distance > reach || distance < blast {
                    continue;
                }
                selector.offer(pick(id, weapon, 2, blast, sensor));
            }
            Weapon::DefenseLaser(laser) => {
                let Some(max_range) = laser.mount.max_range() else {
                    continue;
                };
                if laser.electro || distance > max_range * tuning.underwater_laser_reach_fraction {
                    continue;
                }
                let score = laser.rpm * laser_power(laser, ctx);
                selector.offer(pick(id, weapon, 1, score, sensor));
            }
            Weapon::Gun(_) | Weapon::Missile(_) | Weapon::Bomb(_) => {}
        }
    }
}
