//! Engagement envelope: whether a weapon can currently be used on a target.
//!
//! A pure predicate. The only effect it may request is switching on the sensor
//! a guided weapon needs, returned in the [`Verdict`].

use bulwark_core::config::Tuning;
use bulwark_core::enums::{SensorKind, TargetingMode};
use bulwark_core::records::{SensorFit, TargetRecord, UnitBody};
use bulwark_core::types::{angle_between_deg, Position};
use bulwark_core::weapons::{Mount, Weapon};

use crate::guidance::Guidance;

/// Everything the envelope check reads.
pub struct EnvelopeContext<'a> {
    pub shooter: &'a UnitBody,
    pub target: &'a TargetRecord,
    pub distance: f64,
    pub sensors: &'a SensorFit,
    /// An anti-radiation missile is inbound on the shooter.
    pub antirad_threat: bool,
    pub infinite_ammo: bool,
    pub tuning: &'a Tuning,
    pub guidance: &'a dyn Guidance,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verdict {
    pub usable: bool,
    pub enable_sensor: Option<SensorKind>,
}

impl Verdict {
    fn usable(usable: bool) -> Self {
        Self {
            usable,
            enable_sensor: None,
        }
    }

    fn rejected() -> Self {
        Self::usable(false)
    }

    fn with_sensor(mut self, sensor: Option<SensorKind>) -> Self {
        self.enable_sensor = sensor;
        self
    }
}

/// Decide whether `weapon` can engage the target at `ctx.distance`.
pub fn can_engage(weapon: &Weapon, ctx: &EnvelopeContext) -> Verdict {
    let mount = weapon.mount();
    let Some(envelope) = mount.envelope else {
        return Verdict::usable(true);
    };
    if ctx.distance > envelope.max * ctx.tuning.lead_in_margin {
        return Verdict::rejected();
    }
    let has_ammo = ctx.infinite_ammo || mount.ammo.available();

    match weapon {
        Weapon::Gun(_) | Weapon::Rocket(_) | Weapon::DefenseLaser(_) => {
            if !turret_can_traverse(mount, ctx.shooter, &ctx.target.position(), ctx.tuning) {
                return Verdict::rejected();
            }
            let readiness = mount.readiness;
            if readiness.overheated || readiness.reloading || !readiness.crewed {
                return Verdict::rejected();
            }
            if matches!(weapon, Weapon::Gun(_)) && !readiness.ready_soon {
                return Verdict::rejected();
            }
            Verdict::usable(has_ammo)
        }
        Weapon::Missile(missile) => {
            if ctx.distance < envelope.min || !has_ammo {
                return Verdict::rejected();
            }
            let sensor = match missile.targeting {
                TargetingMode::Radar => {
                    // Illuminating would guide an anti-radiation missile home.
                    if !ctx.sensors.radar || ctx.antirad_threat {
                        return Verdict::rejected();
                    }
                    Some(SensorKind::Radar)
                }
                TargetingMode::AntiRad => {
                    if !ctx.sensors.rwr {
                        return Verdict::rejected();
                    }
                    Some(SensorKind::Rwr)
                }
                TargetingMode::Heat if ctx.sensors.irst => Some(SensorKind::Irst),
                _ => None,
            };
            if ctx.shooter.velocity.speed() < missile.min_launch_speed {
                return Verdict::rejected().with_sensor(sensor);
            }
            let zone = ctx
                .guidance
                .launch_zone(missile, ctx.shooter, &ctx.target.body);
            Verdict::usable(zone.contains(ctx.distance)).with_sensor(sensor)
        }
        Weapon::Bomb(_) => {
            if ctx.distance < envelope.min {
                return Verdict::rejected();
            }
            Verdict::usable(ctx.shooter.flying && has_ammo)
        }
        Weapon::Slw(_) => {
            if ctx.distance < envelope.min {
                return Verdict::rejected();
            }
            let sensor = ctx.sensors.sonar.then_some(SensorKind::Sonar);
            Verdict::usable(has_ammo).with_sensor(sensor)
        }
    }
}

/// Whether a turret can swing onto `point`. Fixed mounts rely on the unit
/// maneuvering and always pass.
pub fn turret_can_traverse(mount: &Mount, shooter: &UnitBody, point: &Position, tuning: &Tuning) -> bool {
    let Some(turret) = mount.turret else {
        return true;
    };
    let tolerance = if shooter.is_grounded() {
        tuning.turret_tolerance_grounded_deg
    } else {
        tuning.turret_tolerance_airborne_deg
    };
    off_axis_deg(shooter, point) <= turret.max_off_axis_deg + tolerance
}

/// Whether `point` is inside the weapon's firing cone: the turret arc for
/// turrets, a narrow cone around the nose for fixed mounts.
pub fn in_firing_cone(mount: &Mount, shooter: &UnitBody, point: &Position, tuning: &Tuning) -> bool {
    match mount.turret {
        Some(turret) => off_axis_deg(shooter, point) <= turret.max_off_axis_deg,
        None => off_axis_deg(shooter, point) <= tuning.fire_cone_deg,
    }
}

/// Angle between the shooter's nose and the direction to `point`.
pub fn off_axis_deg(shooter: &UnitBody, point: &Position) -> f64 {
    angle_between_deg(shooter.forward, shooter.position.offset_to(point))
}
