//! Direct-fire choreography for guns, rockets and lasers: sensor-assisted aim,
//! then hand-off to continuous auto-fire.

use bulwark_core::commands::ActuatorCommand;
use bulwark_core::constants::{
    POD_SLAVE_TOLERANCE, TURRET_ASSIGN_TOLERANCE_DEG, TURRET_RADAR_SETTLE_SECS,
};
use bulwark_core::types::{UnitId, WeaponId};
use bulwark_core::weapons::WeaponCapability;
use bulwark_doctrine::envelope::off_axis_deg;

use super::{open_bays, Abort, ChoreoEnv, Outcome, Step};
use crate::outbox::Outbox;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Deploy,
    Aim,
    /// Waiting for the targeting pod to slew onto a surface target.
    PodSlew,
    /// Waiting for a radar lock to settle.
    RadarSettle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurretRun {
    stage: Stage,
    bays_open: bool,
    auto_firing: Vec<WeaponId>,
}

impl Default for TurretRun {
    fn default() -> Self {
        Self::new()
    }
}

impl TurretRun {
    pub fn new() -> Self {
        Self {
            stage: Stage::Deploy,
            bays_open: false,
            auto_firing: Vec::new(),
        }
    }

    pub fn bays_open(&self) -> bool {
        self.bays_open
    }

    /// Weapons handed to auto-fire.
    pub fn auto_firing(&self) -> &[WeaponId] {
        &self.auto_firing
    }

    pub fn resume(&mut self, env: &ChoreoEnv, out: &mut Outbox) -> Step<Outcome> {
        loop {
            match self.stage {
                Stage::Deploy => {
                    self.stage = Stage::Aim;
                    if let Some(until) = open_bays(env, out, &mut self.bays_open) {
                        return Step::Suspended { until };
                    }
                }
                Stage::Aim => {
                    let target = env.target;
                    let surface = target.body.surface && !target.body.flying;
                    if surface && env.sensors.targeting_pod {
                        if pod_on_target(env) {
                            out.send(ActuatorCommand::PodLockCom);
                            return self.hand_off(env, out);
                        }
                        out.send(ActuatorCommand::SlewPod {
                            point: target.position(),
                        });
                        self.stage = Stage::PodSlew;
                        return Step::Continue;
                    }
                    if !surface && env.sensors.radar && env.feedback.radar_lock != Some(target.id) {
                        out.send(ActuatorCommand::LockRadar { target: target.id });
                        self.stage = Stage::RadarSettle;
                        return Step::Suspended {
                            until: env.now + TURRET_RADAR_SETTLE_SECS,
                        };
                    }
                    return self.hand_off(env, out);
                }
                Stage::PodSlew => {
                    if pod_on_target(env) {
                        out.send(ActuatorCommand::PodLockCom);
                        return self.hand_off(env, out);
                    }
                    return self.fallback(env, out);
                }
                Stage::RadarSettle => {
                    if env.feedback.radar_lock == Some(env.target.id) {
                        return self.hand_off(env, out);
                    }
                    return self.fallback(env, out);
                }
            }
        }
    }

    /// Sensors could not help. Fire visually inside guard range, otherwise give up.
    fn fallback(&mut self, env: &ChoreoEnv, out: &mut Outbox) -> Step<Outcome> {
        if env.distance() > env.config.guard_range {
            return Step::Done(Outcome::Aborted(Abort::OutOfRange));
        }
        self.hand_off(env, out)
    }

    fn hand_off(&mut self, env: &ChoreoEnv, out: &mut Outbox) -> Step<Outcome> {
        let burst_secs = env.config.burst_secs();
        let infinite = env.config.infinite_ammo;
        let name = env.weapon.short_name();

        let mut candidates: Vec<UnitId> = vec![env.target.id];
        for &id in env.secondaries {
            if !candidates.contains(&id) {
                candidates.push(id);
            }
        }

        let mut cursor = 0usize;
        self.auto_firing.clear();
        for (id, weapon) in env.loadout.iter() {
            let mount = weapon.mount();
            if !(infinite || mount.ammo.available()) {
                continue;
            }
            if weapon.short_name() != name {
                // Other turrets follow the guard target.
                if mount.is_turret() {
                    out.send(ActuatorCommand::SlewTurret {
                        weapon: id,
                        point: env.target.position(),
                    });
                }
                continue;
            }
            let target = match mount.turret {
                Some(turret) if candidates.len() > 1 => {
                    let in_arc = |t: &UnitId| {
                        env.registry.record(*t).is_some_and(|r| {
                            off_axis_deg(env.body, &r.position())
                                <= turret.max_off_axis_deg + TURRET_ASSIGN_TOLERANCE_DEG
                        })
                    };
                    let preferred = candidates[cursor % candidates.len()];
                    cursor += 1;
                    if in_arc(&preferred) {
                        preferred
                    } else {
                        candidates
                            .iter()
                            .copied()
                            .find(|t| in_arc(t))
                            .unwrap_or(env.target.id)
                    }
                }
                _ => env.target.id,
            };
            out.send(ActuatorCommand::AutoFire {
                weapon: id,
                target,
                burst_secs,
            });
            self.auto_firing.push(id);
        }
        tracing::debug!(
            unit = env.unit.0,
            target = env.target.id.0,
            weapons = self.auto_firing.len(),
            "auto-fire handed off"
        );
        Step::Done(Outcome::HandedOff)
    }
}

fn pod_on_target(env: &ChoreoEnv) -> bool {
    env.feedback
        .pod_point
        .is_some_and(|p| p.range_to(&env.target.position()) < POD_SLAVE_TOLERANCE)
}
