//! Guided and unguided launch choreographies for missiles and submerged
//! launch weapons. The seeker type picks the sequence.

use bulwark_core::commands::ActuatorCommand;
use bulwark_core::constants::{
    EMITTER_TOLERANCE, HEAT_LOCK_TOLERANCE, HEAT_SEEK_MIN_SECS, LASER_DESIGNATION_TOLERANCE,
    MISSILE_TURRET_TIMEOUT_SECS, RADAR_LOCK_RETRY_SECS, RADAR_LOCK_TIMEOUT_SECS,
};
use bulwark_core::enums::{SensorKind, TargetingMode};
use bulwark_core::types::Position;
use bulwark_core::weapons::{Missile, Weapon};
use bulwark_doctrine::launch::launch_authorized;
use tracing::{debug, info};

use super::{open_bays, Abort, ChoreoEnv, Outcome, Step};
use crate::outbox::Outbox;

/// Lower bound on the turret slew wait for heat and coordinate seekers.
const TURRET_AIM_MIN_SECS: f64 = 2.0;
/// Upper bound on the settle time of an uncaged radar-assisted lock.
const UNCAGED_SETTLE_MAX_SECS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Start,
    RadarLock { deadline: f64 },
    HeatSeek { deadline: f64 },
    /// Seeker search (anti-radiation emitter or laser spot).
    Search { deadline: f64 },
    TurretAim { deadline: f64 },
    Launch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissileRun {
    seeker: TargetingMode,
    stage: Stage,
    bays_open: bool,
}

impl MissileRun {
    pub fn new(seeker: TargetingMode) -> Self {
        Self {
            seeker,
            stage: Stage::Start,
            bays_open: false,
        }
    }

    pub fn seeker(&self) -> TargetingMode {
        self.seeker
    }

    pub fn bays_open(&self) -> bool {
        self.bays_open
    }

    pub fn resume(&mut self, env: &ChoreoEnv, out: &mut Outbox) -> Step<Outcome> {
        loop {
            match self.stage {
                Stage::Start => {
                    if let Some(step) = self.start(env, out) {
                        return step;
                    }
                }
                Stage::RadarLock { deadline } => {
                    if env.feedback.radar_lock == Some(env.target.id) {
                        self.stage = Stage::TurretAim {
                            deadline: env.now + MISSILE_TURRET_TIMEOUT_SECS,
                        };
                        continue;
                    }
                    if env.now >= deadline {
                        return abort(env, Abort::NoLock);
                    }
                    out.send(ActuatorCommand::LockRadar {
                        target: env.target.id,
                    });
                    return Step::Suspended {
                        until: env.now + RADAR_LOCK_RETRY_SECS,
                    };
                }
                Stage::HeatSeek { deadline } => {
                    if heat_locked(env) {
                        self.stage = Stage::TurretAim {
                            deadline: env.now + aim_window(env),
                        };
                        continue;
                    }
                    if env.now >= deadline {
                        self.stage = Stage::TurretAim {
                            deadline: env.now + aim_window(env),
                        };
                        if let Some(missile) = as_missile(env.weapon) {
                            let uncage = missile.uncaged_lock
                                && env.sensors.radar
                                && env.feedback.radar_lock != Some(env.target.id);
                            if uncage {
                                out.send(ActuatorCommand::LockRadar {
                                    target: env.target.id,
                                });
                                let settle = (env.config.scan_interval_secs * 0.25)
                                    .min(UNCAGED_SETTLE_MAX_SECS);
                                return Step::Suspended {
                                    until: env.now + settle,
                                };
                            }
                        }
                        continue;
                    }
                    slew_turret(env, out, env.target.position());
                    return Step::Continue;
                }
                Stage::Search { deadline } => {
                    if seeker_found(self.seeker, env) {
                        self.stage = Stage::TurretAim {
                            deadline: env.now + aim_window(env),
                        };
                        continue;
                    }
                    if env.now >= deadline {
                        return abort(env, Abort::NoLock);
                    }
                    slew_turret(env, out, env.target.position());
                    return Step::Continue;
                }
                Stage::TurretAim { deadline } => {
                    let turret = env.weapon.mount().is_turret();
                    if turret && !env.feedback.turret_aimed && env.now < deadline {
                        slew_turret(env, out, aim_point(env));
                        return Step::Continue;
                    }
                    self.stage = Stage::Launch;
                }
                Stage::Launch => return self.launch(env, out),
            }
        }
    }

    /// First resume: seeker preparation and bay doors. `None` moves straight on.
    fn start(&mut self, env: &ChoreoEnv, out: &mut Outbox) -> Option<Step<Outcome>> {
        match self.seeker {
            TargetingMode::Heat if env.feedback.radar_lock.is_some() => {
                out.send(ActuatorCommand::UnlockRadar);
            }
            TargetingMode::Gps => out.send(ActuatorCommand::SetGpsTarget {
                point: env.target.position(),
            }),
            TargetingMode::AntiRad => out.send(ActuatorCommand::EnableSensor {
                sensor: SensorKind::Rwr,
            }),
            _ => {}
        }

        let bays = open_bays(env, out, &mut self.bays_open);
        let ready_at = bays.unwrap_or(env.now);

        if self.seeker == TargetingMode::Laser && env.sensors.targeting_pod {
            out.send(ActuatorCommand::SlewPod {
                point: env.target.position(),
            });
            out.send(ActuatorCommand::PodLockCom);
        }

        let search = env.config.scan_interval_secs * 0.75;
        self.stage = match self.seeker {
            TargetingMode::Radar => Stage::RadarLock {
                deadline: ready_at + RADAR_LOCK_TIMEOUT_SECS,
            },
            TargetingMode::Heat => Stage::HeatSeek {
                deadline: ready_at + search.max(HEAT_SEEK_MIN_SECS),
            },
            TargetingMode::AntiRad | TargetingMode::Laser => Stage::Search {
                deadline: ready_at + search,
            },
            TargetingMode::Gps | TargetingMode::None => Stage::TurretAim {
                deadline: ready_at + aim_window(env),
            },
        };
        bays.map(|until| Step::Suspended { until })
    }

    fn launch(&mut self, env: &ChoreoEnv, out: &mut Outbox) -> Step<Outcome> {
        let target = env.target.id;
        let locked = match self.seeker {
            TargetingMode::Radar => env.feedback.radar_lock == Some(target),
            TargetingMode::Heat => {
                let uncaged = as_missile(env.weapon).is_some_and(|m| m.uncaged_lock);
                heat_locked(env) || (uncaged && env.feedback.radar_lock == Some(target))
            }
            TargetingMode::AntiRad | TargetingMode::Laser => seeker_found(self.seeker, env),
            TargetingMode::Gps | TargetingMode::None => true,
        };
        if !locked {
            return abort(env, Abort::NoLock);
        }
        let gated = matches!(self.seeker, TargetingMode::Radar | TargetingMode::Heat);
        if gated {
            if let Some(missile) = as_missile(env.weapon) {
                let authorized = launch_authorized(
                    missile,
                    env.body,
                    &env.target.body,
                    aim_point(env),
                    &env.config.tuning,
                );
                if !authorized {
                    return abort(env, Abort::NotAuthorized);
                }
            }
        }
        out.send(ActuatorCommand::Fire {
            weapon: env.weapon_id,
            target,
        });
        info!(
            unit = env.unit.0,
            target = target.0,
            weapon = env.weapon_id.0,
            seeker = ?self.seeker,
            "missile away"
        );
        Step::Done(Outcome::Fired)
    }
}

fn as_missile(weapon: &Weapon) -> Option<&Missile> {
    match weapon {
        Weapon::Missile(m) => Some(m),
        _ => None,
    }
}

fn abort(env: &ChoreoEnv, reason: Abort) -> Step<Outcome> {
    debug!(
        unit = env.unit.0,
        target = env.target.id.0,
        ?reason,
        "launch sequence aborted"
    );
    Step::Done(Outcome::Aborted(reason))
}

/// Turret slew window: the larger of half the scan interval and two seconds.
fn aim_window(env: &ChoreoEnv) -> f64 {
    (env.config.scan_interval_secs / 2.0).max(TURRET_AIM_MIN_SECS)
}

/// Air-to-air fire solution for airborne targets, the target itself otherwise.
fn aim_point(env: &ChoreoEnv) -> Position {
    let target = &env.target.body;
    match as_missile(env.weapon) {
        Some(missile) if target.flying => {
            env.guidance.fire_solution(env.body, target, missile.speed)
        }
        _ => target.position,
    }
}

fn slew_turret(env: &ChoreoEnv, out: &mut Outbox, point: Position) {
    if env.weapon.mount().is_turret() {
        out.send(ActuatorCommand::SlewTurret {
            weapon: env.weapon_id,
            point,
        });
    }
}

fn heat_locked(env: &ChoreoEnv) -> bool {
    env.feedback
        .heat_lock
        .is_some_and(|p| p.range_to(&env.target.position()) <= HEAT_LOCK_TOLERANCE)
}

fn seeker_found(seeker: TargetingMode, env: &ChoreoEnv) -> bool {
    let target = env.target.position();
    match seeker {
        TargetingMode::AntiRad => env.threats.emitter_near(&target, EMITTER_TOLERANCE).is_some(),
        TargetingMode::Laser => env
            .feedback
            .laser_designation
            .is_some_and(|p| p.range_to(&target) <= LASER_DESIGNATION_TOLERANCE),
        _ => false,
    }
}
