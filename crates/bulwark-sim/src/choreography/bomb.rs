//! Bomb run: resolve an aim point, fly the release window, ripple bombs until
//! the per-target cap, then ask the pilot to extend.

use bulwark_core::commands::ActuatorCommand;
use bulwark_core::constants::{
    BOMB_ATTEMPT_MIN_SECS, BOMB_BAY_RADII, BOMB_EXTEND_DELAY_SECS, BOMB_EXTEND_MIN_RANGE,
    BOMB_MAX_BANK_DEG, BOMB_MIN_RELEASE_RADIUS, BOMB_RELEASE_GAP_SECS,
};
use bulwark_core::enums::TargetingMode;
use bulwark_core::types::Position;
use bulwark_core::weapons::Weapon;
use tracing::{debug, info};

use super::{open_bays, Abort, ChoreoEnv, Outcome, Step};
use crate::outbox::Outbox;

/// Release gate. Bombs only drop once the aim-point distance has been seen
/// shrinking and then growing again, i.e. the release point has just passed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApproachGate {
    Unseen,
    Watching { prev: f64 },
    Closing { prev: f64 },
    Open,
}

impl ApproachGate {
    pub fn observe(&mut self, distance: f64) {
        *self = match *self {
            ApproachGate::Unseen => ApproachGate::Watching { prev: distance },
            ApproachGate::Watching { prev } if distance < prev => {
                ApproachGate::Closing { prev: distance }
            }
            ApproachGate::Watching { .. } => ApproachGate::Watching { prev: distance },
            ApproachGate::Closing { prev } if distance > prev => ApproachGate::Open,
            ApproachGate::Closing { .. } => ApproachGate::Closing { prev: distance },
            ApproachGate::Open => ApproachGate::Open,
        };
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ApproachGate::Open)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Acquire,
    PodSlew,
    Run,
    Extend,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BombRun {
    stage: Stage,
    radius: f64,
    /// Designated coordinates for guided bombs.
    aim: Option<Position>,
    deadline: f64,
    gate: ApproachGate,
    bays_open: bool,
    released: u32,
    /// Bombs already falling on the target when the run started.
    baseline: u32,
}

impl Default for BombRun {
    fn default() -> Self {
        Self::new()
    }
}

impl BombRun {
    pub fn new() -> Self {
        Self {
            stage: Stage::Acquire,
            radius: 0.0,
            aim: None,
            deadline: 0.0,
            gate: ApproachGate::Unseen,
            bays_open: false,
            released: 0,
            baseline: 0,
        }
    }

    pub fn bays_open(&self) -> bool {
        self.bays_open
    }

    pub fn released(&self) -> u32 {
        self.released
    }

    pub fn gate(&self) -> ApproachGate {
        self.gate
    }

    pub fn resume(&mut self, env: &ChoreoEnv, out: &mut Outbox) -> Step<Outcome> {
        match self.stage {
            Stage::Acquire => self.acquire(env, out),
            Stage::PodSlew => {
                let blast = env.weapon.blast_radius();
                let designated = env
                    .feedback
                    .pod_point
                    .filter(|p| p.range_to(&env.target.position()) < blast);
                let Some(point) = designated else {
                    return abort(env, Abort::NoAimPoint);
                };
                self.radius = env.config.tuning.pod_release_radius;
                self.aim = Some(point);
                out.send(ActuatorCommand::SetGpsTarget { point });
                self.deadline = env.now + attempt_secs(env);
                self.enter_run();
                Step::Continue
            }
            Stage::Run => self.run(env, out),
            Stage::Extend => {
                out.send(ActuatorCommand::Extend {
                    away_from: self.aim_point(env),
                });
                Step::Done(Outcome::Fired)
            }
        }
    }

    fn acquire(&mut self, env: &ChoreoEnv, out: &mut Outbox) -> Step<Outcome> {
        let cap = env.config.max_missiles_on_target;
        let spread = (1.0 + f64::from(cap) / 2.0).min(1.5);
        self.radius = env.weapon.blast_radius() * spread;
        self.deadline = env.now + attempt_secs(env);
        self.baseline = env.registry.missiles_at(env.unit, env.target.id);

        if env.weapon.targeting() == TargetingMode::Gps {
            let target = env.target.position();
            if let Some(point) = env.gps.find_near(&target, 2.0 * self.radius) {
                self.aim = Some(point);
                out.send(ActuatorCommand::SetGpsTarget { point });
            } else if env.sensors.targeting_pod {
                out.send(ActuatorCommand::SlewPod { point: target });
                self.stage = Stage::PodSlew;
                return Step::Continue;
            } else {
                return abort(env, Abort::NoAimPoint);
            }
        }
        self.enter_run();
        self.run(env, out)
    }

    fn enter_run(&mut self) {
        self.radius = self.radius.max(BOMB_MIN_RELEASE_RADIUS);
        self.stage = Stage::Run;
    }

    fn aim_point(&self, env: &ChoreoEnv) -> Position {
        self.aim.unwrap_or_else(|| env.target.position())
    }

    fn in_flight(&self, env: &ChoreoEnv) -> u32 {
        env.registry
            .missiles_at(env.unit, env.target.id)
            .max(self.baseline + self.released)
    }

    fn run(&mut self, env: &ChoreoEnv, out: &mut Outbox) -> Step<Outcome> {
        let cap = env.config.max_missiles_on_target;
        if env.now >= self.deadline || self.in_flight(env) >= cap {
            return self.finish(env);
        }

        let aim = self.aim_point(env);
        let impact = env.guidance.bomb_impact_point(env.body, aim.z);
        let distance = impact.range_to(&aim);

        if distance < self.radius * BOMB_BAY_RADII {
            open_bays(env, out, &mut self.bays_open);
        }

        if distance > self.radius || env.body.bank_deg.abs() > BOMB_MAX_BANK_DEG {
            let overshot = {
                let ahead = impact.offset_to(&aim);
                let from_unit = env.body.position.offset_to(&aim);
                ahead.dot(from_unit) < 0.0
            };
            let close = distance < (self.radius * 2.0).max(BOMB_EXTEND_MIN_RANGE);
            if close && overshot {
                out.send(ActuatorCommand::Extend { away_from: aim });
                debug!(unit = env.unit.0, target = env.target.id.0, "bomb run overshot");
                return self.finish(env);
            }
            return Step::Continue;
        }

        self.gate.observe(distance);
        if !self.gate.is_open() {
            return Step::Continue;
        }

        out.send(ActuatorCommand::Fire {
            weapon: env.weapon_id,
            target: env.target.id,
        });
        self.released += 1;
        info!(
            unit = env.unit.0,
            target = env.target.id.0,
            released = self.released,
            "bomb released"
        );

        let gap = match env.weapon {
            Weapon::Bomb(bomb) if bomb.ripple_rpm > 0.0 => 60.0 / bomb.ripple_rpm,
            _ => BOMB_RELEASE_GAP_SECS,
        };
        if self.in_flight(env) >= cap {
            self.stage = Stage::Extend;
            return Step::Suspended {
                until: env.now + gap + BOMB_EXTEND_DELAY_SECS,
            };
        }
        Step::Suspended {
            until: env.now + gap,
        }
    }

    fn finish(&self, env: &ChoreoEnv) -> Step<Outcome> {
        if self.released > 0 {
            Step::Done(Outcome::Fired)
        } else {
            abort(env, Abort::Timeout)
        }
    }
}

fn attempt_secs(env: &ChoreoEnv) -> f64 {
    env.config.scan_interval_secs.max(BOMB_ATTEMPT_MIN_SECS)
}

fn abort(env: &ChoreoEnv, reason: Abort) -> Step<Outcome> {
    debug!(
        unit = env.unit.0,
        target = env.target.id.0,
        ?reason,
        "bomb run aborted"
    );
    Step::Done(Outcome::Aborted(reason))
}
