//! Firing choreographies: multi-tick aim, lock, authorize and fire sequences.
//!
//! Each choreography is an explicit state machine. The guard controller calls
//! [`Choreography::resume`] once per tick; the program either asks to run
//! again next tick, suspends until a given time, or finishes with an
//! [`Outcome`]. Cancellation is a flag checked before every resume, so a
//! cancelled choreography never issues another actuator command.

pub mod bomb;
pub mod missile;
pub mod turret;

use serde::{Deserialize, Serialize};

use bulwark_core::commands::ActuatorCommand;
use bulwark_core::config::GuardConfig;
use bulwark_core::constants::BAY_OPEN_SECS;
use bulwark_core::records::{SensorFeedback, SensorFit, TargetRecord, ThreatSnapshot, UnitBody};
use bulwark_core::types::{UnitId, WeaponId};
use bulwark_core::weapons::{Loadout, Weapon};
use bulwark_doctrine::guidance::Guidance;

use crate::components::GpsDatabase;
use crate::outbox::Outbox;
use crate::registry::TargetRegistry;

pub use bomb::BombRun;
pub use missile::MissileRun;
pub use turret::TurretRun;

/// Result of one resume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step<T> {
    /// Run again on the next tick.
    Continue,
    /// Sleep until the given simulation time.
    Suspended { until: f64 },
    Done(T),
}

/// How a choreography ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// At least one round left the unit.
    Fired,
    /// Control passed to continuous auto-fire.
    HandedOff,
    Aborted(Abort),
}

impl Outcome {
    pub fn fired(self) -> bool {
        matches!(self, Outcome::Fired | Outcome::HandedOff)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Abort {
    Cancelled,
    TargetLost,
    WeaponLost,
    OutOfRange,
    NoLock,
    NotAuthorized,
    NoAimPoint,
    Timeout,
}

/// Read-only view of the unit and its surroundings for one resume.
pub struct ChoreoEnv<'a> {
    pub now: f64,
    pub unit: UnitId,
    pub body: &'a UnitBody,
    pub target: &'a TargetRecord,
    pub weapon_id: WeaponId,
    pub weapon: &'a Weapon,
    pub loadout: &'a Loadout,
    pub sensors: &'a SensorFit,
    pub feedback: &'a SensorFeedback,
    pub threats: &'a ThreatSnapshot,
    pub config: &'a GuardConfig,
    pub guidance: &'a dyn Guidance,
    pub registry: &'a TargetRegistry,
    pub gps: &'a GpsDatabase,
    /// Secondary targets available for turret assignment.
    pub secondaries: &'a [UnitId],
}

impl ChoreoEnv<'_> {
    pub fn distance(&self) -> f64 {
        self.body.position.range_to(&self.target.position())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Program {
    Turret(TurretRun),
    Missile(MissileRun),
    Bomb(BombRun),
}

impl Program {
    fn resume(&mut self, env: &ChoreoEnv, out: &mut Outbox) -> Step<Outcome> {
        match self {
            Program::Turret(p) => p.resume(env, out),
            Program::Missile(p) => p.resume(env, out),
            Program::Bomb(p) => p.resume(env, out),
        }
    }

    fn bays_open(&self) -> bool {
        match self {
            Program::Turret(p) => p.bays_open(),
            Program::Missile(p) => p.bays_open(),
            Program::Bomb(p) => p.bays_open(),
        }
    }
}

/// One in-flight choreography. At most one exists per unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Choreography {
    pub target: UnitId,
    pub weapon: WeaponId,
    pub started_at: f64,
    resume_at: f64,
    cancelled: bool,
    program: Program,
}

impl Choreography {
    pub fn new(target: UnitId, weapon: WeaponId, now: f64, program: Program) -> Self {
        Self {
            target,
            weapon,
            started_at: now,
            resume_at: now,
            cancelled: false,
            program,
        }
    }

    /// Signal the choreography to stop. The next resume finishes it without
    /// touching any actuator.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Whether bay doors opened by this choreography are still open.
    pub fn bays_open(&self) -> bool {
        self.program.bays_open()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn resume(&mut self, env: &ChoreoEnv, out: &mut Outbox) -> Step<Outcome> {
        if self.cancelled {
            return Step::Done(Outcome::Aborted(Abort::Cancelled));
        }
        if env.now < self.resume_at {
            return Step::Suspended {
                until: self.resume_at,
            };
        }
        let step = self.program.resume(env, out);
        if let Step::Suspended { until } = step {
            self.resume_at = until;
        }
        step
    }
}

/// Open the weapon's bay doors once. Returns the time launches may proceed.
pub(crate) fn open_bays(env: &ChoreoEnv, out: &mut Outbox, bays_open: &mut bool) -> Option<f64> {
    if !env.weapon.mount().bay || *bays_open {
        return None;
    }
    out.send(ActuatorCommand::OpenBays {
        weapon: env.weapon_id,
    });
    *bays_open = true;
    Some(env.now + BAY_OPEN_SECS)
}
