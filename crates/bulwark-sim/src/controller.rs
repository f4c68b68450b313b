//! Guard mode controller: the per-unit engagement state machine.
//!
//! `Disarmed` does nothing. `Scanning` counts down to the next scan, runs the
//! target cascade and dispatches a firing choreography. `Engaging` means a
//! choreography is in flight; scans that come due meanwhile are suppressed so
//! a unit never runs two choreographies at once.

use bulwark_core::commands::ActuatorCommand;
use bulwark_core::config::GuardConfig;
use bulwark_core::constants::OVERRIDE_TARGET_SECS;
use bulwark_core::enums::{GuardState, SensorKind, TargetingMode};
use bulwark_core::events::EngineEvent;
use bulwark_core::records::{SensorFeedback, SensorFit, UnitBody};
use bulwark_core::types::{TeamId, UnitId, WeaponId};
use bulwark_core::weapons::{Loadout, Weapon, WeaponCapability};
use bulwark_doctrine::envelope::off_axis_deg;
use bulwark_doctrine::guidance::Guidance;
use bulwark_doctrine::target_priority::TargetScore;
use bulwark_doctrine::weapon_scoring::WeaponChoice;
use tracing::{debug, info};

use crate::cascade::{self, PriorityScorer, Selection};
use crate::choreography::{
    Abort, BombRun, ChoreoEnv, Choreography, MissileRun, Outcome, Program, Step, TurretRun,
};
use crate::components::GpsDatabase;
use crate::countermeasures::ThreatResponder;
use crate::outbox::Outbox;
use crate::registry::TargetRegistry;

/// One unit's read-only state for a controller step.
pub struct UnitFrame<'a> {
    pub now: f64,
    pub dt: f64,
    pub unit: UnitId,
    pub team: TeamId,
    pub body: &'a UnitBody,
    pub loadout: &'a Loadout,
    pub sensors: &'a SensorFit,
    pub feedback: &'a SensorFeedback,
    pub gps: &'a GpsDatabase,
    pub threats: &'a ThreatResponder,
    pub guidance: &'a dyn Guidance,
}

#[derive(Debug, Clone)]
pub struct EngagementController {
    pub config: GuardConfig,
    state: GuardState,
    guard_target: Option<UnitId>,
    selected: Option<WeaponChoice>,
    /// Vessel targets assigned this scan, primary included.
    pub targets_assigned: Vec<UnitId>,
    /// Missile targets assigned this scan, primary included.
    pub missiles_assigned: Vec<UnitId>,
    scan_elapsed: f64,
    override_target: Option<UnitId>,
    override_timer: f64,
    choreography: Option<Choreography>,
    last_scores: Vec<TargetScore>,
    auto_firing: Vec<WeaponId>,
    ramming: Option<UnitId>,
}

impl EngagementController {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config,
            state: GuardState::Disarmed,
            guard_target: None,
            selected: None,
            targets_assigned: Vec::new(),
            missiles_assigned: Vec::new(),
            scan_elapsed: 0.0,
            override_target: None,
            override_timer: 0.0,
            choreography: None,
            last_scores: Vec::new(),
            auto_firing: Vec::new(),
            ramming: None,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn guard_target(&self) -> Option<UnitId> {
        self.guard_target
    }

    pub fn selected(&self) -> Option<WeaponChoice> {
        self.selected
    }

    pub fn override_target(&self) -> Option<UnitId> {
        self.override_target
    }

    pub fn override_timer(&self) -> f64 {
        self.override_timer
    }

    pub fn choreography(&self) -> Option<&Choreography> {
        self.choreography.as_ref()
    }

    pub fn is_firing(&self) -> bool {
        self.choreography.is_some()
    }

    /// Priority scores of the last scan, for display.
    pub fn last_scores(&self) -> &[TargetScore] {
        &self.last_scores
    }

    pub fn auto_firing(&self) -> &[WeaponId] {
        &self.auto_firing
    }

    pub fn ramming(&self) -> Option<UnitId> {
        self.ramming
    }

    pub fn is_armed(&self) -> bool {
        self.state != GuardState::Disarmed
    }

    /// Run a scan on the next step.
    pub fn force_scan(&mut self) {
        self.scan_elapsed = self.config.scan_interval_secs;
    }

    /// Bring the next scan forward by half an interval.
    pub fn hasten_scan(&mut self) {
        self.scan_elapsed += self.config.scan_interval_secs / 2.0;
    }

    /// Force `target` for the next scans. Used by an ally's call for help.
    pub fn set_override(&mut self, target: UnitId) {
        self.override_target = Some(target);
        self.override_timer = OVERRIDE_TARGET_SECS;
        self.force_scan();
    }

    pub fn enable(&mut self, loadout: &Loadout, sensors: &SensorFit, out: &mut Outbox) {
        if self.is_armed() {
            return;
        }
        self.state = GuardState::Scanning;
        self.force_scan();
        for (id, weapon) in loadout.iter() {
            if weapon.mount().is_turret() {
                out.send(ActuatorCommand::TurretEnable { weapon: id });
            }
        }
        let fitted = [
            (sensors.radar, SensorKind::Radar),
            (sensors.irst, SensorKind::Irst),
            (sensors.rwr, SensorKind::Rwr),
        ];
        for (_, sensor) in fitted.into_iter().filter(|(on, _)| *on) {
            out.send(ActuatorCommand::EnableSensor { sensor });
        }
        info!(unit = out.unit().0, "guard mode enabled");
        out.event(EngineEvent::GuardModeChanged {
            unit: out.unit(),
            enabled: true,
        });
    }

    /// Stand down: drop the choreography without letting it act again, stop
    /// auto-fire, disable turrets and clear weapon and target.
    pub fn disable(&mut self, registry: &mut TargetRegistry, loadout: &Loadout, out: &mut Outbox) {
        if !self.is_armed() {
            return;
        }
        if let Some(choreography) = self.choreography.take() {
            if choreography.bays_open() {
                out.send(ActuatorCommand::CloseBays {
                    weapon: choreography.weapon,
                });
            }
        }
        self.stop_auto_fire(out);
        for (id, weapon) in loadout.iter() {
            if weapon.mount().is_turret() {
                out.send(ActuatorCommand::TurretDisable { weapon: id });
            }
        }
        out.send(ActuatorCommand::ClearWeapon);
        if self.selected.take().is_some() {
            out.event(EngineEvent::WeaponSelected {
                unit: out.unit(),
                weapon: None,
                class: None,
            });
        }
        self.set_target(registry, None, out);
        registry.disengage_all(out.unit());
        self.targets_assigned.clear();
        self.missiles_assigned.clear();
        self.override_target = None;
        self.override_timer = 0.0;
        self.ramming = None;
        self.state = GuardState::Disarmed;
        info!(unit = out.unit().0, "guard mode disabled");
        out.event(EngineEvent::GuardModeChanged {
            unit: out.unit(),
            enabled: false,
        });
    }

    /// Change the guard target, releasing the previous engagement before
    /// claiming the next. A choreography aimed elsewhere is cancelled.
    pub fn set_target(
        &mut self,
        registry: &mut TargetRegistry,
        target: Option<UnitId>,
        out: &mut Outbox,
    ) {
        let unit = out.unit();
        if self.guard_target == target {
            return;
        }
        if let Some(old) = self.guard_target.take() {
            registry.disengage(unit, old);
        }
        if let Some(choreography) = self.choreography.as_mut() {
            if Some(choreography.target) != target {
                choreography.cancel();
            }
        }
        if let Some(new) = target {
            registry.engage(unit, new);
        }
        self.guard_target = target;
        info!(unit = unit.0, target = ?target.map(|t| t.0), "guard target changed");
        out.event(EngineEvent::TargetChanged { unit, target });
    }

    /// A weapon left the loadout. A running choreography notices on its next
    /// resume; the selection and auto-fire bookkeeping are dropped here.
    pub fn weapon_removed(&mut self, weapon: WeaponId, out: &mut Outbox) {
        self.auto_firing.retain(|&w| w != weapon);
        if self.selected.is_some_and(|c| c.weapon == weapon) {
            self.select_weapon(None, out);
        }
    }

    /// One tick of the state machine.
    pub fn step(&mut self, frame: &UnitFrame, registry: &mut TargetRegistry, out: &mut Outbox) {
        if !self.is_armed() {
            return;
        }

        self.validate_target(frame, registry, out);
        self.resume_choreography(frame, registry, out);

        let urgency = if frame.threats.missile_incoming {
            self.config.missile_scan_urgency
        } else {
            1.0
        };
        self.scan_elapsed += frame.dt * urgency;
        if self.scan_elapsed >= self.config.scan_interval_secs {
            self.scan_elapsed = 0.0;
            self.scan(frame, registry, out);
        }

        if self.guard_target.is_none() {
            self.stop_auto_fire(out);
        }

        if self.override_target.is_some() {
            self.override_timer -= frame.dt;
            if self.override_timer <= 0.0 {
                debug!(unit = frame.unit.0, "override target expired");
                self.override_target = None;
                self.override_timer = 0.0;
            }
        }
    }

    /// Drop a guard target that vanished or joined our team.
    fn validate_target(&mut self, frame: &UnitFrame, registry: &mut TargetRegistry, out: &mut Outbox) {
        let Some(target) = self.guard_target else {
            return;
        };
        let valid = registry.team_of(target).is_some_and(|team| team != frame.team);
        if !valid {
            self.set_target(registry, None, out);
            self.force_scan();
        }
    }

    fn resume_choreography(
        &mut self,
        frame: &UnitFrame,
        registry: &mut TargetRegistry,
        out: &mut Outbox,
    ) {
        let Some(choreography) = self.choreography.as_mut() else {
            return;
        };
        if self.guard_target != Some(choreography.target) {
            choreography.cancel();
        }
        let step = if choreography.is_cancelled() {
            Step::Done(Outcome::Aborted(Abort::Cancelled))
        } else {
            match (
                registry.record(choreography.target),
                frame.loadout.get(choreography.weapon),
            ) {
                (None, _) => Step::Done(Outcome::Aborted(Abort::TargetLost)),
                (_, None) => Step::Done(Outcome::Aborted(Abort::WeaponLost)),
                (Some(target), Some(weapon)) => {
                    let secondaries: Vec<UnitId> = self
                        .targets_assigned
                        .iter()
                        .chain(&self.missiles_assigned)
                        .copied()
                        .filter(|&t| t != target.id)
                        .collect();
                    let env = ChoreoEnv {
                        now: frame.now,
                        unit: frame.unit,
                        body: frame.body,
                        target,
                        weapon_id: choreography.weapon,
                        weapon,
                        loadout: frame.loadout,
                        sensors: frame.sensors,
                        feedback: frame.feedback,
                        threats: &frame.threats.last_snapshot,
                        config: &self.config,
                        guidance: frame.guidance,
                        registry,
                        gps: frame.gps,
                        secondaries: &secondaries,
                    };
                    choreography.resume(&env, out)
                }
            }
        };
        if let Step::Done(outcome) = step {
            self.finish(outcome, registry, out);
        }
    }

    fn finish(&mut self, outcome: Outcome, registry: &mut TargetRegistry, out: &mut Outbox) {
        let Some(choreography) = self.choreography.take() else {
            return;
        };
        if choreography.bays_open() {
            out.send(ActuatorCommand::CloseBays {
                weapon: choreography.weapon,
            });
        }
        if let (Program::Turret(run), Outcome::HandedOff) = (choreography.program(), outcome) {
            let handed = run.auto_firing();
            for &weapon in self.auto_firing.iter().filter(|w| !handed.contains(w)) {
                out.send(ActuatorCommand::StopAutoFire { weapon });
            }
            self.auto_firing = handed.to_vec();
        }
        if self.state == GuardState::Engaging {
            self.state = GuardState::Scanning;
        }
        debug!(unit = out.unit().0, ?outcome, "choreography finished");
        // A cancelled run ends silently; whoever cancelled it reports the change.
        if outcome != Outcome::Aborted(Abort::Cancelled) {
            out.event(EngineEvent::ChoreographyFinished {
                unit: out.unit(),
                fired: outcome.fired(),
            });
        }
        match outcome {
            Outcome::Aborted(Abort::OutOfRange) => self.set_target(registry, None, out),
            Outcome::Aborted(Abort::TargetLost) => {
                self.set_target(registry, None, out);
                self.force_scan();
            }
            Outcome::Aborted(Abort::WeaponLost) => self.force_scan(),
            _ => {}
        }
    }

    fn scan(&mut self, frame: &UnitFrame, registry: &mut TargetRegistry, out: &mut Outbox) {
        self.update_scores(frame, registry);
        if self.choreography.is_some() {
            debug!(unit = frame.unit.0, "scan suppressed, choreography in progress");
            return;
        }

        self.targets_assigned.clear();
        self.missiles_assigned.clear();
        let selection = cascade::smart_find_target(self, frame, registry);
        self.commit(selection, frame, registry, out);

        if self.config.multi_target > 1 {
            let assignment = cascade::select_secondary_targets(self, frame, registry);
            self.targets_assigned = assignment.targets;
            self.missiles_assigned = assignment.missiles;
        }

        self.dispatch(frame, registry, out);
    }

    fn update_scores(&mut self, frame: &UnitFrame, registry: &TargetRegistry) {
        let scores = {
            let scorer = PriorityScorer::new(frame, self, registry);
            let scope = cascade::scope(self, frame, &[]);
            registry
                .hostiles(&scope)
                .into_iter()
                .filter(|r| !r.is_missile())
                .map(|r| scorer.display(r))
                .collect()
        };
        self.last_scores = scores;
    }

    fn commit(
        &mut self,
        selection: Selection,
        frame: &UnitFrame,
        registry: &mut TargetRegistry,
        out: &mut Outbox,
    ) {
        match selection {
            Selection::Engage {
                target,
                choice,
                from_override,
            } => {
                if from_override {
                    self.override_timer = OVERRIDE_TARGET_SECS;
                } else {
                    self.override_target = None;
                }
                self.ramming = None;
                self.set_target(registry, Some(target), out);
                self.select_weapon(choice, out);
            }
            Selection::Ram { target } => {
                self.override_target = None;
                self.set_target(registry, Some(target), out);
                self.select_weapon(None, out);
                if self.ramming != Some(target) {
                    info!(unit = frame.unit.0, target = target.0, "out of ammunition, ramming");
                    out.send(ActuatorCommand::Ram { target });
                }
                self.ramming = Some(target);
            }
            Selection::Nothing => {
                self.override_target = None;
                self.ramming = None;
                self.select_weapon(None, out);
                self.set_target(registry, None, out);
                // Locks stay up while our missiles still need guidance.
                let locked = frame.feedback.radar_lock.is_some();
                if locked && registry.missiles_away(frame.unit) == 0 {
                    out.send(ActuatorCommand::UnlockRadar);
                }
            }
        }
    }

    fn select_weapon(&mut self, choice: Option<WeaponChoice>, out: &mut Outbox) {
        let previous = self.selected.map(|c| c.weapon);
        self.selected = choice;
        if previous == choice.map(|c| c.weapon) {
            return;
        }
        match choice {
            Some(choice) => {
                out.send(ActuatorCommand::SelectWeapon {
                    weapon: choice.weapon,
                });
                if let Some(sensor) = choice.enable_sensor {
                    out.send(ActuatorCommand::EnableSensor { sensor });
                }
            }
            None => out.send(ActuatorCommand::ClearWeapon),
        }
        debug!(
            unit = out.unit().0,
            weapon = ?choice.map(|c| c.weapon.0),
            class = ?choice.map(|c| c.class),
            "weapon selected"
        );
        out.event(EngineEvent::WeaponSelected {
            unit: out.unit(),
            weapon: choice.map(|c| c.weapon),
            class: choice.map(|c| c.class),
        });
    }

    fn stop_auto_fire(&mut self, out: &mut Outbox) {
        for weapon in self.auto_firing.drain(..) {
            out.send(ActuatorCommand::StopAutoFire { weapon });
        }
    }

    /// Start the choreography matching the selected weapon. Refused while
    /// one is already running.
    fn dispatch(&mut self, frame: &UnitFrame, registry: &mut TargetRegistry, out: &mut Outbox) {
        if self.choreography.is_some() {
            return;
        }
        let (Some(target_id), Some(choice)) = (self.guard_target, self.selected) else {
            return;
        };
        let Some(target) = registry.record(target_id) else {
            return;
        };
        let Some(weapon) = frame.loadout.get(choice.weapon) else {
            return;
        };
        let distance = frame.body.position.range_to(&target.position());
        let off_axis = off_axis_deg(frame.body, &target.position());
        let in_view = off_axis <= self.config.guard_angle_deg / 2.0;
        let below_cap =
            registry.missiles_at(frame.unit, target_id) < self.config.max_missiles_on_target;

        let program = match weapon {
            Weapon::Missile(missile) => {
                let zone = frame.guidance.launch_zone(missile, frame.body, &target.body);
                // Keep a radar lock that is still guiding missiles at another target.
                let lock_busy = missile.targeting == TargetingMode::Radar
                    && frame.feedback.radar_lock.is_some_and(|l| l != target_id)
                    && registry.missiles_away(frame.unit) > 0;
                if !(in_view && below_cap && zone.contains(distance)) || lock_busy {
                    debug!(
                        unit = frame.unit.0,
                        target = target_id.0,
                        distance,
                        off_axis,
                        "launch conditions not met"
                    );
                    return;
                }
                Program::Missile(MissileRun::new(missile.targeting))
            }
            Weapon::Slw(_) => {
                if !(in_view && below_cap) {
                    return;
                }
                Program::Missile(MissileRun::new(TargetingMode::None))
            }
            Weapon::Bomb(_) => Program::Bomb(BombRun::new()),
            Weapon::Gun(_) | Weapon::Rocket(_) | Weapon::DefenseLaser(_) => {
                Program::Turret(TurretRun::new())
            }
        };
        if !matches!(program, Program::Turret(_)) {
            self.stop_auto_fire(out);
        }

        info!(
            unit = frame.unit.0,
            target = target_id.0,
            weapon = weapon.short_name(),
            class = %weapon.class(),
            "engaging"
        );
        out.event(EngineEvent::ChoreographyStarted {
            unit: frame.unit,
            target: target_id,
            weapon: choice.weapon,
        });
        self.choreography = Some(Choreography::new(target_id, choice.weapon, frame.now, program));
        self.state = GuardState::Engaging;
        self.resume_choreography(frame, registry, out);
    }
}

impl Default for EngagementController {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}
