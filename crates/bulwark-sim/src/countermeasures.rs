//! Countermeasure sequences and the per-unit threat responder.
//!
//! Every defensive subsystem owns one sequence. A subsystem refuses a new
//! trigger while its previous sequence is dropping or cooling down, but the
//! subsystems themselves are independent: flares and a cloak may run at the
//! same time.

use std::collections::HashMap;

use bulwark_core::commands::ActuatorCommand;
use bulwark_core::config::GuardConfig;
use bulwark_core::constants::{MISSILE_WARNING_RESET_SECS, UNDER_FIRE_RESET_SECS};
use bulwark_core::enums::{CountermeasureKind, DefenseSubsystem, TargetingMode};
use bulwark_core::events::EngineEvent;
use bulwark_core::records::{closing_time, SensorFit, ThreatSnapshot, UnitBody};
use bulwark_core::types::UnitId;
use tracing::{debug, info};

use crate::choreography::Step;
use crate::outbox::Outbox;

/// Closing time reported while nothing is inbound.
const NO_THREAT_CLOSING_SECS: f64 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Dropping { remaining: u32, next_at: f64 },
    Cooldown { until: f64 },
}

/// Repeated dispenser drops followed by a latched cool-down.
#[derive(Debug, Clone, PartialEq)]
pub struct DropSequence {
    kinds: &'static [CountermeasureKind],
    interval: f64,
    wait: f64,
    phase: Phase,
}

impl DropSequence {
    pub fn new(kinds: &'static [CountermeasureKind]) -> Self {
        Self {
            kinds,
            interval: 0.0,
            wait: 0.0,
            phase: Phase::Idle,
        }
    }

    pub fn flares() -> Self {
        Self::new(&[CountermeasureKind::Flare])
    }

    pub fn chaff() -> Self {
        Self::new(&[CountermeasureKind::Chaff])
    }

    /// Every dispenser type per drop.
    pub fn salvo() -> Self {
        Self::new(&[CountermeasureKind::Flare, CountermeasureKind::Chaff])
    }

    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Arm the sequence. Returns false when it is already running.
    pub fn trigger(&mut self, repetitions: u32, interval: f64, wait: f64, now: f64) -> bool {
        if self.is_active() || repetitions == 0 {
            return false;
        }
        self.interval = interval;
        self.wait = wait;
        self.phase = Phase::Dropping {
            remaining: repetitions,
            next_at: now,
        };
        true
    }

    pub fn resume(&mut self, now: f64, out: &mut Outbox) -> Step<()> {
        match self.phase {
            Phase::Idle => Step::Done(()),
            Phase::Dropping { remaining, next_at } => {
                if now < next_at {
                    return Step::Suspended { until: next_at };
                }
                for &kind in self.kinds {
                    out.send(ActuatorCommand::DropCountermeasure { kind });
                }
                let remaining = remaining - 1;
                self.phase = if remaining == 0 {
                    Phase::Cooldown {
                        until: now + self.interval + self.wait,
                    }
                } else {
                    Phase::Dropping {
                        remaining,
                        next_at: now + self.interval,
                    }
                };
                Step::Continue
            }
            Phase::Cooldown { until } => {
                if now >= until {
                    self.phase = Phase::Idle;
                    Step::Done(())
                } else {
                    Step::Suspended { until }
                }
            }
        }
    }
}

/// A device switched on for a fixed window (jammer, cloak).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimedWindow {
    active_until: Option<f64>,
}

impl TimedWindow {
    pub fn is_active(&self) -> bool {
        self.active_until.is_some()
    }

    /// Returns false when the window is already open.
    pub fn open(&mut self, now: f64, secs: f64) -> bool {
        if self.is_active() {
            return false;
        }
        self.active_until = Some(now + secs);
        true
    }

    /// Close the window once it has expired. Returns true on the closing tick.
    pub fn expire(&mut self, now: f64) -> bool {
        match self.active_until {
            Some(until) if now >= until => {
                self.active_until = None;
                true
            }
            _ => false,
        }
    }
}

/// What the guard controller needs to know after a threat pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reaction {
    /// Attacker to report to the closest friendly.
    pub help_against: Option<UnitId>,
    /// A guided ground-attack missile is inbound; scan sooner.
    pub hasten_scan: bool,
}

/// Situational awareness and countermeasure state of one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatResponder {
    pub flares: DropSequence,
    pub chaff: DropSequence,
    pub salvo: DropSequence,
    pub jammer: TimedWindow,
    pub cloak: TimedWindow,
    pub under_fire: bool,
    under_fire_at: f64,
    pub under_attack: bool,
    under_attack_at: f64,
    pub missile_incoming: bool,
    missile_seen_at: f64,
    /// Unit behind the inbound missile, or the latest gunfire attacker.
    pub incoming_threat: Option<UnitId>,
    pub incoming_missile: Option<UnitId>,
    pub incoming_closing_secs: f64,
    pub miss_distances: HashMap<UnitId, f64>,
    prior_gun_threat: Option<UnitId>,
    radar_silenced: bool,
    pub last_snapshot: ThreatSnapshot,
}

impl Default for ThreatResponder {
    fn default() -> Self {
        Self {
            flares: DropSequence::flares(),
            chaff: DropSequence::chaff(),
            salvo: DropSequence::salvo(),
            jammer: TimedWindow::default(),
            cloak: TimedWindow::default(),
            under_fire: false,
            under_fire_at: 0.0,
            under_attack: false,
            under_attack_at: 0.0,
            missile_incoming: false,
            missile_seen_at: 0.0,
            incoming_threat: None,
            incoming_missile: None,
            incoming_closing_secs: NO_THREAT_CLOSING_SECS,
            miss_distances: HashMap::new(),
            prior_gun_threat: None,
            radar_silenced: false,
            last_snapshot: ThreatSnapshot::default(),
        }
    }
}

impl ThreatResponder {
    /// Digest one threat scan and trigger the matching countermeasures.
    #[allow(clippy::too_many_arguments)]
    pub fn react(
        &mut self,
        now: f64,
        body: &UnitBody,
        sensors: &SensorFit,
        config: &GuardConfig,
        has_guard_target: bool,
        snapshot: ThreatSnapshot,
        out: &mut Outbox,
    ) -> Reaction {
        let mut reaction = Reaction::default();
        let cm = &config.countermeasures;

        if let Some(missile) = snapshot.nearest_missile(&body.position).copied() {
            self.missile_incoming = true;
            self.missile_seen_at = now;
            self.incoming_missile = Some(missile.missile);
            self.incoming_threat = missile.source.or(self.incoming_threat);
            self.incoming_closing_secs = closing_time(
                &missile.position,
                &missile.velocity,
                &body.position,
                &body.velocity,
            );
            let imminent = self.incoming_closing_secs <= cm.threshold_secs;

            match missile.targeting {
                TargetingMode::Heat => {
                    self.under_attack = true;
                    self.under_attack_at = now;
                    if imminent && sensors.flares {
                        let started = self.flares.trigger(
                            cm.flare_repetition,
                            cm.flare_interval_secs,
                            cm.flare_wait_secs,
                            now,
                        );
                        announce(started, DefenseSubsystem::Flares, out);
                    }
                    if sensors.cloak {
                        let started = self.cloak.open(now, cm.cloak_secs);
                        if started {
                            out.send(ActuatorCommand::Cloak { enabled: true });
                        }
                        announce(started, DefenseSubsystem::Cloak, out);
                    }
                }
                TargetingMode::Radar => {
                    self.under_attack = true;
                    self.under_attack_at = now;
                    if imminent && sensors.chaff {
                        let started = self.chaff.trigger(
                            cm.chaff_repetition,
                            cm.chaff_interval_secs,
                            cm.chaff_wait_secs,
                            now,
                        );
                        announce(started, DefenseSubsystem::Chaff, out);
                    }
                    if sensors.jammer {
                        let started = self.jammer.open(now, cm.jammer_secs);
                        if started {
                            out.send(ActuatorCommand::Jammer { enabled: true });
                        }
                        announce(started, DefenseSubsystem::Jammer, out);
                    }
                }
                TargetingMode::AntiRad => {
                    if sensors.radar && !self.radar_silenced {
                        out.send(ActuatorCommand::RadarEmissions { enabled: false });
                        self.radar_silenced = true;
                        debug!(unit = out.unit().0, "radar emissions off, anti-radiation missile inbound");
                    }
                }
                TargetingMode::Laser | TargetingMode::Gps => {
                    reaction.hasten_scan = config.target_missiles && !has_guard_target;
                }
                TargetingMode::None => {}
            }
        } else if self.missile_incoming && now - self.missile_seen_at > MISSILE_WARNING_RESET_SECS {
            self.missile_incoming = false;
            self.incoming_missile = None;
            self.incoming_closing_secs = NO_THREAT_CLOSING_SECS;
            if self.radar_silenced {
                out.send(ActuatorCommand::RadarEmissions { enabled: true });
                self.radar_silenced = false;
            }
        }

        for report in &snapshot.gunfire {
            self.under_fire = true;
            self.under_fire_at = now;
            self.under_attack = true;
            self.under_attack_at = now;
            self.miss_distances.insert(report.source, report.miss_distance);
            if !self.missile_incoming {
                self.incoming_threat = Some(report.source);
            }
            if config.call_for_help && self.prior_gun_threat != Some(report.source) {
                reaction.help_against = Some(report.source);
            }
            self.prior_gun_threat = Some(report.source);
        }

        if self.under_fire && now - self.under_fire_at > UNDER_FIRE_RESET_SECS {
            self.under_fire = false;
            self.prior_gun_threat = None;
            self.miss_distances.clear();
        }
        if self.under_attack && now - self.under_attack_at > UNDER_FIRE_RESET_SECS {
            self.under_attack = false;
        }
        if !self.under_fire && !self.missile_incoming {
            self.incoming_threat = None;
        }

        self.last_snapshot = snapshot;
        self.advance(now, out);
        reaction
    }

    /// Drop `count` of every countermeasure type at the salvo interval. Refused
    /// while flares or chaff are already running or a missile is about to hit.
    pub fn fire_all(&mut self, count: u32, now: f64, config: &GuardConfig, out: &mut Outbox) -> bool {
        let cm = &config.countermeasures;
        if self.flares.is_active()
            || self.chaff.is_active()
            || self.incoming_closing_secs <= cm.threshold_secs
        {
            return false;
        }
        let started = self.salvo.trigger(count, cm.salvo_interval_secs, 0.0, now);
        announce(started, DefenseSubsystem::Salvo, out);
        if started {
            self.salvo.resume(now, out);
        }
        started
    }

    /// Step every running sequence and close expired windows.
    pub fn advance(&mut self, now: f64, out: &mut Outbox) {
        self.flares.resume(now, out);
        self.chaff.resume(now, out);
        self.salvo.resume(now, out);
        if self.jammer.expire(now) {
            out.send(ActuatorCommand::Jammer { enabled: false });
        }
        if self.cloak.expire(now) {
            out.send(ActuatorCommand::Cloak { enabled: false });
        }
    }
}

fn announce(started: bool, subsystem: DefenseSubsystem, out: &mut Outbox) {
    if !started {
        return;
    }
    info!(unit = out.unit().0, ?subsystem, "countermeasure triggered");
    out.event(EngineEvent::CountermeasureTriggered {
        unit: out.unit(),
        subsystem,
    });
}
