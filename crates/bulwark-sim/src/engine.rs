//! Simulation engine: the decision core's tick loop.
//!
//! `SimulationEngine` owns the simulation context, processes control
//! commands at tick boundaries, runs every system in a fixed order and hands
//! back the actuator commands and events the tick produced. Completely
//! headless; sensors and guidance are collaborators passed in by the host.

use std::collections::VecDeque;
use std::sync::mpsc::Receiver;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use bulwark_core::commands::{Actuation, ControlCommand};
use bulwark_core::events::{EngineEvent, TeamEvent};
use bulwark_core::records::{SensorFit, UnitBody};
use bulwark_core::types::{SimTime, UnitId};
use bulwark_core::weapons::Loadout;
use bulwark_doctrine::guidance::{Guidance, KinematicGuidance};

use crate::components::{GpsDatabase, TeamTag};
use crate::context::SimulationContext;
use crate::controller::EngagementController;
use crate::countermeasures::ThreatResponder;
use crate::error::{Result, SimError};
use crate::outbox::Outbox;
use crate::registry::TargetRegistry;
use crate::sensors::SensorFeed;
use crate::systems;
use crate::world_setup::{self, MissileSpec, UnitSpec};

/// Configuration for starting a new simulation.
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

/// Everything one tick produced, in the order it was decided.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub time: SimTime,
    pub actuations: Vec<Actuation>,
    pub events: Vec<EngineEvent>,
}

pub struct SimulationEngine {
    ctx: SimulationContext,
    guidance: Box<dyn Guidance + Send>,
    rng: ChaCha8Rng,
    next_unit_id: u32,
    command_queue: VecDeque<ControlCommand>,
    team_events: Receiver<TeamEvent>,
    actuations: Vec<Actuation>,
    events: Vec<EngineEvent>,
}

impl SimulationEngine {
    /// Create an engine with straight-line guidance.
    pub fn new(config: SimConfig) -> Self {
        Self::with_guidance(config, Box::new(KinematicGuidance))
    }

    pub fn with_guidance(config: SimConfig, guidance: Box<dyn Guidance + Send>) -> Self {
        let mut ctx = SimulationContext::new();
        let team_events = ctx.teams.subscribe();
        Self {
            ctx,
            guidance,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            next_unit_id: 1,
            command_queue: VecDeque::new(),
            team_events,
            actuations: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Queue a control command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: ControlCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = ControlCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self, sensors: &dyn SensorFeed) -> TickReport {
        self.process_commands();
        self.run_systems(sensors);
        let time = self.ctx.time;
        self.ctx.time.advance();
        TickReport {
            time,
            actuations: std::mem::take(&mut self.actuations),
            events: std::mem::take(&mut self.events),
        }
    }

    /// Spawn a combat unit. Guard mode, when requested, switches on at the
    /// next tick.
    pub fn spawn_unit(&mut self, spec: UnitSpec) -> Result<UnitId> {
        let id = self.allocate_id(spec.id);
        let guard = spec.guard;
        world_setup::spawn_unit(&mut self.ctx, id, spec)?;
        self.claim_id(id);
        if guard {
            self.queue_command(ControlCommand::SetGuardMode {
                unit: id,
                enabled: true,
            });
        }
        debug!(unit = id.0, "unit spawned");
        Ok(id)
    }

    pub fn spawn_missile(&mut self, spec: MissileSpec) -> Result<UnitId> {
        let id = self.allocate_id(spec.id);
        world_setup::spawn_missile(&mut self.ctx, id, spec)?;
        self.claim_id(id);
        debug!(missile = id.0, "missile spawned");
        Ok(id)
    }

    /// Spawn a random two-team skirmish drawn from the engine's RNG.
    pub fn spawn_random_skirmish(&mut self, per_team: usize) -> Result<Vec<UnitId>> {
        let specs = world_setup::random_skirmish(&mut self.rng, per_team);
        specs.into_iter().map(|spec| self.spawn_unit(spec)).collect()
    }

    /// Report a unit's latest kinematic state.
    pub fn update_body(&mut self, unit: UnitId, body: UnitBody) -> Result<()> {
        let entity = self.ctx.entity(unit)?;
        let mut current = self
            .ctx
            .world
            .get::<&mut UnitBody>(entity)
            .map_err(|_| SimError::MissingComponent(unit))?;
        *current = body;
        Ok(())
    }

    /// Current kinematic state of every unit and missile, sorted by id.
    pub fn bodies(&self) -> Vec<(UnitId, UnitBody)> {
        self.ctx
            .ordered_entities()
            .into_iter()
            .filter_map(|(id, entity)| {
                self.ctx
                    .world
                    .get::<&UnitBody>(entity)
                    .ok()
                    .map(|body| (id, *body))
            })
            .collect()
    }

    pub fn controller(&self, unit: UnitId) -> Option<hecs::Ref<'_, EngagementController>> {
        let entity = self.ctx.entity(unit).ok()?;
        self.ctx.world.get::<&EngagementController>(entity).ok()
    }

    pub fn responder(&self, unit: UnitId) -> Option<hecs::Ref<'_, ThreatResponder>> {
        let entity = self.ctx.entity(unit).ok()?;
        self.ctx.world.get::<&ThreatResponder>(entity).ok()
    }

    pub fn loadout(&self, unit: UnitId) -> Option<hecs::Ref<'_, Loadout>> {
        let entity = self.ctx.entity(unit).ok()?;
        self.ctx.world.get::<&Loadout>(entity).ok()
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.ctx.registry
    }

    /// Get the current simulation time.
    pub fn time(&self) -> SimTime {
        self.ctx.time
    }

    fn allocate_id(&self, requested: Option<UnitId>) -> UnitId {
        requested.unwrap_or(UnitId(self.next_unit_id))
    }

    fn claim_id(&mut self, id: UnitId) {
        self.next_unit_id = self.next_unit_id.max(id.0.saturating_add(1));
    }

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            if let Err(err) = self.handle_command(command) {
                warn!(%err, "control command rejected");
            }
        }
    }

    /// Handle a single control command.
    fn handle_command(&mut self, command: ControlCommand) -> Result<()> {
        let now = self.ctx.now();
        match command {
            ControlCommand::SetGuardMode { unit, enabled } => {
                let entity = self.ctx.entity(unit)?;
                let (loadout, fit, controller) = self
                    .ctx
                    .world
                    .query_one_mut::<(&Loadout, &SensorFit, &mut EngagementController)>(entity)
                    .map_err(|_| SimError::MissingComponent(unit))?;
                let mut out = Outbox::new(unit, &mut self.actuations, &mut self.events);
                if enabled {
                    controller.enable(loadout, fit, &mut out);
                } else {
                    controller.disable(&mut self.ctx.registry, loadout, &mut out);
                }
            }
            ControlCommand::SetOverrideTarget { unit, target } => {
                self.controller_mut(unit)?.set_override(target);
            }
            ControlCommand::SetTeam { unit, team } => {
                let entity = self.ctx.entity(unit)?;
                let mut tag = self
                    .ctx
                    .world
                    .get::<&mut TeamTag>(entity)
                    .map_err(|_| SimError::MissingComponent(unit))?;
                if tag.0 != team {
                    tag.0 = team;
                    drop(tag);
                    self.ctx.teams.publish(TeamEvent::TeamChanged {
                        unit,
                        new_team: team,
                    });
                }
            }
            ControlCommand::Configure { unit, config } => {
                config.validate()?;
                self.controller_mut(unit)?.config = *config;
                info!(unit = unit.0, "guard configuration updated");
            }
            ControlCommand::PartAdded { unit, weapon } => {
                let entity = self.ctx.entity(unit)?;
                let mut loadout = self
                    .ctx
                    .world
                    .get::<&mut Loadout>(entity)
                    .map_err(|_| SimError::MissingComponent(unit))?;
                let id = loadout.add(weapon);
                debug!(unit = unit.0, weapon = id.0, "weapon added");
            }
            ControlCommand::PartRemoved { unit, weapon } => {
                let entity = self.ctx.entity(unit)?;
                let (loadout, controller) = self
                    .ctx
                    .world
                    .query_one_mut::<(&mut Loadout, &mut EngagementController)>(entity)
                    .map_err(|_| SimError::MissingComponent(unit))?;
                if loadout.remove(weapon).is_some() {
                    let mut out = Outbox::new(unit, &mut self.actuations, &mut self.events);
                    controller.weapon_removed(weapon, &mut out);
                    debug!(unit = unit.0, weapon = weapon.0, "weapon removed");
                }
            }
            ControlCommand::DesignateGps { unit, point } => {
                let entity = self.ctx.entity(unit)?;
                let mut gps = self
                    .ctx
                    .world
                    .get::<&mut GpsDatabase>(entity)
                    .map_err(|_| SimError::MissingComponent(unit))?;
                gps.points.push(point);
            }
            ControlCommand::FireAllCountermeasures { unit, count } => {
                let entity = self.ctx.entity(unit)?;
                let (responder, controller) = self
                    .ctx
                    .world
                    .query_one_mut::<(&mut ThreatResponder, &EngagementController)>(entity)
                    .map_err(|_| SimError::MissingComponent(unit))?;
                let mut out = Outbox::new(unit, &mut self.actuations, &mut self.events);
                if !responder.fire_all(count, now, &controller.config, &mut out) {
                    debug!(unit = unit.0, "countermeasure salvo refused");
                }
            }
            ControlCommand::RemoveUnit { unit } => {
                let entity = self.ctx.entity(unit)?;
                self.ctx.registry.disengage_all(unit);
                self.ctx.index.remove(&unit);
                self.ctx
                    .world
                    .despawn(entity)
                    .map_err(|_| SimError::UnknownUnit(unit))?;
                debug!(unit = unit.0, "unit removed");
            }
        }
        Ok(())
    }

    fn controller_mut(&mut self, unit: UnitId) -> Result<hecs::RefMut<'_, EngagementController>> {
        let entity = self.ctx.entity(unit)?;
        self.ctx
            .world
            .get::<&mut EngagementController>(entity)
            .map_err(|_| SimError::MissingComponent(unit))
    }

    /// Run all systems in order.
    fn run_systems(&mut self, sensors: &dyn SensorFeed) {
        let ctx = &mut self.ctx;
        // 1. Target picture and detections
        systems::picture::run(ctx, sensors);
        // 2. Team changes
        systems::team_sync::run(ctx, &self.team_events, &mut self.actuations, &mut self.events);
        // 3. Threat response (countermeasures, situational flags)
        let calls = systems::threat_response::run(ctx, sensors, &mut self.actuations, &mut self.events);
        // 4. Calls for help
        systems::threat_response::resolve_help(ctx, &calls, &mut self.events);
        // 5. Guard controllers (scan, cascade, choreographies)
        systems::guard::run(
            ctx,
            sensors,
            self.guidance.as_ref(),
            &mut self.actuations,
            &mut self.events,
        );
    }
}
