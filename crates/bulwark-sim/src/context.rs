//! Simulation context: everything the controllers share, owned by the engine
//! and passed by reference to each system.

use std::collections::HashMap;

use hecs::{Entity, World};

use bulwark_core::types::{SimTime, UnitId};

use crate::error::{Result, SimError};
use crate::registry::TargetRegistry;
use crate::teams::TeamBus;

pub struct SimulationContext {
    pub world: World,
    pub registry: TargetRegistry,
    pub teams: TeamBus,
    pub time: SimTime,
    /// Unit and missile ids to their entities.
    pub index: HashMap<UnitId, Entity>,
}

impl SimulationContext {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            registry: TargetRegistry::default(),
            teams: TeamBus::default(),
            time: SimTime::default(),
            index: HashMap::new(),
        }
    }

    pub fn entity(&self, id: UnitId) -> Result<Entity> {
        self.index.get(&id).copied().ok_or(SimError::UnknownUnit(id))
    }

    pub fn now(&self) -> f64 {
        self.time.elapsed_secs
    }

    /// Entities sorted by unit id, so systems visit units in a stable order.
    pub fn ordered_entities(&self) -> Vec<(UnitId, Entity)> {
        let mut entities: Vec<(UnitId, Entity)> =
            self.index.iter().map(|(&id, &e)| (id, e)).collect();
        entities.sort_by_key(|(id, _)| *id);
        entities
    }
}

impl Default for SimulationContext {
    fn default() -> Self {
        Self::new()
    }
}
