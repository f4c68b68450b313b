use bulwark_core::commands::{Actuation, ActuatorCommand};
use bulwark_core::events::EngineEvent;
use bulwark_core::types::UnitId;

/// Collects the actuator commands and events one unit produces during a tick.
pub struct Outbox<'a> {
    unit: UnitId,
    actuations: &'a mut Vec<Actuation>,
    events: &'a mut Vec<EngineEvent>,
}

impl<'a> Outbox<'a> {
    pub fn new(
        unit: UnitId,
        actuations: &'a mut Vec<Actuation>,
        events: &'a mut Vec<EngineEvent>,
    ) -> Self {
        Self {
            unit,
            actuations,
            events,
        }
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn send(&mut self, command: ActuatorCommand) {
        self.actuations.push(Actuation {
            unit: self.unit,
            command,
        });
    }

    pub fn event(&mut self, event: EngineEvent) {
        self.events.push(event);
    }
}
