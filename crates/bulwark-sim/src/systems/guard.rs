//! Guard system: steps every unit's engagement controller in unit id order.

use bulwark_core::commands::Actuation;
use bulwark_core::events::EngineEvent;
use bulwark_core::records::{SensorFit, UnitBody};
use bulwark_core::weapons::Loadout;
use bulwark_doctrine::guidance::Guidance;

use crate::components::{GpsDatabase, TeamTag};
use crate::context::SimulationContext;
use crate::controller::{EngagementController, UnitFrame};
use crate::countermeasures::ThreatResponder;
use crate::outbox::Outbox;
use crate::sensors::SensorFeed;

pub fn run(
    ctx: &mut SimulationContext,
    sensors: &dyn SensorFeed,
    guidance: &dyn Guidance,
    actuations: &mut Vec<Actuation>,
    events: &mut Vec<EngineEvent>,
) {
    let now = ctx.now();
    let dt = ctx.time.dt();
    for (id, entity) in ctx.ordered_entities() {
        let Ok((team, body, loadout, fit, gps, threats, controller)) =
            ctx.world.query_one_mut::<(
                &TeamTag,
                &UnitBody,
                &Loadout,
                &SensorFit,
                &GpsDatabase,
                &ThreatResponder,
                &mut EngagementController,
            )>(entity)
        else {
            continue;
        };
        let feedback = sensors.feedback(id);
        let frame = UnitFrame {
            now,
            dt,
            unit: id,
            team: team.0,
            body,
            loadout,
            sensors: fit,
            feedback: &feedback,
            gps,
            threats,
            guidance,
        };
        let mut out = Outbox::new(id, actuations, events);
        controller.step(&frame, &mut ctx.registry, &mut out);
    }
}
