//! Team sync system: applies `TeamChanged` notifications to engagement
//! bookkeeping. Engagements between units now on the same team are released.

use std::sync::mpsc::Receiver;

use bulwark_core::commands::Actuation;
use bulwark_core::events::{EngineEvent, TeamEvent};
use tracing::info;

use crate::components::TeamTag;
use crate::context::SimulationContext;
use crate::controller::EngagementController;
use crate::outbox::Outbox;

pub fn run(
    ctx: &mut SimulationContext,
    team_events: &Receiver<TeamEvent>,
    actuations: &mut Vec<Actuation>,
    events: &mut Vec<EngineEvent>,
) {
    let mut changed = false;
    for event in team_events.try_iter() {
        let TeamEvent::TeamChanged { unit, new_team } = event;
        info!(unit = unit.0, team = new_team.0, "team changed");
        changed = true;
    }
    if !changed {
        return;
    }

    for (id, entity) in ctx.ordered_entities() {
        let Ok((team, controller)) = ctx
            .world
            .query_one_mut::<(&TeamTag, &mut EngagementController)>(entity)
        else {
            continue;
        };
        let team = team.0;
        let mut out = Outbox::new(id, actuations, events);
        if controller
            .guard_target()
            .is_some_and(|t| ctx.registry.team_of(t) == Some(team))
        {
            controller.set_target(&mut ctx.registry, None, &mut out);
            controller.force_scan();
        }
        for target in ctx.registry.engagements_of(id) {
            if ctx.registry.team_of(target) == Some(team) {
                ctx.registry.disengage(id, target);
            }
        }
    }
}
