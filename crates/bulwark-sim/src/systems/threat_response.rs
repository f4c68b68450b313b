//! Threat response system: feeds each armed unit's threat scan to its
//! responder, then settles calls for help between teammates.

use bulwark_core::commands::Actuation;
use bulwark_core::events::EngineEvent;
use bulwark_core::records::{SensorFit, UnitBody};
use bulwark_core::types::UnitId;
use tracing::info;

use crate::components::TeamTag;
use crate::context::SimulationContext;
use crate::controller::EngagementController;
use crate::countermeasures::ThreatResponder;
use crate::outbox::Outbox;
use crate::registry::Scope;
use crate::sensors::SensorFeed;

/// A unit under gunfire asking its closest teammate for help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpCall {
    pub from: UnitId,
    pub threat: UnitId,
}

pub fn run(
    ctx: &mut SimulationContext,
    sensors: &dyn SensorFeed,
    actuations: &mut Vec<Actuation>,
    events: &mut Vec<EngineEvent>,
) -> Vec<HelpCall> {
    let now = ctx.now();
    let mut calls = Vec::new();
    for (id, entity) in ctx.ordered_entities() {
        let Ok((body, fit, responder, controller)) = ctx.world.query_one_mut::<(
            &UnitBody,
            &SensorFit,
            &mut ThreatResponder,
            &mut EngagementController,
        )>(entity) else {
            continue;
        };
        let mut out = Outbox::new(id, actuations, events);
        if !controller.is_armed() {
            responder.advance(now, &mut out);
            continue;
        }
        let config = &controller.config;
        let snapshot = sensors.scan_threats(id, config.guard_angle_deg, config.guard_range);
        let reaction = responder.react(
            now,
            body,
            fit,
            config,
            controller.guard_target().is_some(),
            snapshot,
            &mut out,
        );
        if reaction.hasten_scan {
            controller.hasten_scan();
        }
        if let Some(threat) = reaction.help_against {
            calls.push(HelpCall { from: id, threat });
        }
    }
    calls
}

/// Hand each attacker to the caller's closest armed teammate. When the
/// attacker is already the caller's own target and the teammate is busy with
/// another one, the two swap targets instead.
pub fn resolve_help(
    ctx: &mut SimulationContext,
    calls: &[HelpCall],
    events: &mut Vec<EngineEvent>,
) {
    for call in calls {
        let Ok(caller) = ctx.entity(call.from) else {
            continue;
        };
        let (team, body, own_target, guard_range) = {
            let Ok((team, body, controller)) = ctx
                .world
                .query_one_mut::<(&TeamTag, &UnitBody, &EngagementController)>(caller)
            else {
                continue;
            };
            (team.0, *body, controller.guard_target(), controller.config.guard_range)
        };
        let scope = Scope {
            observer: call.from,
            team,
            body: &body,
            guard_range,
            memory_secs: 0.0,
            now: ctx.now(),
            assigned: &[],
        };
        let Some(ally) = ctx.registry.closest_friendly(&scope).map(|r| r.id) else {
            continue;
        };
        let Ok(ally_entity) = ctx.entity(ally) else {
            continue;
        };

        let swap_with = {
            let Ok(controller) = ctx
                .world
                .query_one_mut::<&mut EngagementController>(ally_entity)
            else {
                continue;
            };
            if !controller.is_armed() {
                continue;
            }
            let ally_target = controller.guard_target();
            let swap = own_target == Some(call.threat)
                && ally_target.is_some_and(|t| t != call.threat);
            controller.set_override(call.threat);
            swap.then_some(ally_target).flatten()
        };

        if let Some(their_target) = swap_with {
            if let Ok(controller) = ctx
                .world
                .query_one_mut::<&mut EngagementController>(caller)
            {
                controller.set_override(their_target);
            }
        }
        let swapped = swap_with.is_some();
        info!(
            from = call.from.0,
            to = ally.0,
            threat = call.threat.0,
            swapped,
            "help requested"
        );
        events.push(EngineEvent::HelpRequested {
            from: call.from,
            to: ally,
            threat: call.threat,
            swapped,
        });
    }
}
