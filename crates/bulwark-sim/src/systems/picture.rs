//! Picture system: rebuilds the target registry from the world and records
//! which teams detect which entities.

use std::collections::BTreeSet;

use bulwark_core::records::{MissileInfo, TargetRecord, UnitBody};
use bulwark_core::types::TeamId;
use bulwark_core::weapons::Loadout;

use crate::components::{TeamTag, Unit};
use crate::context::SimulationContext;
use crate::controller::EngagementController;
use crate::sensors::SensorFeed;

pub fn run(ctx: &mut SimulationContext, sensors: &dyn SensorFeed) {
    let mut records: Vec<TargetRecord> = Vec::new();
    {
        let mut query = ctx.world.query::<(
            &Unit,
            &TeamTag,
            &UnitBody,
            Option<&Loadout>,
            Option<&MissileInfo>,
            Option<&EngagementController>,
        )>();
        for (_entity, (unit, team, body, loadout, missile, controller)) in query.iter() {
            records.push(TargetRecord {
                id: unit.id,
                team: team.0,
                body: *body,
                weapon_count: loadout.map_or(0, |l| l.len() as u32),
                is_vip: controller.is_some_and(|c| c.config.is_vip),
                missile: missile.copied(),
                engaging: controller.and_then(|c| c.guard_target()),
            });
        }
    }
    records.sort_by_key(|r| r.id);

    let teams: BTreeSet<TeamId> = records
        .iter()
        .filter(|r| !r.is_missile())
        .map(|r| r.team)
        .collect();
    let now = ctx.now();
    for &team in &teams {
        for record in records.iter().filter(|r| r.team != team) {
            if sensors.detect(team, record.id) {
                ctx.registry.report_detection(team, record.id, now);
            }
        }
    }
    ctx.registry.refresh(records);
}
