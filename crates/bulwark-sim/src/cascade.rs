//! Target selection cascade.
//!
//! Tries candidates in a fixed order and stops at the first one a usable
//! weapon exists for:
//!
//! 1. the override target set by an ally's call for help
//! 2. missiles guiding on this unit, then unengaged missile threats
//! 3. the primary target picked by the configured strategy
//! 4. the closest hostile
//! 5. any missile threat to the team, then the closest missile
//! 6. every remaining hostile not yet tried
//!
//! The cascade only reads. The controller commits the [`Selection`].

use bulwark_core::constants::TARGET_MEMORY_SECS;
use bulwark_core::enums::TargetStrategy;
use bulwark_core::records::TargetRecord;
use bulwark_core::types::UnitId;
use bulwark_doctrine::envelope::EnvelopeContext;
use bulwark_doctrine::target_priority::{
    compute_sub_scores, selection_score, ObserverView, SubScores, TargetScore,
};
use bulwark_doctrine::weapon_scoring::{select_weapon, ScoringContext, WeaponChoice};
use tracing::debug;

use crate::controller::{EngagementController, UnitFrame};
use crate::registry::{Scope, TargetRegistry};

/// Outcome of one cascade run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    Engage {
        target: UnitId,
        /// `None` when a score-driven strategy accepted the target before any
        /// weapon came into envelope.
        choice: Option<WeaponChoice>,
        from_override: bool,
    },
    /// Out of ammunition; ram the primary target.
    Ram { target: UnitId },
    Nothing,
}

/// Secondary targets for multi-target units. Both lists include the primary
/// target in the list matching its kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub targets: Vec<UnitId>,
    pub missiles: Vec<UnitId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Attempt {
    /// Already tried, or saturated with this unit's missiles.
    Skipped,
    NoWeapon,
    Armed(WeaponChoice),
}

/// The observer side of priority scoring, gathered once per scan.
pub(crate) struct PriorityScorer<'a> {
    frame: &'a UnitFrame<'a>,
    controller: &'a EngagementController,
    registry: &'a TargetRegistry,
    teammates: Vec<UnitId>,
    team_vips: Vec<UnitId>,
    max_weapon_range: f64,
}

impl<'a> PriorityScorer<'a> {
    pub(crate) fn new(
        frame: &'a UnitFrame<'a>,
        controller: &'a EngagementController,
        registry: &'a TargetRegistry,
    ) -> Self {
        let teammates: Vec<UnitId> = registry
            .team_members(frame.team)
            .into_iter()
            .filter(|&id| id != frame.unit)
            .collect();
        let team_vips = teammates
            .iter()
            .copied()
            .filter(|&id| registry.record(id).is_some_and(|r| r.is_vip))
            .collect();
        let max_weapon_range = frame
            .loadout
            .iter()
            .filter_map(|(_, w)| w.mount().max_range())
            .fold(0.0, f64::max);
        Self {
            frame,
            controller,
            registry,
            teammates,
            team_vips,
            max_weapon_range,
        }
    }

    fn sub_scores(&self, target: &TargetRecord) -> SubScores {
        let view = ObserverView {
            id: self.frame.unit,
            body: self.frame.body,
            weapon_count: self.frame.loadout.len() as u32,
            max_weapon_range: self.max_weapon_range,
            teammates: &self.teammates,
            team_vips: &self.team_vips,
            incoming_threat: self.frame.threats.incoming_threat,
            miss_distances: &self.frame.threats.miss_distances,
            evasion_miss_threshold: self.controller.config.tuning.evasion_miss_threshold,
        };
        let engaging = self.registry.friendlies_engaging(target.id, self.frame.team);
        compute_sub_scores(target, &view, engaging)
    }

    pub(crate) fn selection(&self, target: &TargetRecord) -> f64 {
        let config = &self.controller.config;
        let current = self.controller.guard_target() == Some(target.id);
        selection_score(
            &self.sub_scores(target),
            &config.weights,
            config.target_bias,
            current,
        )
    }

    pub(crate) fn display(&self, target: &TargetRecord) -> TargetScore {
        let config = &self.controller.config;
        TargetScore::new(
            target.id,
            self.sub_scores(target),
            &config.weights,
            config.target_bias,
        )
    }
}

/// Registry scope of one controller.
pub(crate) fn scope<'a>(
    controller: &EngagementController,
    frame: &'a UnitFrame,
    assigned: &'a [UnitId],
) -> Scope<'a> {
    let config = &controller.config;
    Scope {
        observer: frame.unit,
        team: frame.team,
        body: frame.body,
        guard_range: config.guard_range,
        memory_secs: config.scan_interval_secs.max(TARGET_MEMORY_SECS),
        now: frame.now,
        assigned,
    }
}

struct Search<'a> {
    controller: &'a EngagementController,
    frame: &'a UnitFrame<'a>,
    registry: &'a TargetRegistry,
    tried: Vec<UnitId>,
}

impl Search<'_> {
    fn attempt(&mut self, target: &TargetRecord, step: &'static str) -> Attempt {
        if self.tried.contains(&target.id) {
            return Attempt::Skipped;
        }
        self.tried.push(target.id);

        let config = &self.controller.config;
        let unit = self.frame.unit;
        let distance = self.frame.body.position.range_to(&target.position());
        let in_flight = self.registry.missiles_at(unit, target.id);
        let saturated = in_flight >= config.max_missiles_on_target
            && distance > config.gun_range * config.tuning.saturated_gun_range_fraction;
        if saturated {
            debug!(unit = unit.0, target = target.id.0, step, "target saturated, skipping");
            return Attempt::Skipped;
        }

        let snapshot = &self.frame.threats.last_snapshot;
        let ctx = ScoringContext {
            envelope: EnvelopeContext {
                shooter: self.frame.body,
                target,
                distance,
                sensors: self.frame.sensors,
                antirad_threat: snapshot.antirad_inbound(),
                infinite_ammo: config.infinite_ammo,
                tuning: &config.tuning,
                guidance: self.frame.guidance,
            },
            gun_range: config.gun_range,
            missiles_away: in_flight,
            max_missiles: config.max_missiles_on_target,
            pod_active: self.frame.sensors.targeting_pod,
            rwr_emitters: &snapshot.rwr_emitters,
        };
        match select_weapon(self.frame.loadout, &ctx) {
            Some(choice) => {
                debug!(
                    unit = unit.0,
                    target = target.id.0,
                    step,
                    weapon = choice.weapon.0,
                    "cascade picked target"
                );
                Attempt::Armed(choice)
            }
            None => Attempt::NoWeapon,
        }
    }
}

fn engage(target: UnitId, choice: WeaponChoice) -> Selection {
    Selection::Engage {
        target,
        choice: Some(choice),
        from_override: false,
    }
}

/// Run the cascade for one controller.
pub fn smart_find_target(
    controller: &EngagementController,
    frame: &UnitFrame,
    registry: &TargetRegistry,
) -> Selection {
    let config = &controller.config;
    let scope = scope(controller, frame, &[]);
    let mut search = Search {
        controller,
        frame,
        registry,
        tried: Vec::new(),
    };

    // 1. Override target
    if let Some(record) = controller.override_target().and_then(|id| registry.record(id)) {
        if let Attempt::Armed(choice) = search.attempt(record, "override") {
            return Selection::Engage {
                target: record.id,
                choice: Some(choice),
                from_override: true,
            };
        }
    }

    // 2. Missiles guiding on this unit, then unengaged missiles
    if config.target_missiles {
        let threats = [
            registry.missile_target(&scope, true),
            registry.unengaged_missile(&scope),
        ];
        for record in threats.into_iter().flatten() {
            if let Attempt::Armed(choice) = search.attempt(record, "missile threat") {
                return engage(record.id, choice);
            }
        }
    }

    // 3. Primary target
    let primary = match config.strategy {
        TargetStrategy::ClosestWithBias => {
            registry.closest_with_bias(&scope, controller.guard_target(), &config.tuning)
        }
        TargetStrategy::HighestPriority => {
            let scorer = PriorityScorer::new(frame, controller, registry);
            registry.highest_priority(&scope, |r| scorer.selection(r))
        }
        TargetStrategy::LeastEngaged => registry.least_engaged(&scope),
    };
    if let Some(record) = primary {
        let has_ammo = frame.loadout.has_ammo(config.infinite_ammo);
        match search.attempt(record, "primary") {
            Attempt::Armed(choice) => return engage(record.id, choice),
            Attempt::NoWeapon if config.strategy.is_score_driven() && has_ammo => {
                return Selection::Engage {
                    target: record.id,
                    choice: None,
                    from_override: false,
                };
            }
            Attempt::NoWeapon if config.allow_ramming && !has_ammo => {
                return Selection::Ram { target: record.id };
            }
            _ => {}
        }
    }

    // 4. Closest hostile
    if let Some(record) = registry.closest(&scope) {
        if let Attempt::Armed(choice) = search.attempt(record, "closest") {
            return engage(record.id, choice);
        }
    }

    // 5. Lower-priority missile threats
    if config.target_missiles {
        let threats = [
            registry.missile_target(&scope, false),
            registry.closest_missile(&scope),
        ];
        for record in threats.into_iter().flatten() {
            if let Attempt::Armed(choice) = search.attempt(record, "missile") {
                return engage(record.id, choice);
            }
        }
    }

    // 6. Everything not yet tried
    let remaining = registry.all_excluding(&scope, &search.tried);
    for id in remaining {
        let Some(record) = registry.record(id) else {
            continue;
        };
        if let Attempt::Armed(choice) = search.attempt(record, "remaining") {
            return engage(id, choice);
        }
    }

    debug!(unit = frame.unit.0, tried = search.tried.len(), "cascade found nothing");
    Selection::Nothing
}

/// Fill up to `multi_target - 1` extra targets after the primary. Missile
/// threats come first, then vessels.
pub fn select_secondary_targets(
    controller: &EngagementController,
    frame: &UnitFrame,
    registry: &TargetRegistry,
) -> Assignment {
    let config = &controller.config;
    let mut assignment = Assignment::default();
    let mut assigned: Vec<UnitId> = Vec::new();

    if let Some(primary) = controller.guard_target().and_then(|id| registry.record(id)) {
        if primary.is_missile() {
            assignment.missiles.push(primary.id);
        } else {
            assignment.targets.push(primary.id);
        }
        assigned.push(primary.id);
    }

    let extras = config.multi_target.saturating_sub(1) as usize;
    let scorer = PriorityScorer::new(frame, controller, registry);
    for _ in 0..extras {
        let next = {
            let scope = scope(controller, frame, &assigned);
            let missile = if config.target_missiles {
                registry
                    .missile_target(&scope, true)
                    .or_else(|| registry.closest_missile(&scope))
                    .or_else(|| registry.unengaged_missile(&scope))
            } else {
                None
            };
            let vessel = || {
                let preferred = if config.strategy == TargetStrategy::ClosestWithBias {
                    registry.closest_with_bias(&scope, None, &config.tuning)
                } else {
                    registry.highest_priority(&scope, |r| scorer.selection(r))
                };
                preferred.or_else(|| registry.closest(&scope))
            };
            missile
                .or_else(vessel)
                .map(|r| (r.id, r.is_missile()))
                .or_else(|| {
                    registry
                        .all_excluding(&scope, &assigned)
                        .first()
                        .and_then(|&id| registry.record(id))
                        .map(|r| (r.id, r.is_missile()))
                })
        };
        let Some((id, is_missile)) = next else {
            break;
        };
        assigned.push(id);
        if is_missile {
            assignment.missiles.push(id);
        } else {
            assignment.targets.push(id);
        }
    }
    assignment
}
