//! Target registry: the shared picture every controller queries.
//!
//! Records are rebuilt from the world at the start of each tick. Engagement
//! bookkeeping (which observers claim which target) and per-team detection
//! timestamps survive across ticks. Only the guard system writes engagements;
//! only the picture system writes records and detections.

use std::collections::{BTreeSet, HashMap};

use bulwark_core::config::Tuning;
use bulwark_core::constants::MISSILE_THREAT_MAX_ENGAGING;
use bulwark_core::records::{TargetRecord, UnitBody};
use bulwark_core::types::{angle_between_deg, TeamId, UnitId};

#[derive(Debug, Default)]
pub struct TargetRegistry {
    records: Vec<TargetRecord>,
    index: HashMap<UnitId, usize>,
    /// target -> observers currently engaging it.
    engaged_by: HashMap<UnitId, BTreeSet<UnitId>>,
    detected_at: HashMap<(TeamId, UnitId), f64>,
}

/// The observer side of a registry query.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub observer: UnitId,
    pub team: TeamId,
    pub body: &'a UnitBody,
    pub guard_range: f64,
    /// How long a team keeps seeing a target after its last detection.
    pub memory_secs: f64,
    pub now: f64,
    /// Targets already assigned to this observer in multi-target mode.
    pub assigned: &'a [UnitId],
}

impl TargetRegistry {
    /// Replace the records with this tick's picture. Engagements naming
    /// entities that no longer exist are dropped.
    pub fn refresh(&mut self, records: Vec<TargetRecord>) {
        self.index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id, i))
            .collect();
        self.records = records;
        let index = &self.index;
        self.engaged_by.retain(|target, observers| {
            observers.retain(|o| index.contains_key(o));
            index.contains_key(target) && !observers.is_empty()
        });
        self.detected_at
            .retain(|(_, target), _| index.contains_key(target));
    }

    pub fn record(&self, id: UnitId) -> Option<&TargetRecord> {
        self.index.get(&id).map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[TargetRecord] {
        &self.records
    }

    pub fn team_of(&self, id: UnitId) -> Option<TeamId> {
        self.record(id).map(|r| r.team)
    }

    pub fn report_detection(&mut self, team: TeamId, target: UnitId, now: f64) {
        self.detected_at.insert((team, target), now);
    }

    pub fn last_detected(&self, team: TeamId, target: UnitId) -> Option<f64> {
        self.detected_at.get(&(team, target)).copied()
    }

    // ---- Engagement bookkeeping ----

    /// Claim `target` for `observer`. Returns false when already claimed.
    pub fn engage(&mut self, observer: UnitId, target: UnitId) -> bool {
        self.engaged_by.entry(target).or_default().insert(observer)
    }

    pub fn disengage(&mut self, observer: UnitId, target: UnitId) {
        if let Some(observers) = self.engaged_by.get_mut(&target) {
            observers.remove(&observer);
            if observers.is_empty() {
                self.engaged_by.remove(&target);
            }
        }
    }

    /// Release every claim held by `observer`.
    pub fn disengage_all(&mut self, observer: UnitId) {
        self.engaged_by.retain(|_, observers| {
            observers.remove(&observer);
            !observers.is_empty()
        });
    }

    pub fn is_engaged_by(&self, target: UnitId, observer: UnitId) -> bool {
        self.engaged_by
            .get(&target)
            .is_some_and(|o| o.contains(&observer))
    }

    /// Targets currently claimed by `observer`.
    pub fn engagements_of(&self, observer: UnitId) -> Vec<UnitId> {
        let mut targets: Vec<UnitId> = self
            .engaged_by
            .iter()
            .filter(|(_, o)| o.contains(&observer))
            .map(|(&t, _)| t)
            .collect();
        targets.sort();
        targets
    }

    /// Members of `team` engaging `target`.
    pub fn friendlies_engaging(&self, target: UnitId, team: TeamId) -> usize {
        self.engaged_by.get(&target).map_or(0, |observers| {
            observers
                .iter()
                .filter(|&&o| self.team_of(o) == Some(team))
                .count()
        })
    }

    // ---- Missiles in flight ----

    /// Missiles launched by `source` that are guiding on `target`.
    pub fn missiles_at(&self, source: UnitId, target: UnitId) -> u32 {
        self.records
            .iter()
            .filter_map(|r| r.missile)
            .filter(|m| m.source == source && m.target == Some(target))
            .count() as u32
    }

    /// Missiles launched by `source` still in flight.
    pub fn missiles_away(&self, source: UnitId) -> u32 {
        self.records
            .iter()
            .filter_map(|r| r.missile)
            .filter(|m| m.source == source)
            .count() as u32
    }

    // ---- Queries ----

    /// Whether the observer's team can see `record`: inside guard range, or
    /// detected within the memory window.
    pub fn can_see(&self, scope: &Scope, record: &TargetRecord) -> bool {
        if scope.body.position.range_to(&record.position()) <= scope.guard_range {
            return true;
        }
        self.last_detected(scope.team, record.id)
            .is_some_and(|at| scope.now - at <= scope.memory_secs)
    }

    /// Visible hostile entities, excluding targets already assigned.
    pub fn hostiles(&self, scope: &Scope) -> Vec<&TargetRecord> {
        self.records
            .iter()
            .filter(|r| {
                r.id != scope.observer
                    && r.team != scope.team
                    && !scope.assigned.contains(&r.id)
                    && self.can_see(scope, r)
            })
            .collect()
    }

    fn hostile_vessels(&self, scope: &Scope) -> Vec<&TargetRecord> {
        let mut hostiles = self.hostiles(scope);
        hostiles.retain(|r| !r.is_missile());
        hostiles
    }

    /// Whether `record` is a missile guiding on the observer (`me_only`) or
    /// on anyone on the observer's team.
    fn threatens(&self, scope: &Scope, record: &TargetRecord, me_only: bool) -> bool {
        let Some(target) = record.missile.and_then(|m| m.target) else {
            return false;
        };
        if me_only {
            target == scope.observer
        } else {
            self.team_of(target) == Some(scope.team)
        }
    }

    fn distance(scope: &Scope, record: &TargetRecord) -> f64 {
        scope.body.position.range_to(&record.position())
    }

    pub fn closest(&self, scope: &Scope) -> Option<&TargetRecord> {
        self.hostile_vessels(scope)
            .into_iter()
            .min_by(|a, b| Self::distance(scope, a).total_cmp(&Self::distance(scope, b)))
    }

    /// Closest target biased toward the direction of travel, with hysteresis
    /// for the current target.
    pub fn closest_with_bias(
        &self,
        scope: &Scope,
        current: Option<UnitId>,
        tuning: &Tuning,
    ) -> Option<&TargetRecord> {
        let heading = if scope.body.velocity.speed() > f64::EPSILON {
            scope.body.velocity.as_vec()
        } else {
            scope.body.forward
        };
        let bias = tuning.closest_target_angle_bias;
        let mut best: Option<(&TargetRecord, f64)> = None;
        for record in self.hostile_vessels(scope) {
            let offset = scope.body.position.offset_to(&record.position());
            let theta = angle_between_deg(heading, offset).to_radians();
            let distance = offset.length().max(f64::EPSILON);
            let hysteresis = if current == Some(record.id) {
                tuning.closest_target_hysteresis
            } else {
                1.0
            };
            let score = hysteresis * ((bias - 1.0) * (theta / 2.0).cos().powi(2) + 1.0) / distance;
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((record, score));
            }
        }
        best.map(|(r, _)| r)
    }

    /// Target with the fewest members of the observer's team engaging it.
    pub fn least_engaged(&self, scope: &Scope) -> Option<&TargetRecord> {
        let mut best: Option<(&TargetRecord, usize)> = None;
        for record in self.hostile_vessels(scope) {
            let engaging = self.friendlies_engaging(record.id, scope.team);
            if best.map_or(true, |(_, n)| engaging < n) {
                best = Some((record, engaging));
            }
        }
        best.map(|(r, _)| r)
    }

    /// Target with the highest score under `score`.
    pub fn highest_priority(
        &self,
        scope: &Scope,
        mut score: impl FnMut(&TargetRecord) -> f64,
    ) -> Option<&TargetRecord> {
        let mut best: Option<(&TargetRecord, f64)> = None;
        for record in self.hostile_vessels(scope) {
            let s = score(record);
            if best.map_or(true, |(_, b)| s > b) {
                best = Some((record, s));
            }
        }
        best.map(|(r, _)| r)
    }

    /// A missile threat that is not yet covered by two friendlies. A later
    /// candidate replaces the pick only when it is both less engaged and closer.
    pub fn missile_target(&self, scope: &Scope, me_only: bool) -> Option<&TargetRecord> {
        let mut best: Option<(&TargetRecord, usize)> = None;
        for record in self.hostiles(scope) {
            if !record.is_missile() || !self.threatens(scope, record, me_only) {
                continue;
            }
            let engaging = self.friendlies_engaging(record.id, scope.team);
            let take = match best {
                None => engaging < MISSILE_THREAT_MAX_ENGAGING,
                Some((current, n)) => {
                    engaging < n && Self::distance(scope, record) < Self::distance(scope, current)
                }
            };
            if take {
                best = Some((record, engaging));
            }
        }
        best.map(|(r, _)| r)
    }

    /// First threatening missile nobody on the team engages.
    pub fn unengaged_missile(&self, scope: &Scope) -> Option<&TargetRecord> {
        self.hostiles(scope).into_iter().find(|r| {
            r.is_missile()
                && self.threatens(scope, r, false)
                && self.friendlies_engaging(r.id, scope.team) == 0
        })
    }

    pub fn closest_missile(&self, scope: &Scope) -> Option<&TargetRecord> {
        self.hostiles(scope)
            .into_iter()
            .filter(|r| r.is_missile())
            .min_by(|a, b| Self::distance(scope, a).total_cmp(&Self::distance(scope, b)))
    }

    /// Every visible hostile not in `excluding`, in registry order.
    pub fn all_excluding(&self, scope: &Scope, excluding: &[UnitId]) -> Vec<UnitId> {
        self.hostiles(scope)
            .into_iter()
            .filter(|r| !excluding.contains(&r.id))
            .map(|r| r.id)
            .collect()
    }

    /// Closest non-missile unit on the observer's own team.
    pub fn closest_friendly(&self, scope: &Scope) -> Option<&TargetRecord> {
        self.records
            .iter()
            .filter(|r| r.id != scope.observer && r.team == scope.team && !r.is_missile())
            .min_by(|a, b| Self::distance(scope, a).total_cmp(&Self::distance(scope, b)))
    }

    /// Non-missile units on `team`, sorted by id.
    pub fn team_members(&self, team: TeamId) -> Vec<UnitId> {
        let mut members: Vec<UnitId> = self
            .records
            .iter()
            .filter(|r| r.team == team && !r.is_missile())
            .map(|r| r.id)
            .collect();
        members.sort();
        members
    }
}
