//! Target priority scorer.
//!
//! Each sub-score is a pure function of the target and the observer's
//! kinematic and threat state. The weighted sum feeds target selection and
//! is also kept for operator display.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use bulwark_core::config::PriorityWeights;
use bulwark_core::constants::GRAVITY;
use bulwark_core::records::{TargetRecord, UnitBody};
use bulwark_core::types::UnitId;

/// Closure times beyond this many seconds score zero.
const CLOSURE_HORIZON_SECS: f64 = 60.0;

/// Independently computed sub-scores for one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub range: f64,
    pub air_preference: f64,
    pub ata: f64,
    pub aod: f64,
    pub accel: f64,
    pub closure: f64,
    pub weapon_number: f64,
    pub mass: f64,
    pub friendlies_engaging: f64,
    pub threat: f64,
    pub protect_teammate: f64,
    pub protect_vip: f64,
    pub attack_vip: f64,
}

impl SubScores {
    /// Σ weight × sub-score.
    pub fn weighted_sum(&self, w: &PriorityWeights) -> f64 {
        w.range * self.range
            + w.air_preference * self.air_preference
            + w.ata * self.ata
            + w.aod * self.aod
            + w.accel * self.accel
            + w.closure * self.closure
            + w.weapon_number * self.weapon_number
            + w.mass * self.mass
            + w.friendlies_engaging * self.friendlies_engaging
            + w.threat * self.threat
            + w.protect_teammate * self.protect_teammate
            + w.protect_vip * self.protect_vip
            + w.attack_vip * self.attack_vip
    }
}

/// One evaluated target, as shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetScore {
    pub target: UnitId,
    pub sub: SubScores,
    pub total: f64,
}

impl TargetScore {
    pub fn new(target: UnitId, sub: SubScores, weights: &PriorityWeights, bias: f64) -> Self {
        Self {
            target,
            sub,
            total: display_score(&sub, weights, bias),
        }
    }
}

/// `bias × Σ(weight × sub-score)`.
pub fn display_score(sub: &SubScores, weights: &PriorityWeights, bias: f64) -> f64 {
    bias * sub.weighted_sum(weights)
}

/// Score used to rank candidates. The bias only applies to the current
/// target, which keeps selection from flapping between near-equal targets.
pub fn selection_score(sub: &SubScores, weights: &PriorityWeights, bias: f64, is_current: bool) -> f64 {
    let bias = if is_current { bias } else { 1.0 };
    bias * (1.0 + sub.weighted_sum(weights))
}

/// The observer's side of every sub-score.
pub struct ObserverView<'a> {
    pub id: UnitId,
    pub body: &'a UnitBody,
    pub weapon_count: u32,
    /// Longest engagement range in the observer's loadout.
    pub max_weapon_range: f64,
    pub teammates: &'a [UnitId],
    pub team_vips: &'a [UnitId],
    /// Unit that launched the missile currently inbound, if any.
    pub incoming_threat: Option<UnitId>,
    /// Latest miss distance per attacker that has fired on the observer.
    pub miss_distances: &'a HashMap<UnitId, f64>,
    pub evasion_miss_threshold: f64,
}

/// Compute every sub-score for `target`. `friendlies_engaging` counts the
/// observer's teammates currently engaging it.
pub fn compute_sub_scores(
    target: &TargetRecord,
    observer: &ObserverView,
    friendlies_engaging: usize,
) -> SubScores {
    let own = observer.body;
    let offset = own.position.offset_to(&target.position());
    let distance = offset.length();
    let direction = offset.try_normalize();

    let range = if observer.max_weapon_range > 0.0 {
        1.0 - (distance / observer.max_weapon_range).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let ata = direction.map_or(0.0, |dir| {
        let cos = own.forward.dot(dir).clamp(-1.0, 1.0);
        ((cos + 1.0) / 2.0).powi(2)
    });

    let aod = direction.map_or(1.0, |dir| {
        let theta = own.forward.dot(dir).clamp(-1.0, 1.0).acos();
        let cos_half = (theta / 2.0).cos();
        (((cos_half * cos_half + 1.0) * 100.0 / distance.max(10.0)) / 2.0).clamp(0.0, 1.0)
    });

    let accel = 0.1 * (target.body.forward_accel / GRAVITY).clamp(0.0, 10.0);

    let rel_speed = (own.velocity.as_vec() - target.velocity().as_vec()).length();
    let closure = if rel_speed > f64::EPSILON {
        1.0 - (distance / rel_speed).clamp(0.0, CLOSURE_HORIZON_SECS) / CLOSURE_HORIZON_SECS
    } else {
        0.0
    };

    let weapon_number = if target.weapon_count == 0 {
        0.0
    } else {
        let theirs = f64::from(target.weapon_count);
        ((theirs - f64::from(observer.weapon_count)) / theirs).max(0.0)
    };

    let mass = if target.body.mass > 0.0 && own.mass > 0.0 {
        ((target.body.mass / own.mass).log10() / 2.0).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    let friendlies = if observer.teammates.is_empty() {
        0.0
    } else {
        let extra = friendlies_engaging.saturating_sub(1) as f64;
        1.0 - (extra / observer.teammates.len() as f64).clamp(0.0, 1.0)
    };

    let threat = if observer.incoming_threat == Some(target.id) {
        1.0
    } else if let Some(&miss) = observer.miss_distances.get(&target.id) {
        let e = observer.evasion_miss_threshold;
        if e > 0.0 {
            1.0 - miss.clamp(0.0, 2.0 * e) / (2.0 * e)
        } else {
            1.0
        }
    } else {
        0.0
    };

    let victim = target.engaging;
    let protect_teammate = victim.is_some_and(|v| observer.teammates.contains(&v));
    let protect_vip = victim.is_some_and(|v| observer.team_vips.contains(&v));

    SubScores {
        range,
        air_preference: if target.body.flying { 1.0 } else { 0.0 },
        ata,
        aod,
        accel,
        closure,
        weapon_number,
        mass,
        friendlies_engaging: friendlies,
        threat,
        protect_teammate: f64::from(u8::from(protect_teammate)),
        protect_vip: f64::from(u8::from(protect_vip)),
        attack_vip: f64::from(u8::from(target.is_vip)),
    }
}
