//! Per-unit guard configuration, target-priority weights and the tuned
//! scoring constants.

use serde::{Deserialize, Serialize};

use crate::enums::TargetStrategy;
use crate::error::{CoreError, Result};

pub(crate) const DEFAULT_SCAN_INTERVAL_SECS: f64 = 3.0;
pub(crate) const DEFAULT_GUARD_ANGLE_DEG: f64 = 360.0;
pub(crate) const DEFAULT_GUARD_RANGE: f64 = 20_000.0;
pub(crate) const DEFAULT_GUN_RANGE: f64 = 2_500.0;
pub(crate) const DEFAULT_TARGET_BIAS: f64 = 1.3;
pub(crate) const DEFAULT_CM_THRESHOLD_SECS: f64 = 5.0;
// Documented operator ranges.
const SCAN_INTERVAL_RANGE: (f64, f64) = (0.5, 60.0);
const MULTI_TARGET_RANGE: (f64, f64) = (1.0, 10.0);
const MAX_MISSILES_RANGE: (f64, f64) = (1.0, 18.0);

/// Guard mode settings for one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub scan_interval_secs: f64,
    /// Auto-fire burst; below 0.01 s the burst is half the scan interval.
    pub fire_burst_secs: f64,
    pub auto_fire_cos_adjustment: f64,
    /// Field of view for target acquisition and launches.
    pub guard_angle_deg: f64,
    pub guard_range: f64,
    pub gun_range: f64,
    pub multi_target: u32,
    pub max_missiles_on_target: u32,
    pub strategy: TargetStrategy,
    pub target_missiles: bool,
    pub target_bias: f64,
    pub weights: PriorityWeights,
    pub is_vip: bool,
    pub infinite_ammo: bool,
    pub allow_ramming: bool,
    pub call_for_help: bool,
    /// Scan timer speed-up while a missile is inbound.
    pub missile_scan_urgency: f64,
    pub countermeasures: CountermeasureConfig,
    pub tuning: Tuning,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
            fire_burst_secs: 0.0,
            auto_fire_cos_adjustment: 1.0,
            guard_angle_deg: DEFAULT_GUARD_ANGLE_DEG,
            guard_range: DEFAULT_GUARD_RANGE,
            gun_range: DEFAULT_GUN_RANGE,
            multi_target: 1,
            max_missiles_on_target: 1,
            strategy: TargetStrategy::default(),
            target_missiles: true,
            target_bias: DEFAULT_TARGET_BIAS,
            weights: PriorityWeights::default(),
            is_vip: false,
            infinite_ammo: false,
            allow_ramming: false,
            call_for_help: true,
            missile_scan_urgency: 2.0,
            countermeasures: CountermeasureConfig::default(),
            tuning: Tuning::default(),
        }
    }
}

impl GuardConfig {
    /// Decode and validate a configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GuardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every setting against its documented range.
    pub fn validate(&self) -> Result<()> {
        check(
            "scan_interval_secs",
            self.scan_interval_secs,
            SCAN_INTERVAL_RANGE,
        )?;
        check(
            "multi_target",
            f64::from(self.multi_target),
            MULTI_TARGET_RANGE,
        )?;
        check(
            "max_missiles_on_target",
            f64::from(self.max_missiles_on_target),
            MAX_MISSILES_RANGE,
        )?;
        check("guard_angle_deg", self.guard_angle_deg, (0.0, 360.0))?;
        check("guard_range", self.guard_range, (0.0, f64::MAX))?;
        check("gun_range", self.gun_range, (0.0, f64::MAX))?;
        check("fire_burst_secs", self.fire_burst_secs, (0.0, 60.0))?;
        check("target_bias", self.target_bias, (0.0, 10.0))?;
        check("missile_scan_urgency", self.missile_scan_urgency, (1.0, 10.0))?;
        self.countermeasures.validate()?;
        self.tuning.validate()
    }

    /// Burst handed to auto-fire.
    pub fn burst_secs(&self) -> f64 {
        if self.fire_burst_secs < 0.01 {
            self.scan_interval_secs / 2.0
        } else {
            self.fire_burst_secs
        }
    }
}

fn check(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<()> {
    if value.is_nan() || value < min || value > max {
        return Err(CoreError::ConfigOutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Weights of the target priority sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
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

impl PriorityWeights {
    /// All weights zero.
    pub fn zero() -> Self {
        Self {
            range: 0.0,
            air_preference: 0.0,
            ata: 0.0,
            aod: 0.0,
            accel: 0.0,
            closure: 0.0,
            weapon_number: 0.0,
            mass: 0.0,
            friendlies_engaging: 0.0,
            threat: 0.0,
            protect_teammate: 0.0,
            protect_vip: 0.0,
            attack_vip: 0.0,
        }
    }
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            aod: 2.0,
            friendlies_engaging: 1.0,
            ..Self::zero()
        }
    }
}

/// Countermeasure timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountermeasureConfig {
    /// Flares and chaff only fire when the threat closes within this many seconds.
    pub threshold_secs: f64,
    pub flare_repetition: u32,
    pub flare_interval_secs: f64,
    pub flare_wait_secs: f64,
    pub chaff_repetition: u32,
    pub chaff_interval_secs: f64,
    pub chaff_wait_secs: f64,
    pub jammer_secs: f64,
    pub cloak_secs: f64,
    pub salvo_interval_secs: f64,
}

impl Default for CountermeasureConfig {
    fn default() -> Self {
        Self {
            threshold_secs: DEFAULT_CM_THRESHOLD_SECS,
            flare_repetition: 3,
            flare_interval_secs: 0.2,
            flare_wait_secs: 0.7,
            chaff_repetition: 2,
            chaff_interval_secs: 0.5,
            chaff_wait_secs: 0.6,
            jammer_secs: 10.0,
            cloak_secs: 10.0,
            salvo_interval_secs: 1.0,
        }
    }
}

impl CountermeasureConfig {
    fn validate(&self) -> Result<()> {
        check("countermeasures.threshold_secs", self.threshold_secs, (0.0, 60.0))?;
        check(
            "countermeasures.flare_repetition",
            f64::from(self.flare_repetition),
            (1.0, 20.0),
        )?;
        check(
            "countermeasures.chaff_repetition",
            f64::from(self.chaff_repetition),
            (1.0, 20.0),
        )?;
        check(
            "countermeasures.flare_interval_secs",
            self.flare_interval_secs,
            (0.0, 10.0),
        )?;
        check(
            "countermeasures.chaff_interval_secs",
            self.chaff_interval_secs,
            (0.0, 10.0),
        )?;
        Ok(())
    }
}

/// Empirically tuned scoring constants, kept adjustable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Multiple of max range inside which a weapon starts aiming.
    pub lead_in_margin: f64,
    pub turret_bonus: f64,
    pub anti_missile_turret_bonus: f64,
    pub fuze_bonus: f64,
    pub rocket_accel_bonus: f64,
    pub min_range_penalty: f64,
    /// Rockets without a proximity fuze against missiles.
    pub contact_fuze_rocket_penalty: f64,
    /// Airborne rockets without a proximity fuze rarely connect.
    pub unfuzed_rocket_factor: f64,
    pub fire_cone_penalty: f64,
    pub laser_min_range_penalty: f64,
    pub pulsed_laser_factor: f64,
    pub moving_target_yield_factor: f64,
    pub guided_bomb_factor: f64,
    /// Above this radius guns are scored by caliber.
    pub large_target_radius: f64,
    /// Above this radius ground guns are scored by impact energy.
    pub heavy_ground_target_radius: f64,
    pub turret_tolerance_airborne_deg: f64,
    pub turret_tolerance_grounded_deg: f64,
    pub fire_cone_deg: f64,
    pub underwater_rocket_reach_per_thrust_sec: f64,
    pub underwater_laser_reach_fraction: f64,
    pub saturated_gun_range_fraction: f64,
    pub closest_target_hysteresis: f64,
    pub closest_target_angle_bias: f64,
    /// Miss distance at which incoming fire stops counting as a threat.
    pub evasion_miss_threshold: f64,
    /// Release radius once a targeting pod has designated the aim point.
    pub pod_release_radius: f64,
    /// Look-ahead horizon for launch authorization.
    pub launch_auth_horizon_secs: f64,
    /// Boresight factor for easy shots: grounded shooter or target, or an all-aspect seeker.
    pub launch_auth_relaxed_factor: f64,
    pub launch_auth_strict_factor: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            lead_in_margin: 1.2,
            turret_bonus: 1.5,
            anti_missile_turret_bonus: 2.0,
            fuze_bonus: 1.5,
            rocket_accel_bonus: 1.5,
            min_range_penalty: 0.01,
            contact_fuze_rocket_penalty: 0.01,
            unfuzed_rocket_factor: 0.5,
            fire_cone_penalty: 0.01,
            laser_min_range_penalty: 0.00001,
            pulsed_laser_factor: 0.5,
            moving_target_yield_factor: 2.0,
            guided_bomb_factor: 2.0,
            large_target_radius: 8.0,
            heavy_ground_target_radius: 4.0,
            turret_tolerance_airborne_deg: 15.0,
            turret_tolerance_grounded_deg: 0.0,
            fire_cone_deg: 5.0,
            underwater_rocket_reach_per_thrust_sec: 100.0,
            underwater_laser_reach_fraction: 0.1,
            saturated_gun_range_fraction: 0.75,
            closest_target_hysteresis: 1.1,
            closest_target_angle_bias: 2.0,
            evasion_miss_threshold: 25.0,
            pod_release_radius: 500.0,
            launch_auth_horizon_secs: 2.0,
            launch_auth_relaxed_factor: 0.75,
            launch_auth_strict_factor: 0.35,
        }
    }
}

impl Tuning {
    fn validate(&self) -> Result<()> {
        check("tuning.lead_in_margin", self.lead_in_margin, (1.0, 10.0))?;
        check("tuning.min_range_penalty", self.min_range_penalty, (0.0, 1.0))?;
        check("tuning.fire_cone_penalty", self.fire_cone_penalty, (0.0, 1.0))?;
        check(
            "tuning.contact_fuze_rocket_penalty",
            self.contact_fuze_rocket_penalty,
            (0.0, 1.0),
        )?;
        check(
            "tuning.launch_auth_relaxed_factor",
            self.launch_auth_relaxed_factor,
            (0.0, 1.0),
        )?;
        check(
            "tuning.launch_auth_strict_factor",
            self.launch_auth_strict_factor,
            (0.0, 1.0),
        )?;
        check(
            "tuning.saturated_gun_range_fraction",
            self.saturated_gun_range_fraction,
            (0.0, 1.0),
        )?;
        Ok(())
    }
}
