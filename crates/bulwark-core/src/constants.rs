//! Simulation constants and fixed timing parameters.

/// Controller tick rate (Hz).
pub const TICK_RATE: u32 = 30;

/// Seconds per tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

// --- Target selection ---

/// How long an override target from a call for help stays in force.
pub const OVERRIDE_TARGET_SECS: f64 = 15.0;

/// Minimum time a team remembers a detected target.
pub const TARGET_MEMORY_SECS: f64 = 30.0;

/// A missile threat is considered covered once this many friendlies engage it.
pub const MISSILE_THREAT_MAX_ENGAGING: usize = 2;

// --- Situational flags ---

/// Under-fire and under-attack flags clear this long after the last report.
pub const UNDER_FIRE_RESET_SECS: f64 = 1.0;

/// Missile warning clears this long after the last inbound missile.
pub const MISSILE_WARNING_RESET_SECS: f64 = 1.0;

// --- Choreographies ---

/// Bay doors need this long to open before a launch.
pub const BAY_OPEN_SECS: f64 = 1.0;

/// Radar lock attempts give up after this long.
pub const RADAR_LOCK_TIMEOUT_SECS: f64 = 2.0;

/// Delay between radar lock attempts.
pub const RADAR_LOCK_RETRY_SECS: f64 = 0.25;

/// Settle time after a turret radar lock request.
pub const TURRET_RADAR_SETTLE_SECS: f64 = 0.5;

/// Missile turret slew timeout for radar-guided launches.
pub const MISSILE_TURRET_TIMEOUT_SECS: f64 = 5.0;

/// Minimum heat seeker search time.
pub const HEAT_SEEK_MIN_SECS: f64 = 5.0;

/// Heat lock must fall within this distance of the target.
pub const HEAT_LOCK_TOLERANCE: f64 = 40.0;

/// Anti-radiation emitter must fall within this distance of the target.
pub const EMITTER_TOLERANCE: f64 = 20.0;

/// Laser designation must fall within this distance of the target.
pub const LASER_DESIGNATION_TOLERANCE: f64 = 10.0;

/// Targeting pod point must fall within this distance before slaving turrets.
pub const POD_SLAVE_TOLERANCE: f64 = 20.0;

/// Extra turret arc allowed when assigning secondary targets.
pub const TURRET_ASSIGN_TOLERANCE_DEG: f64 = 7.0;

// --- Bomb run ---

/// Minimum bomb attempt duration.
pub const BOMB_ATTEMPT_MIN_SECS: f64 = 12.0;

/// Minimum release radius.
pub const BOMB_MIN_RELEASE_RADIUS: f64 = 50.0;

/// Minimum distance inside which an overshoot triggers an extend.
pub const BOMB_EXTEND_MIN_RANGE: f64 = 800.0;

/// Bays open once the aim point is within this many release radii.
pub const BOMB_BAY_RADII: f64 = 20.0;

/// Release is suppressed above this bank angle.
pub const BOMB_MAX_BANK_DEG: f64 = 45.0;

/// Delay between releases without a ripple rate.
pub const BOMB_RELEASE_GAP_SECS: f64 = 0.06;

/// Wait before asking to extend after the last release.
pub const BOMB_EXTEND_DELAY_SECS: f64 = 1.0;

/// Speed below which a target counts as stationary.
pub const STATIONARY_SPEED: f64 = 1.0;

/// Standard gravity (m/s²).
pub const GRAVITY: f64 = 9.81;
