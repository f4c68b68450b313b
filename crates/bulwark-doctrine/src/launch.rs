//! Launch authorization: can the seeker physically track onto the target now
//! and shortly after launch.

use bulwark_core::config::Tuning;
use bulwark_core::records::UnitBody;
use bulwark_core::types::{angle_between_deg, Position};
use bulwark_core::weapons::Missile;

/// Authorize a launch of `missile` at `aim_point` (the target position, or the
/// air-to-air fire solution for airborne targets).
pub fn launch_authorized(
    missile: &Missile,
    shooter: &UnitBody,
    target: &UnitBody,
    aim_point: Position,
    tuning: &Tuning,
) -> bool {
    let target_grounded = !target.flying;
    let factor = if shooter.is_grounded() || target_grounded || missile.all_aspect {
        tuning.launch_auth_relaxed_factor
    } else {
        tuning.launch_auth_strict_factor
    };
    let limit = missile.max_off_boresight_deg * factor;

    let now = angle_between_deg(shooter.forward, shooter.position.offset_to(&aim_point));
    if now >= limit {
        return false;
    }

    let future_shooter = shooter
        .position
        .extrapolate(&shooter.velocity, tuning.launch_auth_horizon_secs);
    let future_aim = aim_point.extrapolate(&target.velocity, tuning.launch_auth_horizon_secs);
    let later = angle_between_deg(shooter.forward, future_shooter.offset_to(&future_aim));
    later < limit
}
