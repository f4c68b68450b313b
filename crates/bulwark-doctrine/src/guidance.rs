//! Guidance collaborator: dynamic launch zones, lead points and bomb impact
//! prediction.
//!
//! The engine never flies a weapon itself. It asks a [`Guidance`]
//! implementation where a shot would go and whether a launch can reach.
//! [`KinematicGuidance`] is a straight-line default good enough for
//! headless runs and tests.

use bulwark_core::constants::GRAVITY;
use bulwark_core::records::UnitBody;
use bulwark_core::types::{Position, Velocity};
use bulwark_core::weapons::Missile;

/// Speed- and geometry-dependent launch window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchZone {
    pub min: f64,
    pub max: f64,
}

impl LaunchZone {
    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.min && distance <= self.max
    }
}

pub trait Guidance {
    /// Dynamic launch zone of `missile` fired from `shooter` at `target`.
    fn launch_zone(&self, missile: &Missile, shooter: &UnitBody, target: &UnitBody) -> LaunchZone;

    /// Lead point for a projectile of the given mean speed.
    fn fire_solution(&self, shooter: &UnitBody, target: &UnitBody, projectile_speed: f64) -> Position;

    /// Where a bomb released now would hit the plane `ground_z`.
    fn bomb_impact_point(&self, shooter: &UnitBody, ground_z: f64) -> Position;
}

/// Closing speed that stretches the launch zone by its full factor.
const REFERENCE_CLOSING_SPEED: f64 = 340.0;

/// Straight-line guidance: constant velocities, no drag.
#[derive(Debug, Clone, Copy, Default)]
pub struct KinematicGuidance;

impl Guidance for KinematicGuidance {
    fn launch_zone(&self, missile: &Missile, shooter: &UnitBody, target: &UnitBody) -> LaunchZone {
        let Some(envelope) = missile.mount.envelope else {
            return LaunchZone {
                min: 0.0,
                max: f64::INFINITY,
            };
        };
        let closing = closing_speed(
            &shooter.position,
            &shooter.velocity,
            &target.position,
            &target.velocity,
        );
        // Head-on shots reach further, tail chases fall short.
        let factor = (1.0 + closing / REFERENCE_CLOSING_SPEED * 0.5).clamp(0.5, 1.5);
        LaunchZone {
            min: envelope.min,
            max: envelope.max * factor,
        }
    }

    fn fire_solution(&self, shooter: &UnitBody, target: &UnitBody, projectile_speed: f64) -> Position {
        if projectile_speed <= 1.0 {
            return target.position;
        }
        let (lead, _) = calculate_lead_point(
            &target.position,
            &target.velocity,
            &shooter.position,
            projectile_speed,
        );
        lead
    }

    fn bomb_impact_point(&self, shooter: &UnitBody, ground_z: f64) -> Position {
        let height = (shooter.position.z - ground_z).max(0.0);
        let vz = shooter.velocity.z;
        let fall_time = (vz + (vz * vz + 2.0 * GRAVITY * height).sqrt()) / GRAVITY;
        Position::new(
            shooter.position.x + shooter.velocity.x * fall_time,
            shooter.position.y + shooter.velocity.y * fall_time,
            ground_z,
        )
    }
}

/// Closing velocity of A on B along the line of sight (positive when closing).
pub fn closing_speed(pos_a: &Position, vel_a: &Velocity, pos_b: &Position, vel_b: &Velocity) -> f64 {
    let Some(los) = pos_a.offset_to(pos_b).try_normalize() else {
        return 0.0;
    };
    (vel_a.as_vec() - vel_b.as_vec()).dot(los)
}

/// Estimate time-to-intercept using closing velocity.
///
/// Falls back to combined speed if the two are not closing.
pub fn estimate_tti(pos_a: &Position, vel_a: &Velocity, pos_b: &Position, vel_b: &Velocity) -> f64 {
    let range = pos_a.range_to(pos_b);
    if range < 1.0 {
        return 0.0;
    }
    let v_closing = closing_speed(pos_a, vel_a, pos_b, vel_b);
    if v_closing > 1.0 {
        range / v_closing
    } else {
        let speed = vel_a.speed() + vel_b.speed();
        if speed > 1.0 {
            range / speed
        } else {
            f64::MAX
        }
    }
}

/// Lead point by iterative prediction. Returns (lead position, time of flight).
pub fn calculate_lead_point(
    target_pos: &Position,
    target_vel: &Velocity,
    own_pos: &Position,
    projectile_speed: f64,
) -> (Position, f64) {
    let mut tof = own_pos.range_to(target_pos) / projectile_speed;
    for _ in 0..2 {
        let predicted = target_pos.extrapolate(target_vel, tof);
        tof = own_pos.range_to(&predicted) / projectile_speed;
    }
    (target_pos.extrapolate(target_vel, tof), tof)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_point_leads_crossing_target() {
        let target = Position::new(0.0, 1000.0, 0.0);
        let vel = Velocity::new(100.0, 0.0, 0.0);
        let (lead, tof) = calculate_lead_point(&target, &vel, &Position::default(), 1000.0);
        assert!(tof > 1.0);
        assert!(lead.x > 100.0, "lead point should be ahead of the target");
    }

    #[test]
    fn test_bomb_impact_from_level_flight() {
        let shooter = UnitBody {
            position: Position::new(0.0, 0.0, 490.5),
            velocity: Velocity::new(0.0, 100.0, 0.0),
            flying: true,
            surface: false,
            ..Default::default()
        };
        let impact = KinematicGuidance.bomb_impact_point(&shooter, 0.0);
        // sqrt(2 * 490.5 / 9.81) = 10 s of fall.
        assert!((impact.y - 1000.0).abs() < 1e-6);
        assert_eq!(impact.z, 0.0);
    }

    #[test]
    fn test_launch_zone_stretches_head_on() {
        let missile = Missile {
            mount: bulwark_core::weapons::Mount {
                envelope: Some(bulwark_core::weapons::RangeEnvelope {
                    min: 500.0,
                    max: 10_000.0,
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        let shooter = UnitBody {
            velocity: Velocity::new(0.0, 300.0, 0.0),
            ..Default::default()
        };
        let head_on = UnitBody {
            position: Position::new(0.0, 8000.0, 0.0),
            velocity: Velocity::new(0.0, -300.0, 0.0),
            ..Default::default()
        };
        let fleeing = UnitBody {
            position: Position::new(0.0, 8000.0, 0.0),
            velocity: Velocity::new(0.0, 600.0, 0.0),
            ..Default::default()
        };
        let near = KinematicGuidance.launch_zone(&missile, &shooter, &head_on);
        let far = KinematicGuidance.launch_zone(&missile, &shooter, &fleeing);
        assert_eq!(near.min, 500.0);
        assert!(near.max > 10_000.0);
        assert!(far.max < 10_000.0);
        assert!(near.contains(8000.0));
    }

    #[test]
    fn test_estimate_tti_closing() {
        let tti = estimate_tti(
            &Position::default(),
            &Velocity::new(0.0, 100.0, 0.0),
            &Position::new(0.0, 1000.0, 0.0),
            &Velocity::default(),
        );
        assert!((tti - 10.0).abs() < 1e-9);
    }
}
