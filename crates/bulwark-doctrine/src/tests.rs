#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use glam::DVec3;

    use bulwark_core::config::{PriorityWeights, Tuning};
    use bulwark_core::enums::{
        FuzeType, GuidanceMode, SensorKind, SlwKind, TargetingMode, WeaponClass,
    };
    use bulwark_core::records::{SensorFit, TargetRecord, UnitBody};
    use bulwark_core::types::{Position, TeamId, UnitId, Velocity, WeaponId};
    use bulwark_core::weapons::*;

    use crate::envelope::{can_engage, EnvelopeContext};
    use crate::guidance::KinematicGuidance;
    use crate::launch::launch_authorized;
    use crate::target_priority::{
        compute_sub_scores, display_score, selection_score, ObserverView, SubScores, TargetScore,
    };
    use crate::weapon_scoring::{select_weapon, ScoringContext};

    fn mount(min: f64, max: f64) -> Mount {
        Mount {
            name: "w".into(),
            envelope: Some(RangeEnvelope { min, max }),
            ammo: Ammo::Rounds(100),
            ..Default::default()
        }
    }

    fn turreted_gun(rpm: f64) -> Weapon {
        Weapon::Gun(Gun {
            mount: Mount {
                turret: Some(Turret::default()),
                ..mount(0.0, 2500.0)
            },
            rpm,
            caliber_mm: 20.0,
            ..Default::default()
        })
    }

    fn radar_missile() -> Weapon {
        Weapon::Missile(Missile {
            mount: mount(500.0, 10_000.0),
            targeting: TargetingMode::Radar,
            max_turn_rate: 30.0,
            proximity_radius: 10.0,
            ..Default::default()
        })
    }

    fn flying_shooter() -> UnitBody {
        UnitBody {
            position: Position::new(0.0, 0.0, 3000.0),
            velocity: Velocity::new(0.0, 200.0, 0.0),
            flying: true,
            surface: false,
            ..Default::default()
        }
    }

    fn airborne_target(distance: f64) -> TargetRecord {
        TargetRecord {
            id: UnitId(2),
            team: TeamId(1),
            body: UnitBody {
                position: Position::new(0.0, distance, 3000.0),
                velocity: Velocity::new(0.0, 200.0, 0.0),
                flying: true,
                surface: false,
                ..Default::default()
            },
            weapon_count: 2,
            is_vip: false,
            missile: None,
            engaging: None,
        }
    }

    fn envelope_ctx<'a>(
        shooter: &'a UnitBody,
        target: &'a TargetRecord,
        sensors: &'a SensorFit,
        tuning: &'a Tuning,
    ) -> EnvelopeContext<'a> {
        EnvelopeContext {
            shooter,
            target,
            distance: shooter.position.range_to(&target.position()),
            sensors,
            antirad_threat: false,
            infinite_ammo: false,
            tuning,
            guidance: &KinematicGuidance,
        }
    }

    fn scoring_ctx<'a>(envelope: EnvelopeContext<'a>) -> ScoringContext<'a> {
        ScoringContext {
            envelope,
            gun_range: 2500.0,
            missiles_away: 0,
            max_missiles: 1,
            pod_active: false,
            rwr_emitters: &[],
        }
    }

    #[test]
    fn test_envelope_rejects_beyond_lead_in_margin() {
        let tuning = Tuning::default();
        let sensors = SensorFit {
            radar: true,
            sonar: true,
            ..Default::default()
        };
        let shooter = flying_shooter();
        let target = airborne_target(1000.0);
        let weapons = [
            turreted_gun(600.0),
            radar_missile(),
            Weapon::Rocket(Rocket {
                mount: mount(0.0, 3000.0),
                rpm: 120.0,
                ..Default::default()
            }),
            Weapon::Bomb(Bomb {
                mount: mount(100.0, 4000.0),
                yield_kg: 200.0,
                ..Default::default()
            }),
            Weapon::Slw(Slw {
                mount: mount(200.0, 5000.0),
                kind: SlwKind::Torpedo,
                ..Default::default()
            }),
        ];
        for weapon in &weapons {
            let max = weapon.mount().max_range().unwrap_or_default();
            for factor in [1.21, 1.5, 3.0, 100.0] {
                let ctx = EnvelopeContext {
                    distance: max * factor,
                    ..envelope_ctx(&shooter, &target, &sensors, &tuning)
                };
                assert!(
                    !can_engage(weapon, &ctx).usable,
                    "{} usable at {factor} x max range",
                    weapon.class()
                );
            }
        }
    }

    #[test]
    fn test_envelope_rejects_inside_min_range_for_expendables() {
        let tuning = Tuning::default();
        let sensors = SensorFit {
            radar: true,
            sonar: true,
            ..Default::default()
        };
        let shooter = flying_shooter();
        let target = airborne_target(1000.0);
        let weapons = [
            radar_missile(),
            Weapon::Bomb(Bomb {
                mount: mount(100.0, 4000.0),
                ..Default::default()
            }),
            Weapon::Slw(Slw {
                mount: mount(200.0, 5000.0),
                ..Default::default()
            }),
        ];
        for weapon in &weapons {
            let min = weapon.mount().min_range();
            for distance in [0.0, min * 0.5, min - 0.1] {
                let ctx = EnvelopeContext {
                    distance,
                    ..envelope_ctx(&shooter, &target, &sensors, &tuning)
                };
                assert!(!can_engage(weapon, &ctx).usable, "{} usable at {distance}", weapon.class());
            }
        }
    }

    #[test]
    fn test_envelope_without_range_is_always_usable() {
        let tuning = Tuning::default();
        let sensors = SensorFit::default();
        let shooter = flying_shooter();
        let target = airborne_target(1000.0);
        let gun = Weapon::Gun(Gun::default());
        let ctx = EnvelopeContext {
            distance: 1.0e9,
            ..envelope_ctx(&shooter, &target, &sensors, &tuning)
        };
        assert!(can_engage(&gun, &ctx).usable);
    }

    #[test]
    fn test_envelope_readiness_and_ammo() {
        let tuning = Tuning::default();
        let sensors = SensorFit::default();
        let shooter = flying_shooter();
        let target = airborne_target(1000.0);
        let ctx = envelope_ctx(&shooter, &target, &sensors, &tuning);

        let mut gun = turreted_gun(600.0);
        assert!(can_engage(&gun, &ctx).usable);

        gun.mount_mut().readiness.overheated = true;
        assert!(!can_engage(&gun, &ctx).usable);

        gun.mount_mut().readiness = Readiness {
            ready_soon: false,
            ..Default::default()
        };
        assert!(!can_engage(&gun, &ctx).usable);

        gun.mount_mut().readiness = Readiness::default();
        gun.mount_mut().ammo = Ammo::Rounds(0);
        assert!(!can_engage(&gun, &ctx).usable);

        let unlimited = EnvelopeContext {
            infinite_ammo: true,
            ..envelope_ctx(&shooter, &target, &sensors, &tuning)
        };
        assert!(can_engage(&gun, &unlimited).usable);
    }

    #[test]
    fn test_envelope_turret_tolerance_grounded_vs_airborne() {
        let tuning = Tuning::default();
        let sensors = SensorFit::default();
        let limited = Weapon::Gun(Gun {
            mount: Mount {
                turret: Some(Turret {
                    max_off_axis_deg: 45.0,
                }),
                ..mount(0.0, 2500.0)
            },
            rpm: 600.0,
            ..Default::default()
        });
        // Target 55 degrees off the nose.
        let angle = 55.0_f64.to_radians();
        let mut target = airborne_target(0.0);
        target.body.position = Position::new(1000.0 * angle.sin(), 1000.0 * angle.cos(), 0.0);

        let grounded = UnitBody::default();
        let ctx = envelope_ctx(&grounded, &target, &sensors, &tuning);
        assert!(!can_engage(&limited, &ctx).usable);

        let airborne = UnitBody {
            flying: true,
            surface: false,
            ..Default::default()
        };
        let ctx = envelope_ctx(&airborne, &target, &sensors, &tuning);
        assert!(can_engage(&limited, &ctx).usable);
    }

    #[test]
    fn test_radar_missile_refused_under_antirad_threat() {
        let tuning = Tuning::default();
        let sensors = SensorFit {
            radar: true,
            ..Default::default()
        };
        let shooter = flying_shooter();
        let target = airborne_target(4000.0);
        let missile = radar_missile();

        let verdict = can_engage(&missile, &envelope_ctx(&shooter, &target, &sensors, &tuning));
        assert!(verdict.usable);
        assert_eq!(verdict.enable_sensor, Some(SensorKind::Radar));

        let threatened = EnvelopeContext {
            antirad_threat: true,
            ..envelope_ctx(&shooter, &target, &sensors, &tuning)
        };
        assert!(!can_engage(&missile, &threatened).usable);
    }

    #[test]
    fn test_bomb_needs_airborne_shooter() {
        let tuning = Tuning::default();
        let sensors = SensorFit::default();
        let bomb = Weapon::Bomb(Bomb {
            mount: mount(100.0, 4000.0),
            ..Default::default()
        });
        let target = airborne_target(1000.0);
        let flying = flying_shooter();
        assert!(can_engage(&bomb, &envelope_ctx(&flying, &target, &sensors, &tuning)).usable);
        let grounded = UnitBody {
            position: flying.position,
            ..Default::default()
        };
        assert!(!can_engage(&bomb, &envelope_ctx(&grounded, &target, &sensors, &tuning)).usable);
    }

    #[test]
    fn test_scenario_gun_chosen_when_radar_missile_has_no_radar() {
        let tuning = Tuning::default();
        let shooter = flying_shooter();
        let target = airborne_target(1500.0);
        let loadout = Loadout::new([turreted_gun(600.0), radar_missile()]);

        let no_radar = SensorFit::default();
        let ctx = scoring_ctx(envelope_ctx(&shooter, &target, &no_radar, &tuning));
        let choice = select_weapon(&loadout, &ctx).expect("gun is usable");
        assert_eq!(choice.class, WeaponClass::Gun);
        assert_eq!(choice.weapon, WeaponId(0));

        // With a radar aboard the missile outranks direct fire from the air.
        let radar = SensorFit {
            radar: true,
            ..Default::default()
        };
        let ctx = scoring_ctx(envelope_ctx(&shooter, &target, &radar, &tuning));
        let choice = select_weapon(&loadout, &ctx).expect("missile is usable");
        assert_eq!(choice.class, WeaponClass::Missile);
        assert_eq!(choice.enable_sensor, Some(SensorKind::Radar));
    }

    #[test]
    fn test_priority_tag_dominates_score() {
        let tuning = Tuning::default();
        let sensors = SensorFit::default();
        let shooter = flying_shooter();
        let target = airborne_target(1000.0);

        let mut slow = turreted_gun(60.0);
        slow.mount_mut().priority = 1;
        let fast = turreted_gun(6000.0);
        let loadout = Loadout::new([fast, slow]);
        let ctx = scoring_ctx(envelope_ctx(&shooter, &target, &sensors, &tuning));
        let choice = select_weapon(&loadout, &ctx).expect("guns are usable");
        assert_eq!(choice.weapon, WeaponId(1));

        // Against a missile a laser normally beats a gun, unless the gun is tagged higher.
        let mut missile_target = airborne_target(1000.0);
        missile_target.missile = Some(bulwark_core::records::MissileInfo {
            source: UnitId(9),
            target: Some(UnitId(1)),
            targeting: TargetingMode::Radar,
        });
        let laser = Weapon::DefenseLaser(Laser {
            mount: mount(0.0, 3000.0),
            rpm: 1000.0,
            damage: 50.0,
            ..Default::default()
        });
        let mut gun = turreted_gun(100.0);
        let ctx = scoring_ctx(envelope_ctx(&shooter, &missile_target, &sensors, &tuning));
        let plain = Loadout::new([gun.clone(), laser.clone()]);
        assert_eq!(
            select_weapon(&plain, &ctx).map(|c| c.class),
            Some(WeaponClass::DefenseLaser)
        );
        gun.mount_mut().priority = 2;
        let tagged = Loadout::new([laser, gun]);
        assert_eq!(
            select_weapon(&tagged, &ctx).map(|c| c.class),
            Some(WeaponClass::Gun)
        );
    }

    #[test]
    fn test_anti_missile_gun_prefers_turret_and_airburst() {
        let tuning = Tuning::default();
        let sensors = SensorFit::default();
        let shooter = flying_shooter();
        let mut target = airborne_target(1000.0);
        target.missile = Some(bulwark_core::records::MissileInfo {
            source: UnitId(9),
            target: Some(UnitId(1)),
            targeting: TargetingMode::Heat,
        });
        let fixed = Weapon::Gun(Gun {
            mount: mount(0.0, 2500.0),
            rpm: 1000.0,
            ..Default::default()
        });
        let flak = Weapon::Gun(Gun {
            mount: Mount {
                turret: Some(Turret::default()),
                ..mount(0.0, 2500.0)
            },
            rpm: 400.0,
            fuze: FuzeType::Flak,
            ..Default::default()
        });
        let loadout = Loadout::new([fixed, flak]);
        let ctx = scoring_ctx(envelope_ctx(&shooter, &target, &sensors, &tuning));
        let choice = select_weapon(&loadout, &ctx).expect("guns are usable");
        // 400 * 2 * 1.5 = 1200 beats 1000.
        assert_eq!(choice.weapon, WeaponId(1));
        assert!((choice.score - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_surface_prefers_stationary_gps_missile_then_bomb() {
        let tuning = Tuning::default();
        let sensors = SensorFit::default();
        let shooter = UnitBody {
            position: Position::new(0.0, 0.0, 1000.0),
            ..flying_shooter()
        };
        let target = TargetRecord {
            id: UnitId(5),
            team: TeamId(1),
            body: UnitBody {
                position: Position::new(0.0, 1500.0, 0.0),
                ..Default::default()
            },
            weapon_count: 1,
            is_vip: false,
            missile: None,
            engaging: None,
        };
        let bomb = Weapon::Bomb(Bomb {
            mount: mount(100.0, 8000.0),
            yield_kg: 500.0,
            blast_radius: 50.0,
            ..Default::default()
        });
        let gps = Weapon::Missile(Missile {
            mount: mount(500.0, 20_000.0),
            targeting: TargetingMode::Gps,
            guidance: GuidanceMode::Cruise,
            yield_kg: 100.0,
            ..Default::default()
        });
        let gun = turreted_gun(600.0);
        let loadout = Loadout::new([gun, bomb, gps]);
        let ctx = scoring_ctx(envelope_ctx(&shooter, &target, &sensors, &tuning));
        assert_eq!(
            select_weapon(&loadout, &ctx).map(|c| c.class),
            Some(WeaponClass::Missile)
        );

        let saturated = ScoringContext {
            missiles_away: 1,
            ..scoring_ctx(envelope_ctx(&shooter, &target, &sensors, &tuning))
        };
        // Expendables respect the per-target cap; only the gun remains.
        assert_eq!(
            select_weapon(&loadout, &saturated).map(|c| c.class),
            Some(WeaponClass::Gun)
        );
    }

    #[test]
    fn test_underwater_depth_charge_only_from_above() {
        let tuning = Tuning::default();
        let sensors = SensorFit::default();
        let sub = TargetRecord {
            id: UnitId(7),
            team: TeamId(1),
            body: UnitBody {
                position: Position::new(0.0, 500.0, -50.0),
                underwater: true,
                surface: false,
                ..Default::default()
            },
            weapon_count: 1,
            is_vip: false,
            missile: None,
            engaging: None,
        };
        let charge = Weapon::Slw(Slw {
            mount: mount(0.0, 1000.0),
            kind: SlwKind::DepthCharge,
            yield_kg: 100.0,
            blast_radius: 20.0,
            ..Default::default()
        });
        let torpedo = Weapon::Slw(Slw {
            mount: mount(0.0, 4000.0),
            kind: SlwKind::Torpedo,
            yield_kg: 300.0,
            blast_radius: 20.0,
            ..Default::default()
        });
        let loadout = Loadout::new([torpedo, charge]);

        let ship = UnitBody::default();
        let ctx = scoring_ctx(envelope_ctx(&ship, &sub, &sensors, &tuning));
        let choice = select_weapon(&loadout, &ctx).expect("usable");
        assert_eq!(choice.weapon, WeaponId(1));

        let submarine = UnitBody {
            position: Position::new(0.0, 0.0, -100.0),
            underwater: true,
            surface: false,
            ..Default::default()
        };
        let ctx = scoring_ctx(envelope_ctx(&submarine, &sub, &sensors, &tuning));
        let choice = select_weapon(&loadout, &ctx).expect("usable");
        assert_eq!(choice.weapon, WeaponId(0));
    }

    #[test]
    fn test_no_usable_weapon_is_none() {
        let tuning = Tuning::default();
        let sensors = SensorFit::default();
        let shooter = flying_shooter();
        let target = airborne_target(50_000.0);
        let loadout = Loadout::new([turreted_gun(600.0)]);
        let ctx = scoring_ctx(envelope_ctx(&shooter, &target, &sensors, &tuning));
        assert!(select_weapon(&loadout, &ctx).is_none());
    }

    #[test]
    fn test_score_formula_with_fixed_sub_scores() {
        let sub = SubScores {
            range: 2.0,
            air_preference: 1.0,
            ata: 0.5,
            friendlies_engaging: 1.0,
            threat: 0.5,
            ..Default::default()
        };
        let weights = PriorityWeights {
            range: 1.0,
            air_preference: 3.0,
            ata: 1.0,
            friendlies_engaging: 1.0,
            threat: 1.0,
            ..PriorityWeights::zero()
        };
        let score = TargetScore::new(UnitId(1), sub, &weights, 1.1);
        assert!((score.total - 7.7).abs() < 1e-9);
        assert!((display_score(&sub, &weights, 1.1) - 7.7).abs() < 1e-9);
        // Selection adds one and only biases the current target.
        assert!((selection_score(&sub, &weights, 1.1, false) - 8.0).abs() < 1e-9);
        assert!((selection_score(&sub, &weights, 1.1, true) - 8.8).abs() < 1e-9);
    }

    fn observer<'a>(
        body: &'a UnitBody,
        teammates: &'a [UnitId],
        miss: &'a HashMap<UnitId, f64>,
    ) -> ObserverView<'a> {
        ObserverView {
            id: UnitId(1),
            body,
            weapon_count: 2,
            max_weapon_range: 10_000.0,
            teammates,
            team_vips: &[],
            incoming_threat: None,
            miss_distances: miss,
            evasion_miss_threshold: 25.0,
        }
    }

    #[test]
    fn test_sub_scores_geometry() {
        let body = UnitBody {
            forward: DVec3::Y,
            ..flying_shooter()
        };
        let miss = HashMap::new();
        let view = observer(&body, &[], &miss);

        let ahead = airborne_target(5000.0);
        let sub = compute_sub_scores(&ahead, &view, 0);
        assert!((sub.range - 0.5).abs() < 1e-9);
        assert!((sub.ata - 1.0).abs() < 1e-9);
        assert_eq!(sub.air_preference, 1.0);
        // Same velocity: no closure.
        assert_eq!(sub.closure, 0.0);
        assert_eq!(sub.weapon_number, 0.0);
        assert_eq!(sub.threat, 0.0);

        let mut behind = airborne_target(-5000.0);
        behind.body.velocity = Velocity::default();
        let sub = compute_sub_scores(&behind, &view, 0);
        assert!(sub.ata.abs() < 1e-9);
        // 5000 m at 200 m/s is 25 s of a 60 s horizon.
        assert!((sub.closure - (1.0 - 25.0 / 60.0)).abs() < 1e-9);
    }

    #[test]
    fn test_sub_scores_friendlies_and_protection() {
        let body = flying_shooter();
        let teammates = [UnitId(10), UnitId(11)];
        let miss = HashMap::from([(UnitId(2), 25.0)]);
        let view = ObserverView {
            team_vips: &[UnitId(11)],
            ..observer(&body, &teammates, &miss)
        };
        let mut target = airborne_target(3000.0);
        target.engaging = Some(UnitId(11));
        target.is_vip = true;

        let alone = compute_sub_scores(&target, &view, 0);
        let crowded = compute_sub_scores(&target, &view, 3);
        assert_eq!(alone.friendlies_engaging, 1.0);
        assert_eq!(crowded.friendlies_engaging, 0.0);
        assert_eq!(alone.protect_teammate, 1.0);
        assert_eq!(alone.protect_vip, 1.0);
        assert_eq!(alone.attack_vip, 1.0);
        // Missed by exactly the evasion threshold: halfway threat.
        assert!((alone.threat - 0.5).abs() < 1e-9);

        let threatened = ObserverView {
            incoming_threat: Some(UnitId(2)),
            ..observer(&body, &teammates, &miss)
        };
        assert_eq!(compute_sub_scores(&target, &threatened, 0).threat, 1.0);
    }

    #[test]
    fn test_launch_authorization_boresight() {
        let tuning = Tuning::default();
        let missile = Missile {
            max_off_boresight_deg: 60.0,
            ..Default::default()
        };
        let shooter = UnitBody {
            forward: DVec3::Y,
            ..flying_shooter()
        };
        let target = airborne_target(0.0).body;

        // 30 degrees off: inside 0.75 x 60 but outside 0.35 x 60.
        let angle = 30.0_f64.to_radians();
        let aim = Position::new(
            4000.0 * angle.sin(),
            4000.0 * angle.cos(),
            shooter.position.z,
        );
        let strict = UnitBody {
            position: aim,
            ..target
        };
        assert!(!launch_authorized(&missile, &shooter, &strict, aim, &tuning));

        let all_aspect = Missile {
            all_aspect: true,
            ..missile.clone()
        };
        assert!(launch_authorized(&all_aspect, &shooter, &strict, aim, &tuning));

        let ground = UnitBody {
            position: aim,
            velocity: Velocity::default(),
            ..Default::default()
        };
        assert!(launch_authorized(&missile, &shooter, &ground, aim, &tuning));
    }

    #[test]
    fn test_default_seeker_still_gated_by_boresight() {
        let tuning = Tuning::default();
        let missile = Missile::default();
        assert_eq!(missile.max_off_boresight_deg, 360.0);

        let shooter = UnitBody {
            forward: DVec3::Y,
            ..flying_shooter()
        };
        let behind = Position::new(0.0, -4000.0, 3000.0);
        let target = UnitBody {
            position: behind,
            ..airborne_target(0.0).body
        };
        // Strict limit is 0.35 x 360 = 126 degrees; dead astern is 180.
        assert!(!launch_authorized(&missile, &shooter, &target, behind, &tuning));

        let all_aspect = Missile {
            all_aspect: true,
            ..Missile::default()
        };
        assert!(launch_authorized(&all_aspect, &shooter, &target, behind, &tuning));
    }

    #[test]
    fn test_launch_authorization_rejects_target_leaving_seeker() {
        let tuning = Tuning::default();
        let missile = Missile {
            max_off_boresight_deg: 60.0,
            ..Default::default()
        };
        let shooter = UnitBody {
            forward: DVec3::Y,
            ..flying_shooter()
        };
        // 10 degrees off the nose at 1000 m, inside the 21 degree strict limit.
        let angle = 10.0_f64.to_radians();
        let aim = Position::new(1000.0 * angle.sin(), 1000.0 * angle.cos(), 3000.0);
        let pacing = UnitBody {
            position: aim,
            ..airborne_target(0.0).body
        };
        assert!(launch_authorized(&missile, &shooter, &pacing, aim, &tuning));

        // Crossing fast enough to be ~53 degrees off after the look-ahead.
        let crossing = UnitBody {
            velocity: Velocity::new(300.0, 0.0, 0.0),
            ..pacing
        };
        assert!(!launch_authorized(&missile, &shooter, &crossing, aim, &tuning));

        let short_horizon = Tuning {
            launch_auth_horizon_secs: 0.0,
            ..Tuning::default()
        };
        assert!(launch_authorized(&missile, &shooter, &crossing, aim, &short_horizon));
    }

    // ---- Weapon ranking details ----

    fn surface_target(distance: f64) -> TargetRecord {
        TargetRecord {
            id: UnitId(5),
            team: TeamId(1),
            body: UnitBody {
                position: Position::new(0.0, distance, 0.0),
                ..Default::default()
            },
            weapon_count: 1,
            is_vip: false,
            missile: None,
            engaging: None,
        }
    }

    #[test]
    fn test_surface_laser_is_last_resort() {
        let tuning = Tuning::default();
        let sensors = SensorFit::default();
        let shooter = UnitBody {
            position: Position::new(0.0, 0.0, 1000.0),
            ..flying_shooter()
        };
        let target = surface_target(1500.0);
        let laser = Weapon::DefenseLaser(Laser {
            mount: mount(0.0, 3000.0),
            rpm: 1000.0,
            damage: 50.0,
            ..Default::default()
        });
        // Neither ground attack guidance nor a pod: only the generic rank applies.
        let heat = Weapon::Missile(Missile {
            mount: mount(500.0, 10_000.0),
            targeting: TargetingMode::Heat,
            ..Default::default()
        });
        let ctx = scoring_ctx(envelope_ctx(&shooter, &target, &sensors, &tuning));

        let loadout = Loadout::new([laser.clone(), heat]);
        let choice = select_weapon(&loadout, &ctx).expect("both usable");
        assert_eq!(choice.class, WeaponClass::Missile);
        assert_eq!(choice.weapon, WeaponId(1));

        let laser_only = Loadout::new([laser]);
        assert_eq!(
            select_weapon(&laser_only, &ctx).map(|c| c.class),
            Some(WeaponClass::DefenseLaser)
        );
    }

    #[test]
    fn test_surface_rocket_vetoed_inside_own_blast() {
        let tuning = Tuning::default();
        let sensors = SensorFit::default();
        let ship = UnitBody::default();
        let rocket = Weapon::Rocket(Rocket {
            mount: mount(0.0, 2000.0),
            rpm: 60.0,
            blast_radius: 100.0,
            ..Default::default()
        });
        let loadout = Loadout::new([rocket, turreted_gun(600.0)]);

        let close = surface_target(80.0);
        let ctx = scoring_ctx(envelope_ctx(&ship, &close, &sensors, &tuning));
        assert_eq!(
            select_weapon(&loadout, &ctx).map(|c| c.class),
            Some(WeaponClass::Gun)
        );

        let clear = surface_target(500.0);
        let ctx = scoring_ctx(envelope_ctx(&ship, &clear, &sensors, &tuning));
        assert_eq!(
            select_weapon(&loadout, &ctx).map(|c| c.class),
            Some(WeaponClass::Rocket)
        );
    }

    fn rocket(fuze: FuzeType, turret: Option<Turret>) -> Weapon {
        Weapon::Rocket(Rocket {
            mount: Mount {
                turret,
                ..mount(0.0, 2500.0)
            },
            rpm: 600.0,
            fuze,
            ..Default::default()
        })
    }

    fn single_score(weapon: Weapon, ctx: &ScoringContext) -> f64 {
        select_weapon(&Loadout::new([weapon]), ctx)
            .expect("weapon is usable")
            .score
    }

    #[test]
    fn test_airborne_rocket_cone_and_fuze_scoring() {
        let tuning = Tuning::default();
        let sensors = SensorFit::default();
        let shooter = flying_shooter();
        let ahead = airborne_target(1000.0);
        let ctx = scoring_ctx(envelope_ctx(&shooter, &ahead, &sensors, &tuning));

        // 600 rpm x 1.5 proximity bonus / 2.
        let score = single_score(rocket(FuzeType::Proximity, None), &ctx);
        assert!((score - 450.0).abs() < 1e-9);
        let score = single_score(rocket(FuzeType::Impact, None), &ctx);
        assert!((score - 150.0).abs() < 1e-9);

        let angle = 30.0_f64.to_radians();
        let mut off_axis = airborne_target(0.0);
        off_axis.body.position = Position::new(1000.0 * angle.sin(), 1000.0 * angle.cos(), 3000.0);
        let ctx = scoring_ctx(envelope_ctx(&shooter, &off_axis, &sensors, &tuning));

        // Fixed mount outside its 5 degree cone.
        let score = single_score(rocket(FuzeType::Proximity, None), &ctx);
        assert!((score - 4.5).abs() < 1e-9);
        // A turret covers the angle and earns its bonus.
        let score = single_score(rocket(FuzeType::Proximity, Some(Turret::default())), &ctx);
        assert!((score - 675.0).abs() < 1e-9);
    }

    #[test]
    fn test_air_gun_prefers_caliber_against_large_targets() {
        let tuning = Tuning::default();
        let sensors = SensorFit::default();
        let shooter = flying_shooter();
        let fast = Weapon::Gun(Gun {
            mount: mount(0.0, 2500.0),
            rpm: 1000.0,
            caliber_mm: 20.0,
            ..Default::default()
        });
        let heavy = Weapon::Gun(Gun {
            mount: mount(0.0, 2500.0),
            rpm: 300.0,
            caliber_mm: 120.0,
            ..Default::default()
        });
        let loadout = Loadout::new([fast, heavy]);

        let small = airborne_target(1000.0);
        let ctx = scoring_ctx(envelope_ctx(&shooter, &small, &sensors, &tuning));
        assert_eq!(select_weapon(&loadout, &ctx).map(|c| c.weapon), Some(WeaponId(0)));

        let mut large = airborne_target(1000.0);
        large.body.radius = 10.0;
        let ctx = scoring_ctx(envelope_ctx(&shooter, &large, &sensors, &tuning));
        let choice = select_weapon(&loadout, &ctx).expect("guns are usable");
        assert_eq!(choice.weapon, WeaponId(1));
        assert!((choice.score - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_contact_fuze_rocket_penalty_against_missiles() {
        let tuning = Tuning {
            contact_fuze_rocket_penalty: 0.5,
            min_range_penalty: 0.2,
            ..Tuning::default()
        };
        let sensors = SensorFit::default();
        let shooter = flying_shooter();
        let mut target = airborne_target(1000.0);
        target.missile = Some(bulwark_core::records::MissileInfo {
            source: UnitId(9),
            target: Some(UnitId(1)),
            targeting: TargetingMode::Radar,
        });
        let ctx = scoring_ctx(envelope_ctx(&shooter, &target, &sensors, &tuning));

        // 600 rpm / 2 x 0.5; the min range penalty plays no part.
        let score = single_score(rocket(FuzeType::Impact, None), &ctx);
        assert!((score - 150.0).abs() < 1e-9);
        let score = single_score(rocket(FuzeType::Proximity, None), &ctx);
        assert!((score - 300.0).abs() < 1e-9);
    }
}
