//! Events published by the engine for observers and team subscribers.

use serde::{Deserialize, Serialize};

use crate::enums::{DefenseSubsystem, WeaponClass};
use crate::types::{TeamId, UnitId, WeaponId};

/// Team membership notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TeamEvent {
    TeamChanged { unit: UnitId, new_team: TeamId },
}

/// Notable engine decisions, in the order they were made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    GuardModeChanged {
        unit: UnitId,
        enabled: bool,
    },
    TargetChanged {
        unit: UnitId,
        target: Option<UnitId>,
    },
    WeaponSelected {
        unit: UnitId,
        weapon: Option<WeaponId>,
        class: Option<WeaponClass>,
    },
    ChoreographyStarted {
        unit: UnitId,
        target: UnitId,
        weapon: WeaponId,
    },
    ChoreographyFinished {
        unit: UnitId,
        fired: bool,
    },
    CountermeasureTriggered {
        unit: UnitId,
        subsystem: DefenseSubsystem,
    },
    HelpRequested {
        from: UnitId,
        to: UnitId,
        threat: UnitId,
        swapped: bool,
    },
}
