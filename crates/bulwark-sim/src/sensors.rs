//! Sensor collaborator interface.
//!
//! The engine never models sensors itself. Each tick it asks a [`SensorFeed`]
//! for threat scans, per-team detections and lock/aim feedback.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use bulwark_core::records::{SensorFeedback, ThreatSnapshot};
use bulwark_core::types::{TeamId, UnitId};

pub trait SensorFeed {
    /// Incoming missiles, gunfire and emitters seen by `observer` inside its
    /// field of view and range.
    fn scan_threats(&self, observer: UnitId, field_of_view_deg: f64, range: f64) -> ThreatSnapshot;

    /// Whether `team` currently detects `target`.
    fn detect(&self, team: TeamId, target: UnitId) -> bool;

    /// Lock and aim state of `unit`'s sensors and launchers.
    fn feedback(&self, unit: UnitId) -> SensorFeedback;
}

/// Table-driven sensor feed for headless runs and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptedSensors {
    pub threats: HashMap<UnitId, ThreatSnapshot>,
    pub feedback: HashMap<UnitId, SensorFeedback>,
    /// Every team detects every unit.
    pub omniscient: bool,
    pub detections: HashSet<(TeamId, UnitId)>,
}

impl ScriptedSensors {
    pub fn omniscient() -> Self {
        Self {
            omniscient: true,
            ..Default::default()
        }
    }
}

impl SensorFeed for ScriptedSensors {
    fn scan_threats(&self, observer: UnitId, _field_of_view_deg: f64, _range: f64) -> ThreatSnapshot {
        self.threats.get(&observer).cloned().unwrap_or_default()
    }

    fn detect(&self, team: TeamId, target: UnitId) -> bool {
        self.omniscient || self.detections.contains(&(team, target))
    }

    fn feedback(&self, unit: UnitId) -> SensorFeedback {
        self.feedback.get(&unit).copied().unwrap_or_default()
    }
}
