//! Core data models for machine state-change events
//!
//! `RawEvent` mirrors what the events endpoint sends, with every field
//! optional so that a malformed record never fails a whole response.
//! `Event` is the normalized, immutable record the timeline works with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operating condition of the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MachineState {
    Running,
    #[default]
    Stopped,
}

impl MachineState {
    /// Wire label used by the events endpoint
    pub fn label(&self) -> &'static str {
        match self {
            MachineState::Running => "MARCHA",
            MachineState::Stopped => "PARO",
        }
    }

    /// Numeric encoding for plotting (1 = running, 0 = stopped)
    pub fn level(&self) -> u8 {
        match self {
            MachineState::Running => 1,
            MachineState::Stopped => 0,
        }
    }

    /// Anything other than "MARCHA" is treated as stopped
    pub fn from_wire(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("MARCHA") {
            MachineState::Running
        } else {
            MachineState::Stopped
        }
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A normalized state-change record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Opaque identifier assigned by the endpoint
    pub id: String,

    /// State the machine entered
    pub state: MachineState,

    /// Instant of the change
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(id: impl Into<String>, state: MachineState, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            state,
            timestamp,
        }
    }
}

/// Event record exactly as received (`{ id, estado, hora }`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub id: Option<serde_json::Value>,

    #[serde(default)]
    pub estado: Option<serde_json::Value>,

    #[serde(default)]
    pub hora: Option<serde_json::Value>,
}

impl RawEvent {
    pub fn new(id: impl Into<String>, estado: &str, hora: &str) -> Self {
        Self {
            id: Some(serde_json::Value::String(id.into())),
            estado: Some(serde_json::Value::String(estado.to_string())),
            hora: Some(serde_json::Value::String(hora.to_string())),
        }
    }
}
