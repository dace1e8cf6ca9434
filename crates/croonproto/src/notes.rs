//! Core note/chord structures and the capture wire payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single melody note in quarter-note beat units.
///
/// `pitch` is a spelled name ("C4", "F#3"); consumers validate it through
/// the pitchwise codec and treat undecodable spellings as invalid notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub pitch: String,
    /// Beat offset from the start of the selection, >= 0.
    pub start: f64,
    /// Beat length, > 0.
    pub duration: f64,
}

impl Note {
    pub fn new(pitch: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            pitch: pitch.into(),
            start,
            duration,
        }
    }
}

/// A chord entry, structurally parallel to [`Note`] but with an opaque
/// symbol ("Am", "F") instead of a decodable pitch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub symbol: String,
    pub start: f64,
    pub duration: f64,
}

impl Chord {
    pub fn new(symbol: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            symbol: symbol.into(),
            start,
            duration,
        }
    }
}

/// Fixed session parameters attached to every flushed capture.
///
/// The host-side capture path has no UI to ask, so the accumulator stamps
/// these defaults; the backend is free to override them downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDefaults {
    pub bpm: f64,
    pub mood: String,
    pub length_value: f64,
    pub length_unit: String,
    pub adventureness: f64,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            mood: "happy".to_string(),
            length_value: 4.0,
            length_unit: "bar".to_string(),
            adventureness: 35.0,
        }
    }
}

/// The accumulator's flush output, serialized as JSON for the bridge.
///
/// `full_track` is the complete reconstructed sequence in arrival order.
/// `added_notes` is always empty on the host capture path: deciding what is
/// "new" relative to a baseline is the backend's job, not the host's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturePayload {
    pub full_track: Vec<Note>,
    pub added_notes: Vec<Note>,
    pub bpm: f64,
    pub mood: String,
    pub length_value: f64,
    pub length_unit: String,
    pub adventureness: f64,
}

impl CapturePayload {
    /// Build a payload from an accumulated track plus session defaults.
    pub fn from_track(full_track: Vec<Note>, defaults: &SessionDefaults) -> Self {
        Self {
            full_track,
            added_notes: Vec::new(),
            bpm: defaults.bpm,
            mood: defaults.mood.clone(),
            length_value: defaults.length_value,
            length_unit: defaults.length_unit.clone(),
            adventureness: defaults.adventureness,
        }
    }
}

/// The bridge's latest-result slot as read by the coordinator's polls.
///
/// `has_data = false` means nothing has been flushed since the slot was
/// last cleared; the remaining fields are then empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeLatest {
    #[serde(default)]
    pub has_data: bool,
    #[serde(default)]
    pub full_track: Vec<Note>,
    #[serde(default)]
    pub added_notes: Vec<Note>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl BridgeLatest {
    /// An empty slot: no capture available yet.
    pub fn empty() -> Self {
        Self {
            has_data: false,
            full_track: Vec::new(),
            added_notes: Vec::new(),
            timestamp: None,
        }
    }
}
