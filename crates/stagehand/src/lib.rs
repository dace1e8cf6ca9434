//! stagehand - capture session coordinator for the croon bridge.
//!
//! The bridge backend exposes a single capture slot: the client arms it,
//! nudges the host over the backend's UDP relay, then polls for the latest
//! result until it shows up or the attempt budget runs out. stagehand wraps
//! that dance in a [`Coordinator`] that keeps one session per capture purpose
//! (melody or chords), supersedes duplicates, and fences every event behind
//! a generation counter so a cancelled session's timers can never speak.

pub mod bridge;
pub mod coordinator;

pub use bridge::{BridgeClient, BridgeError, HttpBridgeClient};
pub use coordinator::{
    CaptureConfig, CaptureError, CaptureEvent, CapturePurpose, Coordinator,
};
