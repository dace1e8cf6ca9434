//! croonproto - Protocol types for the croon live-capture bridge.
//!
//! This crate defines the data exchanged between the three parties of the
//! capture pipeline:
//!
//! - the **host** (the MIDI editor's scripting sandbox) emits irregular
//!   token batches, modeled here as [`HostMessage`];
//! - the **accumulator** (magpie) reconstructs those batches into a
//!   [`CapturePayload`] and ships it to the bridge as JSON;
//! - the **coordinator** (stagehand) polls the bridge's latest-result slot,
//!   which answers with a [`BridgeLatest`].
//!
//! The `text` module carries the line-oriented note/chord grammars
//! (`PITCH START DURATION`, `SYMBOL START DURATION`) that the structured
//! types must round-trip through exactly.

pub mod host;
pub mod notes;
pub mod text;

pub use host::{HostMessage, Token};
pub use notes::{BridgeLatest, CapturePayload, Chord, Note, SessionDefaults};
pub use text::{
    chords_from_text, chords_to_text, notes_from_text, notes_to_text, LineError,
};
