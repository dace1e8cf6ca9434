//! magpie - token stream accumulator for the croon live-capture bridge.
//!
//! magpie sits next to the MIDI editor's scripting sandbox and turns its
//! irregular token stream into discrete note events. The host routes the
//! current selection out one message at a time; each message is a line of
//! whitespace-separated atoms (see `croonproto::HostMessage`). The
//! [`accumulator::Accumulator`] collects complete `(pitch, start, duration)`
//! triples until the termination sentinel arrives, then flushes a single
//! `CapturePayload` that the runner ships to the bridge as a JSON datagram.
//!
//! There is exactly one accumulator buffer per host session. Correctness
//! across captures depends on the host sending a reset between them; the
//! reset message clears the buffer unconditionally.

pub mod accumulator;
pub mod emitter;

pub use accumulator::{Accumulator, AccumulatorEvent};
pub use emitter::BridgeEmitter;
