//! The message-driven note accumulator.
//!
//! Logically a single persistent state with the buffer as payload: messages
//! arrive one at a time from the host loop, mutate the buffer synchronously,
//! and optionally produce an outbound event. There is no caller to return
//! errors to, so failures ("flush with nothing buffered") are events too.

use croonproto::{CapturePayload, HostMessage, Note, SessionDefaults, Token};
use tracing::{debug, warn};

/// Outbound signals produced by the accumulator.
#[derive(Debug, Clone, PartialEq)]
pub enum AccumulatorEvent {
    /// The buffer was cleared on the host's reset signal.
    ResetAck,
    /// The termination sentinel arrived with notes buffered.
    Flush(CapturePayload),
    /// The termination sentinel arrived with an empty buffer.
    NoNotes,
}

/// Accumulates note triples from host token batches until flushed.
#[derive(Debug)]
pub struct Accumulator {
    buffer: Vec<Note>,
    defaults: SessionDefaults,
}

impl Accumulator {
    pub fn new(defaults: SessionDefaults) -> Self {
        Self {
            buffer: Vec::new(),
            defaults,
        }
    }

    /// Number of complete notes currently buffered.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Feed one host message through the state machine.
    pub fn handle(&mut self, message: HostMessage) -> Option<AccumulatorEvent> {
        match message {
            HostMessage::Reset => {
                self.buffer.clear();
                debug!("reset: buffer cleared");
                Some(AccumulatorEvent::ResetAck)
            }
            HostMessage::SelectAll => {
                debug!("select_all_notes control message ignored");
                None
            }
            HostMessage::ExtendedRequest => {
                warn!("extended note request returns a dictionary; use the plain list form");
                None
            }
            HostMessage::Data { tokens } => self.ingest(tokens),
            HostMessage::Unknown { name, tokens } => {
                debug!(%name, "untagged host message, treating as note data");
                self.ingest(tokens)
            }
        }
    }

    /// Process one token batch: sentinel check, prefix strip, header skip,
    /// then triple grouping.
    fn ingest(&mut self, mut tokens: Vec<Token>) -> Option<AccumulatorEvent> {
        // Termination sentinel: a lone "done", optionally with one prefix
        // token ("get_selected_notes done").
        if tokens.len() <= 2 && tokens.iter().any(|t| t.is_sym("done")) {
            return Some(self.flush());
        }

        // Drop everything up to and including the "note" list-prefix marker.
        if let Some(pos) = tokens.iter().position(|t| t.is_sym("note")) {
            tokens.drain(..=pos);
        }

        // Summary header ("notes 8") is metadata, not note data.
        if tokens.len() >= 2 && tokens[0].is_sym("notes") {
            debug!("skipping summary header");
            return None;
        }

        let nums: Vec<f64> = tokens.iter().filter_map(Token::as_num).collect();
        if nums.is_empty() {
            debug!("no numeric data in batch");
            return None;
        }

        // Group into (pitch, start, duration); 1-2 trailing leftovers that
        // cannot complete a triple are dropped silently.
        for triple in nums.chunks_exact(3) {
            self.buffer.push(Note {
                pitch: pitchwise::encode(triple[0]),
                start: triple[1],
                duration: triple[2],
            });
        }

        debug!(buffered = self.buffer.len(), "accumulated batch");
        None
    }

    fn flush(&mut self) -> AccumulatorEvent {
        if self.buffer.is_empty() {
            warn!("flush requested with no notes buffered");
            return AccumulatorEvent::NoNotes;
        }

        let payload =
            CapturePayload::from_track(std::mem::take(&mut self.buffer), &self.defaults);
        debug!(notes = payload.full_track.len(), "flushing capture payload");
        AccumulatorEvent::Flush(payload)
    }
}
