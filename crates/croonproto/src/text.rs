//! Line-oriented note/chord text grammars.
//!
//! A note line is `PITCH START DURATION`; a chord line is
//! `SYMBOL START DURATION`. Entries are whitespace-separated, one per line,
//! blank lines ignored. The UI's text buffers speak this form, so the
//! structured types must round-trip through it exactly.

use thiserror::Error;

use crate::notes::{Chord, Note};

/// Errors from parsing a note/chord text block. Line numbers are 1-based
/// and count non-blank lines as the user sees them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineError {
    #[error("line {line}: expected three whitespace-separated fields, got '{text}'")]
    Malformed { line: usize, text: String },

    #[error("line {line}: {source}")]
    BadPitch {
        line: usize,
        source: pitchwise::PitchError,
    },

    #[error("line {line}: start and duration must be numeric")]
    BadNumber { line: usize },

    #[error("line {line}: start must be >= 0")]
    NegativeStart { line: usize },

    #[error("line {line}: duration must be > 0")]
    NonPositiveDuration { line: usize },
}

fn split_entry(line_no: usize, line: &str) -> Result<(String, f64, f64), LineError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(LineError::Malformed {
            line: line_no,
            text: line.to_string(),
        });
    }

    let start: f64 = fields[1]
        .parse()
        .map_err(|_| LineError::BadNumber { line: line_no })?;
    let duration: f64 = fields[2]
        .parse()
        .map_err(|_| LineError::BadNumber { line: line_no })?;

    if start < 0.0 {
        return Err(LineError::NegativeStart { line: line_no });
    }
    if duration <= 0.0 {
        return Err(LineError::NonPositiveDuration { line: line_no });
    }

    Ok((fields[0].to_string(), start, duration))
}

/// Render notes as one `PITCH START DURATION` entry per line.
pub fn notes_to_text(notes: &[Note]) -> String {
    notes
        .iter()
        .map(|n| format!("{} {} {}", n.pitch, n.start, n.duration))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a note text block. Pitches are validated through the codec.
pub fn notes_from_text(text: &str) -> Result<Vec<Note>, LineError> {
    let mut notes = Vec::new();
    for (line_no, line) in non_blank_lines(text) {
        let (pitch, start, duration) = split_entry(line_no, line)?;
        pitchwise::decode(&pitch).map_err(|source| LineError::BadPitch {
            line: line_no,
            source,
        })?;
        notes.push(Note {
            pitch,
            start,
            duration,
        });
    }
    Ok(notes)
}

/// Render chords as one `SYMBOL START DURATION` entry per line.
pub fn chords_to_text(chords: &[Chord]) -> String {
    chords
        .iter()
        .map(|c| format!("{} {} {}", c.symbol, c.start, c.duration))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a chord text block. Symbols are opaque, not pitch-decoded.
pub fn chords_from_text(text: &str) -> Result<Vec<Chord>, LineError> {
    let mut chords = Vec::new();
    for (line_no, line) in non_blank_lines(text) {
        let (symbol, start, duration) = split_entry(line_no, line)?;
        chords.push(Chord {
            symbol,
            start,
            duration,
        });
    }
    Ok(chords)
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(i, l)| (i + 1, l))
}
