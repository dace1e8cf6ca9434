//! Spelled pitch name <-> MIDI semitone codec.
//!
//! Converts between human-readable pitch spellings ("C4", "F#3", "Bb-1") and
//! MIDI note numbers on the fixed 0-127 scale. Spellings are a letter A-G
//! (case-insensitive), an optional single accidental (`#`, `b`, or the
//! Unicode sharp/flat forms), and a signed integer octave.
//!
//! `encode` always produces the sharp spelling, so the enharmonic pair
//! "C#4"/"Db4" both decode to 61 but encode back as "C#4".

use thiserror::Error;

/// Sharp-preferring chromatic scale used by [`encode`].
const CHROMATIC: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Pitch decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PitchError {
    /// The string does not match LETTER [ACCIDENTAL] OCTAVE.
    #[error("invalid pitch spelling: '{0}'")]
    InvalidFormat(String),

    /// Letter outside A-G. Unreachable through the normal grammar.
    #[error("unknown note letter: '{0}'")]
    UnknownLetter(char),

    /// The spelling is well-formed but lands outside MIDI 0-127.
    #[error("pitch out of MIDI range 0-127: '{0}'")]
    OutOfRange(String),
}

/// Decode a spelled pitch into its MIDI semitone number.
pub fn decode(pitch: &str) -> Result<u8, PitchError> {
    let spelled = pitch.trim();
    let mut chars = spelled.chars();

    let letter = chars
        .next()
        .ok_or_else(|| PitchError::InvalidFormat(pitch.to_string()))?;
    if !letter.is_ascii_alphabetic() {
        return Err(PitchError::InvalidFormat(pitch.to_string()));
    }

    let rest = chars.as_str();
    let (accidental, octave_text) = match rest.chars().next() {
        Some(c @ ('#' | '\u{266F}')) => (1i32, &rest[c.len_utf8()..]),
        Some(c @ ('b' | '\u{266D}')) => (-1i32, &rest[c.len_utf8()..]),
        _ => (0i32, rest),
    };

    let mut octave: i32 = octave_text
        .parse()
        .map_err(|_| PitchError::InvalidFormat(pitch.to_string()))?;

    let mut semitone: i32 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        other => return Err(PitchError::UnknownLetter(other)),
    };
    semitone += accidental;

    // Carry accidental overflow/underflow into the octave (Cb4 -> B3, B#3 -> C4).
    if semitone < 0 {
        semitone += 12;
        octave -= 1;
    } else if semitone > 11 {
        semitone -= 12;
        octave += 1;
    }

    let midi = (octave + 1) * 12 + semitone;
    if !(0..=127).contains(&midi) {
        return Err(PitchError::OutOfRange(pitch.to_string()));
    }

    Ok(midi as u8)
}

/// Encode a MIDI semitone number as its sharp-preferring spelled name.
///
/// Never fails: non-finite input maps to "C4", everything else is rounded
/// and clamped into 0-127.
pub fn encode(midi: f64) -> String {
    if !midi.is_finite() {
        return "C4".to_string();
    }
    let clamped = midi.round().clamp(0.0, 127.0) as u8;
    let octave = (clamped as i32) / 12 - 1;
    let name = CHROMATIC[(clamped % 12) as usize];
    format!("{}{}", name, octave)
}

/// Decode with a fallback instead of an error, for consumers that must not
/// abort on malformed input.
pub fn safe_decode(pitch: &str, fallback: u8) -> u8 {
    decode(pitch).unwrap_or(fallback)
}
