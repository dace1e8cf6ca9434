//! Inbound host messages: the closed dispatch model for the editor's
//! scripting sandbox.
//!
//! The host delivers each message as a line of whitespace-separated atoms.
//! The first atom is a message name in the host's routing convention; the
//! rest are mixed string/number tokens. Rather than open-ended dispatch by
//! name, everything parses into the [`HostMessage`] enum with an explicit
//! `Unknown` branch for names outside the known set.

/// One scalar atom from a host message.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Sym(String),
    Num(f64),
}

impl Token {
    /// Parse a single atom: anything that reads as a float is numeric.
    pub fn parse(atom: &str) -> Self {
        match atom.parse::<f64>() {
            Ok(n) => Token::Num(n),
            Err(_) => Token::Sym(atom.to_string()),
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Token::Num(n) => Some(*n),
            Token::Sym(_) => None,
        }
    }

    pub fn is_sym(&self, name: &str) -> bool {
        matches!(self, Token::Sym(s) if s == name)
    }
}

/// Message names the host uses to tag note-data lists.
const DATA_TAGS: [&str; 4] = ["get_selected_notes", "note", "notes", "list"];

/// A message from the host, dispatched by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
    /// Parameterless control message: clear the accumulator buffer.
    Reset,
    /// "select all notes" control message; acknowledged but ignored.
    SelectAll,
    /// Request for the extended (dictionary) note format, which the token
    /// stream cannot carry; warned about and ignored.
    ExtendedRequest,
    /// A tagged or untagged list of note-data tokens. The tag token (if
    /// any) is kept in `tokens` so sentinel and prefix detection see the
    /// list exactly as the host sent it.
    Data { tokens: Vec<Token> },
    /// Any other message name; treated as note data, logged by name.
    Unknown { name: String, tokens: Vec<Token> },
}

impl HostMessage {
    /// Parse one host line. Blank lines yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut atoms = line.split_whitespace().peekable();
        let first = *atoms.peek()?;

        match first {
            "bang" | "reset" => Some(HostMessage::Reset),
            "select_all_notes" => Some(HostMessage::SelectAll),
            "get_selected_notes_extended" => Some(HostMessage::ExtendedRequest),
            _ => {
                let tokens: Vec<Token> = atoms.map(Token::parse).collect();
                let tagged = DATA_TAGS.contains(&first)
                    || first == "done"
                    || matches!(tokens[0], Token::Num(_));
                if tagged {
                    Some(HostMessage::Data { tokens })
                } else {
                    Some(HostMessage::Unknown {
                        name: first.to_string(),
                        tokens,
                    })
                }
            }
        }
    }
}
