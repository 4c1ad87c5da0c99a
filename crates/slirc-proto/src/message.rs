//! Owned IRC message: parsing and serialization.

use std::fmt;
use std::str::FromStr;

use crate::error::MessageParseError;
use crate::parse::parse_line;
use crate::response::Response;

/// Maximum line length in bytes, including the trailing CRLF.
pub const MAX_LINE_LEN: usize = 512;

/// An owned IRC message.
///
/// The daemon routes on `command` and interprets `params` itself, so the
/// parameters are kept as plain strings rather than a typed command enum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Source of the message (`server.name` or `nick!user@host`).
    pub prefix: Option<String>,
    /// Command name (uppercased on parse) or three-digit numeric.
    pub command: String,
    /// Middle parameters followed by the trailing parameter, if any.
    pub params: Vec<String>,
}

impl Message {
    /// Build a message without a prefix.
    pub fn new(command: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command: command.into(),
            params,
        }
    }

    /// Build a numeric reply from `server`.
    pub fn numeric(server: &str, response: Response, params: &[&str]) -> Self {
        Self {
            prefix: Some(server.to_string()),
            command: response.code(),
            params: params.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Attach a prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Parameter at `idx`, if present.
    #[inline]
    pub fn arg(&self, idx: usize) -> Option<&str> {
        self.params.get(idx).map(String::as_str)
    }

    /// Nickname part of a `nick!user@host` prefix.
    pub fn source_nick(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .map(|p| p.split_once('!').map_or(p, |(nick, _)| nick))
    }
}

impl FromStr for Message {
    type Err = MessageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }
        if line.len() + 2 > MAX_LINE_LEN {
            return Err(MessageParseError::LineTooLong(line.len() + 2));
        }
        if line.contains(['\0', '\r', '\n']) {
            return Err(MessageParseError::IllegalCharacter);
        }

        let parsed = parse_line(line)
            .map_err(|position| MessageParseError::InvalidCommand { position })?;

        Ok(Self {
            prefix: parsed.prefix.map(str::to_string),
            command: parsed.command.to_ascii_uppercase(),
            params: parsed.params.iter().map(|p| p.to_string()).collect(),
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        f.write_str(&self.command)?;

        if let Some((last, middle)) = self.params.split_last() {
            for param in middle {
                write!(f, " {}", param)?;
            }
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                write!(f, " :{}", last)?;
            } else {
                write!(f, " {}", last)?;
            }
        }
        Ok(())
    }
}
