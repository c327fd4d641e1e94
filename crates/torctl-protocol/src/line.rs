//! Status line parsing
//!
//! Every reply line on the control port has a fixed positional layout:
//!
//! ```text
//! 250-PROTOCOLINFO 1
//! ^^^^^^^^^^^^^^^^^^
//! |  ||
//! |  |+-- body (byte 4 onward)
//! |  +--- separator: '-' = more lines follow, anything else = final line
//! +------ status code: three decimal digits
//! ```

use serde::Serialize;
use std::fmt;

use crate::error::ProtocolError;

/// Separator marking a mid-reply line
pub const MID_REPLY_SEPARATOR: char = '-';

/// Three-digit reply status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StatusCode(u16);

impl StatusCode {
    /// `250 OK`
    pub const OK: StatusCode = StatusCode(250);

    /// Create a status code from its numeric value
    pub fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric value
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Whether this is a positive completion reply (2yz)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

/// A single parsed reply line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyLine {
    /// Status code from the first three characters
    pub status: StatusCode,
    /// True when more lines of the same reply follow
    pub is_mid_reply: bool,
    /// Everything after the separator
    pub body: String,
}

impl ReplyLine {
    /// Parse a line with its terminator already stripped
    ///
    /// [`ControlCodec`](crate::ControlCodec) also trims trailing whitespace,
    /// so a final line with an empty body (`"250 "`) arrives as `"250"` and
    /// is rejected as malformed.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let bytes = line.as_bytes();
        if bytes.len() < 4 || !bytes[..3].iter().all(u8::is_ascii_digit) {
            return Err(ProtocolError::MalformedStatusLine(line.to_string()));
        }

        let status = bytes[..3]
            .iter()
            .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'));

        // The first three bytes are ASCII, so byte 3 starts a char
        let mut rest = line[3..].chars();
        let separator = rest.next();

        Ok(Self {
            status: StatusCode(status),
            is_mid_reply: separator == Some(MID_REPLY_SEPARATOR),
            body: rest.as_str().to_string(),
        })
    }

    /// Whether this line terminates its reply
    pub fn is_final(&self) -> bool {
        !self.is_mid_reply
    }
}
