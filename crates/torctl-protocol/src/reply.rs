//! Multi-line reply accumulation

use serde::Serialize;

use crate::error::ProtocolError;
use crate::line::{ReplyLine, StatusCode};

/// Result of one command exchange
///
/// Always holds at least one line. Every line of the exchange carried the
/// same status code, which is `status_code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    status_code: StatusCode,
    lines: Vec<String>,
}

impl Reply {
    /// Build a reply from parsed wire lines
    ///
    /// The last line must be final and every earlier line must be a
    /// mid-reply line with the same status code.
    pub fn from_lines(lines: Vec<ReplyLine>) -> Result<Self, ProtocolError> {
        let mut builder = ReplyBuilder::default();
        let mut reply = None;

        for line in lines {
            if reply.is_some() {
                return Err(ProtocolError::IncompleteReply("lines after final line"));
            }
            reply = builder.push(line)?;
        }

        reply.ok_or(ProtocolError::IncompleteReply("no final line"))
    }

    /// Status code of the final line
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// Line bodies in wire order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether the status is a 2yz success
    pub fn is_success(&self) -> bool {
        self.status_code.is_success()
    }

    /// Consume the reply, returning its lines
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Incremental reply accumulator fed one line at a time
#[derive(Debug, Default)]
pub struct ReplyBuilder {
    status: Option<StatusCode>,
    lines: Vec<String>,
}

impl ReplyBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether mid-reply lines are waiting for their final line
    pub fn has_pending(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Add a line; returns the finished reply once a final line arrives
    pub fn push(&mut self, line: ReplyLine) -> Result<Option<Reply>, ProtocolError> {
        match self.status {
            Some(expected) if expected != line.status => {
                return Err(ProtocolError::StatusMismatch {
                    expected,
                    actual: line.status,
                });
            }
            _ => self.status = Some(line.status),
        }

        self.lines.push(line.body);

        if line.is_mid_reply {
            return Ok(None);
        }

        let status_code = line.status;
        self.status = None;
        Ok(Some(Reply {
            status_code,
            lines: std::mem::take(&mut self.lines),
        }))
    }
}
