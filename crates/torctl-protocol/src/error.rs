//! Protocol error types

use thiserror::Error;

use crate::line::StatusCode;

/// Errors that can occur while framing or parsing control protocol traffic
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Line too short or status code not three decimal digits
    #[error("malformed status line: {0:?}")]
    MalformedStatusLine(String),

    /// Reply status differs from the one the exchange requires
    #[error("unexpected status during {context}: {code}")]
    UnexpectedStatus {
        context: &'static str,
        code: StatusCode,
    },

    /// Lines of a single reply carried different status codes
    #[error("status mismatch within reply: expected {expected}, got {actual}")]
    StatusMismatch {
        expected: StatusCode,
        actual: StatusCode,
    },

    /// Peer closed the stream in the middle of a line
    #[error("stream closed mid-line: {bytes} bytes without terminator")]
    IncompleteLine { bytes: usize },

    /// Line exceeds the maximum accepted length
    #[error("line too long: {size} bytes exceeds maximum of {max} bytes")]
    LineTooLong { size: usize, max: usize },

    /// Line is not valid UTF-8
    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    /// Command would break line framing
    #[error("invalid command {0:?}: embedded line terminator")]
    InvalidCommand(String),

    /// Reply contained no lines or ended on a mid-reply line
    #[error("incomplete reply: {0}")]
    IncompleteReply(&'static str),

    /// PROTOCOLINFO body does not follow the expected grammar
    #[error("malformed PROTOCOLINFO reply: {0}")]
    MalformedProtocolInfo(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
