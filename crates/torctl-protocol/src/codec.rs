//! Tokio codec for newline-framed control protocol lines

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;

/// Maximum accepted line length in bytes, terminator excluded
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Codec splitting the byte stream into lines and terminating commands
///
/// Decoded lines have the `\n` terminator and any trailing whitespace
/// (including `\r`) removed.
#[derive(Debug, Default)]
pub struct ControlCodec {
    /// Bytes of `src` already searched for a terminator
    next_index: usize,
}

impl ControlCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self { next_index: 0 }
    }
}

impl Decoder for ControlCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let newline = src[self.next_index..].iter().position(|b| *b == b'\n');

        let Some(offset) = newline else {
            if src.len() > MAX_LINE_LENGTH {
                return Err(ProtocolError::LineTooLong {
                    size: src.len(),
                    max: MAX_LINE_LENGTH,
                });
            }
            // Need more data
            self.next_index = src.len();
            return Ok(None);
        };

        let line_len = self.next_index + offset;
        self.next_index = 0;

        if line_len > MAX_LINE_LENGTH {
            return Err(ProtocolError::LineTooLong {
                size: line_len,
                max: MAX_LINE_LENGTH,
            });
        }

        let raw = src.split_to(line_len + 1);
        let line = std::str::from_utf8(&raw[..line_len]).map_err(|_| ProtocolError::InvalidUtf8)?;

        Ok(Some(line.trim_end().to_string()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }

        if src.is_empty() {
            Ok(None)
        } else {
            Err(ProtocolError::IncompleteLine { bytes: src.len() })
        }
    }
}

impl<T> Encoder<T> for ControlCodec
where
    T: AsRef<str>,
{
    type Error = ProtocolError;

    fn encode(&mut self, command: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let command = command.as_ref();
        if command.contains(['\r', '\n']) {
            return Err(ProtocolError::InvalidCommand(command.to_string()));
        }

        dst.reserve(command.len() + 1);
        dst.put_slice(command.as_bytes());
        dst.put_u8(b'\n');

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single_line() {
        let mut codec = ControlCodec::new();
        let mut buf = BytesMut::from("250 OK\r\n");

        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("250 OK"));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_strips_trailing_whitespace() {
        let mut codec = ControlCodec::new();
        let mut buf = BytesMut::from("250-PROTOCOLINFO 1   \t\n");

        assert_eq!(
            codec.decode(&mut buf).unwrap().as_deref(),
            Some("250-PROTOCOLINFO 1")
        );
    }

    #[test]
    fn test_decode_partial_read() {
        let mut codec = ControlCodec::new();
        let mut buf = BytesMut::from("250-PROTO");

        // Should return None (need more data)
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"COLINFO 1\n250 OK\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap().as_deref(),
            Some("250-PROTOCOLINFO 1")
        );
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("250 OK"));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_eof_mid_line() {
        let mut codec = ControlCodec::new();
        let mut buf = BytesMut::from("250 O");

        let err = codec.decode_eof(&mut buf).unwrap_err();
        assert!(matches!(err, ProtocolError::IncompleteLine { bytes: 5 }));
    }

    #[test]
    fn test_decode_eof_clean() {
        let mut codec = ControlCodec::new();
        let mut buf = BytesMut::new();

        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_line_too_long() {
        let mut codec = ControlCodec::new();
        let mut buf = BytesMut::from(vec![b'a'; MAX_LINE_LENGTH + 1].as_slice());

        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, ProtocolError::LineTooLong { .. }));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let mut codec = ControlCodec::new();
        let mut buf = BytesMut::from(&b"250 \xff\xfe\n"[..]);

        assert!(matches!(
            codec.decode(&mut buf).unwrap_err(),
            ProtocolError::InvalidUtf8
        ));
    }

    #[test]
    fn test_encode_appends_newline() {
        let mut codec = ControlCodec::new();
        let mut buf = BytesMut::new();

        codec.encode("PROTOCOLINFO", &mut buf).unwrap();
        assert_eq!(&buf[..], b"PROTOCOLINFO\n");
    }

    #[test]
    fn test_encode_rejects_embedded_newline() {
        let mut codec = ControlCodec::new();
        let mut buf = BytesMut::new();

        let err = codec.encode("GETINFO version\r\nQUIT", &mut buf).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidCommand(_)));
        assert!(buf.is_empty());
    }
}
