//! Line transport over the control port connection
//!
//! Owns the duplex stream and frames it into lines with [`ControlCodec`].
//! Knows nothing about status codes or replies.

use std::io;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use torctl_protocol::ControlCodec;

use crate::config::ControlConfig;
use crate::error::{ConnectionError, ControlError};

/// Line-oriented connection to a control port
pub struct Transport<S = TcpStream> {
    address: String,
    framed: Option<Framed<S, ControlCodec>>,
    io_timeout: Duration,
}

impl Transport<TcpStream> {
    /// Connect to the endpoint named in `config`
    ///
    /// No retry: a refused or unreachable endpoint fails immediately.
    pub async fn open(config: &ControlConfig) -> Result<Self, ConnectionError> {
        let address = config.address.clone();
        tracing::debug!(address = %address, "Connecting to control port");

        let stream = match timeout(config.connect_timeout, TcpStream::connect(&address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) if e.kind() == io::ErrorKind::InvalidInput => {
                return Err(ConnectionError::InvalidAddress(address));
            }
            Ok(Err(source)) => return Err(ConnectionError::Refused { address, source }),
            Err(_) => {
                return Err(ConnectionError::Timeout {
                    address,
                    after: config.connect_timeout,
                })
            }
        };

        // Commands are single short lines; don't hold them back
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
        }

        Ok(Self::from_stream(address, stream, config.io_timeout))
    }
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already-connected stream
    pub fn from_stream(address: impl Into<String>, stream: S, io_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            framed: Some(Framed::new(stream, ControlCodec::new())),
            io_timeout,
        }
    }

    /// Endpoint this transport was opened against
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Whether `close` has not yet run
    pub fn is_open(&self) -> bool {
        self.framed.is_some()
    }

    /// Write `command` plus a newline and flush it onto the wire
    pub async fn send_line(&mut self, command: &str) -> Result<(), ControlError> {
        let io_timeout = self.io_timeout;
        let framed = self.framed_mut()?;

        tracing::trace!(command, "-> control port");

        match timeout(io_timeout, framed.send(command)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(timed_out("write", io_timeout)),
        }
    }

    /// Wait for the next complete line, terminator and trailing whitespace removed
    pub async fn read_line(&mut self) -> Result<String, ControlError> {
        let io_timeout = self.io_timeout;
        let framed = self.framed_mut()?;

        match timeout(io_timeout, framed.next()).await {
            Ok(Some(line)) => {
                let line = line?;
                tracing::trace!(line = %line, "<- control port");
                Ok(line)
            }
            Ok(None) => Err(ControlError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "control connection closed by peer",
            ))),
            Err(_) => Err(timed_out("read", io_timeout)),
        }
    }

    /// Shut down both directions of the connection; later calls are no-ops
    pub async fn close(&mut self) {
        let Some(framed) = self.framed.take() else {
            return;
        };

        let mut stream = framed.into_inner();
        if let Err(e) = stream.shutdown().await {
            // Peer may already be gone; the stream is dropped either way
            tracing::debug!(address = %self.address, error = %e, "Error shutting down control connection");
        }

        tracing::debug!(address = %self.address, "Control connection closed");
    }

    fn framed_mut(&mut self) -> Result<&mut Framed<S, ControlCodec>, ControlError> {
        self.framed.as_mut().ok_or_else(|| {
            ControlError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "control connection already closed",
            ))
        })
    }
}

fn timed_out(operation: &str, after: Duration) -> ControlError {
    ControlError::Io(io::Error::new(
        io::ErrorKind::TimedOut,
        format!("control port {} timed out after {:?}", operation, after),
    ))
}
