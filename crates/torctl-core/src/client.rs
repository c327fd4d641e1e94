//! Control protocol client
//!
//! Connecting performs the whole handshake before a client is handed out:
//!
//! ```text
//! Disconnected -> Connected -> NegotiatingCapabilities -> Ready
//!                      \                 \
//!                       +-----------------+--> Failed
//! ```
//!
//! A client is either returned `Ready` or not returned at all; on any
//! handshake error the connection is closed before the error propagates.
//!
//! Replies carry no request IDs and are matched to commands purely by
//! order on the stream, so `run_command` takes `&mut self`.

use std::fmt;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use torctl_protocol::{ProtocolError, ProtocolInfo, Reply, ReplyBuilder, ReplyLine, PROTOCOLINFO};

use crate::capabilities::NegotiatedCapabilities;
use crate::config::ControlConfig;
use crate::error::ControlError;
use crate::transport::Transport;

/// Lifecycle state of a [`ProtocolClient`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Closed; terminal
    Disconnected,
    /// Transport open, handshake not started
    Connected,
    /// `PROTOCOLINFO` exchange in progress
    NegotiatingCapabilities,
    /// Handshake complete, commands accepted
    Ready,
    /// An exchange broke the connection; terminal
    Failed,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientState::Disconnected => "disconnected",
            ClientState::Connected => "connected",
            ClientState::NegotiatingCapabilities => "negotiating capabilities",
            ClientState::Ready => "ready",
            ClientState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Client for a daemon's control port
pub struct ProtocolClient<S = TcpStream> {
    transport: Transport<S>,
    state: ClientState,
    capabilities: Option<NegotiatedCapabilities>,
}

impl ProtocolClient<TcpStream> {
    /// Connect to the configured endpoint and run the handshake
    pub async fn connect(config: &ControlConfig) -> Result<Self, ControlError> {
        config.validate()?;
        let transport = Transport::open(config).await?;
        Self::handshake(transport).await
    }
}

impl<S> ProtocolClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Run the handshake over an already-connected stream
    pub async fn from_stream(
        address: impl Into<String>,
        stream: S,
        io_timeout: Duration,
    ) -> Result<Self, ControlError> {
        Self::handshake(Transport::from_stream(address, stream, io_timeout)).await
    }

    async fn handshake(transport: Transport<S>) -> Result<Self, ControlError> {
        let mut client = Self {
            transport,
            state: ClientState::Connected,
            capabilities: None,
        };

        client.state = ClientState::NegotiatingCapabilities;

        match client.negotiate().await {
            Ok(capabilities) => {
                tracing::debug!(
                    address = %client.transport.address(),
                    protocol_version = capabilities.protocol_version(),
                    auth_methods = ?capabilities.auth_methods(),
                    "Control protocol negotiated"
                );
                client.capabilities = Some(capabilities);
                client.state = ClientState::Ready;
                Ok(client)
            }
            Err(e) => {
                tracing::debug!(
                    address = %client.transport.address(),
                    error = %e,
                    "Control protocol negotiation failed"
                );
                client.state = ClientState::Failed;
                client.transport.close().await;
                Err(e)
            }
        }
    }

    async fn negotiate(&mut self) -> Result<NegotiatedCapabilities, ControlError> {
        let reply = self.run_command(PROTOCOLINFO).await?;
        let info = ProtocolInfo::from_reply(&reply)?;
        NegotiatedCapabilities::negotiate(info)
    }

    /// Send one command and collect its complete reply
    ///
    /// Error statuses (4yz/5yz) are returned as a normal [`Reply`]. A broken
    /// stream or malformed reply fails the client, since the next reply could
    /// no longer be matched to its command.
    pub async fn run_command(&mut self, command: &str) -> Result<Reply, ControlError> {
        match self.state {
            ClientState::Ready | ClientState::NegotiatingCapabilities => {}
            state => {
                return Err(ControlError::InvalidState {
                    operation: "run a command",
                    state,
                })
            }
        }

        // Rejected before anything reaches the wire, so the stream stays in sync
        if command.contains(['\r', '\n']) {
            return Err(ProtocolError::InvalidCommand(command.to_string()).into());
        }

        match self.exchange(command).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                self.state = ClientState::Failed;
                self.capabilities = None;
                self.transport.close().await;
                Err(e)
            }
        }
    }

    async fn exchange(&mut self, command: &str) -> Result<Reply, ControlError> {
        self.transport.send_line(command).await?;

        let mut builder = ReplyBuilder::new();
        loop {
            let line = match self.transport.read_line().await {
                Ok(line) => line,
                // Hanging up between lines of a reply is still a broken reply
                Err(ControlError::Io(e))
                    if e.kind() == io::ErrorKind::UnexpectedEof && builder.has_pending() =>
                {
                    return Err(
                        ProtocolError::IncompleteReply("stream closed before final line").into(),
                    );
                }
                Err(e) => return Err(e),
            };
            let parsed = ReplyLine::parse(&line)?;

            if let Some(reply) = builder.push(parsed)? {
                tracing::trace!(
                    command,
                    status = %reply.status_code(),
                    lines = reply.lines().len(),
                    "Reply received"
                );
                return Ok(reply);
            }
        }
    }

    /// Close the connection; calling again is a no-op
    pub async fn close(&mut self) {
        if self.state == ClientState::Disconnected {
            return;
        }

        self.transport.close().await;
        self.capabilities = None;
        self.state = ClientState::Disconnected;
    }

    /// Current lifecycle state
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Whether commands can be issued
    pub fn is_ready(&self) -> bool {
        self.state == ClientState::Ready
    }

    /// Capabilities from the handshake; `None` once closed or failed
    pub fn capabilities(&self) -> Option<&NegotiatedCapabilities> {
        self.capabilities.as_ref()
    }

    /// Endpoint the client is connected to
    pub fn address(&self) -> &str {
        self.transport.address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, split, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
    use tokio::task::JoinHandle;
    use torctl_protocol::StatusCode;

    const COOKIE_REPLY: &str = "250-PROTOCOLINFO 1\r\n\
        250-AUTH METHODS=COOKIE,SAFECOOKIE COOKIEFILE=\"/run/tor/control.authcookie\"\r\n\
        250-VERSION Tor=\"0.4.7\"\r\n\
        250 OK\r\n";

    /// Answers each expected command with its canned reply, then reports
    /// whether the client closed the connection.
    fn fake_daemon(
        stream: DuplexStream,
        script: Vec<(&'static str, &'static str)>,
    ) -> JoinHandle<bool> {
        tokio::spawn(async move {
            let (reader, mut writer) = split(stream);
            let mut lines = BufReader::new(reader).lines();

            for (expected, reply) in script {
                let command = lines.next_line().await.unwrap().unwrap();
                assert_eq!(command, expected);
                writer.write_all(reply.as_bytes()).await.unwrap();
            }

            matches!(lines.next_line().await, Ok(None))
        })
    }

    async fn connect_with(
        script: Vec<(&'static str, &'static str)>,
    ) -> (Result<ProtocolClient<DuplexStream>, ControlError>, JoinHandle<bool>) {
        let (client_end, server_end) = duplex(4096);
        let daemon = fake_daemon(server_end, script);
        let client = ProtocolClient::from_stream("test", client_end, Duration::from_secs(5)).await;
        (client, daemon)
    }

    #[tokio::test]
    async fn test_handshake_cookie_auth() {
        let (client, daemon) = connect_with(vec![("PROTOCOLINFO", COOKIE_REPLY)]).await;
        let mut client = client.unwrap();

        assert_eq!(client.state(), ClientState::Ready);
        let caps = client.capabilities().unwrap();
        assert_eq!(caps.protocol_version(), 1);
        assert!(caps.supports_auth_method("COOKIE"));
        assert!(caps.supports_auth_method("SAFECOOKIE"));
        assert_eq!(caps.auth_methods().len(), 2);
        assert_eq!(
            caps.auth_cookie_path(),
            Some(std::path::Path::new("/run/tor/control.authcookie"))
        );

        client.close().await;
        assert!(daemon.await.unwrap());
    }

    #[tokio::test]
    async fn test_unsupported_version_closes_transport() {
        let (client, daemon) = connect_with(vec![(
            "PROTOCOLINFO",
            "250-PROTOCOLINFO 2\r\n250-AUTH METHODS=NULL\r\n250 OK\r\n",
        )])
        .await;

        let err = client.err().unwrap();
        assert!(matches!(
            err,
            ControlError::UnsupportedVersion { found: Some(ref v) } if v == "2"
        ));
        assert!(daemon.await.unwrap(), "transport left open");
    }

    #[tokio::test]
    async fn test_missing_version_rejected() {
        let (client, daemon) = connect_with(vec![(
            "PROTOCOLINFO",
            "250-AUTH METHODS=NULL\r\n250 OK\r\n",
        )])
        .await;

        assert!(matches!(
            client.err().unwrap(),
            ControlError::UnsupportedVersion { found: None }
        ));
        assert!(daemon.await.unwrap());
    }

    #[tokio::test]
    async fn test_non_250_negotiation_status() {
        let (client, daemon) =
            connect_with(vec![("PROTOCOLINFO", "510 Unrecognized command\r\n")]).await;

        let err = client.err().unwrap();
        assert!(matches!(
            err,
            ControlError::Protocol(ProtocolError::UnexpectedStatus { code, .. })
                if code == StatusCode::new(510)
        ));
        assert!(daemon.await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_status_line() {
        let (client, daemon) = connect_with(vec![("PROTOCOLINFO", "25\r\n")]).await;

        assert!(matches!(
            client.err().unwrap(),
            ControlError::Protocol(ProtocolError::MalformedStatusLine(ref l)) if l == "25"
        ));
        assert!(daemon.await.unwrap());
    }

    #[tokio::test]
    async fn test_hangup_mid_reply_is_protocol_error() {
        let (client_end, server_end) = duplex(4096);
        let daemon = tokio::spawn(async move {
            let (reader, mut writer) = split(server_end);
            let mut lines = BufReader::new(reader).lines();
            assert_eq!(lines.next_line().await.unwrap().unwrap(), "PROTOCOLINFO");
            writer.write_all(b"250-PROTOCOLINFO 1\r\n").await.unwrap();
            // Both halves drop here, closing the stream before the final line
        });

        let client =
            ProtocolClient::from_stream("test", client_end, Duration::from_secs(5)).await;
        daemon.await.unwrap();

        assert!(matches!(
            client.err().unwrap(),
            ControlError::Protocol(ProtocolError::IncompleteReply(_))
        ));
    }

    #[tokio::test]
    async fn test_hangup_before_reply_is_io_error() {
        let (client_end, server_end) = duplex(4096);
        let daemon = tokio::spawn(async move {
            let mut lines = BufReader::new(server_end).lines();
            assert_eq!(lines.next_line().await.unwrap().unwrap(), "PROTOCOLINFO");
        });

        let client =
            ProtocolClient::from_stream("test", client_end, Duration::from_secs(5)).await;
        daemon.await.unwrap();

        assert!(matches!(
            client.err().unwrap(),
            ControlError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof
        ));
    }

    #[tokio::test]
    async fn test_run_command_after_handshake() {
        let (client, daemon) = connect_with(vec![
            ("PROTOCOLINFO", COOKIE_REPLY),
            (
                "GETINFO version",
                "250-version=0.4.8.9\r\n250 OK\r\n",
            ),
            ("BOGUS", "510 Unrecognized command \"BOGUS\"\r\n"),
        ])
        .await;
        let mut client = client.unwrap();

        let reply = client.run_command("GETINFO version").await.unwrap();
        assert_eq!(reply.status_code(), StatusCode::OK);
        assert_eq!(reply.lines(), &["version=0.4.8.9", "OK"]);

        // An error status is a reply, not a failure
        let reply = client.run_command("BOGUS").await.unwrap();
        assert_eq!(reply.status_code(), StatusCode::new(510));
        assert!(client.is_ready());

        client.close().await;
        assert!(daemon.await.unwrap());
    }

    #[tokio::test]
    async fn test_status_mismatch_fails_client() {
        let (client, daemon) = connect_with(vec![
            ("PROTOCOLINFO", COOKIE_REPLY),
            ("GETINFO version", "250-version=0.4.8.9\r\n550 OK\r\n"),
        ])
        .await;
        let mut client = client.unwrap();

        let err = client.run_command("GETINFO version").await.unwrap_err();
        assert!(matches!(
            err,
            ControlError::Protocol(ProtocolError::StatusMismatch { .. })
        ));
        assert_eq!(client.state(), ClientState::Failed);
        assert!(client.capabilities().is_none());

        let err = client.run_command("GETINFO version").await.unwrap_err();
        assert!(matches!(
            err,
            ControlError::InvalidState {
                state: ClientState::Failed,
                ..
            }
        ));
        assert!(daemon.await.unwrap());
    }

    #[tokio::test]
    async fn test_embedded_newline_rejected_without_failing() {
        let (client, daemon) = connect_with(vec![("PROTOCOLINFO", COOKIE_REPLY)]).await;
        let mut client = client.unwrap();

        let err = client.run_command("GETINFO version\nQUIT").await.unwrap_err();
        assert!(matches!(
            err,
            ControlError::Protocol(ProtocolError::InvalidCommand(_))
        ));
        assert!(client.is_ready());

        client.close().await;
        assert!(daemon.await.unwrap());
    }

    #[tokio::test]
    async fn test_close_twice() {
        let (client, daemon) = connect_with(vec![("PROTOCOLINFO", COOKIE_REPLY)]).await;
        let mut client = client.unwrap();

        client.close().await;
        assert_eq!(client.state(), ClientState::Disconnected);
        client.close().await;
        assert_eq!(client.state(), ClientState::Disconnected);
        assert!(client.capabilities().is_none());

        let err = client.run_command("GETINFO version").await.unwrap_err();
        assert!(matches!(
            err,
            ControlError::InvalidState {
                state: ClientState::Disconnected,
                ..
            }
        ));
        assert!(daemon.await.unwrap());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ClientState::Ready.to_string(), "ready");
        assert_eq!(
            ClientState::NegotiatingCapabilities.to_string(),
            "negotiating capabilities"
        );
    }
}
