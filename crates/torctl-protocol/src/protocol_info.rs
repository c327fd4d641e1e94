//! `PROTOCOLINFO` reply body parsing
//!
//! Observed grammar, one entry per reply line:
//!
//! ```text
//! PROTOCOLINFO <version>
//! AUTH METHODS=<m1>[,<m2>...] [COOKIEFILE="<path>"]
//! VERSION Tor="<daemon version>"
//! OK
//! ```
//!
//! Lines with any other leading keyword are skipped so newer daemons can
//! add fields without breaking older clients.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::ProtocolError;
use crate::line::StatusCode;
use crate::reply::Reply;

/// Auth methods that rely on a cookie file
pub const COOKIE_METHODS: [&str; 2] = ["COOKIE", "SAFECOOKIE"];

/// Fields extracted from a `PROTOCOLINFO` reply
///
/// The version is kept as the raw token; deciding whether it is usable is
/// left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolInfo {
    /// Raw protocol version token, if the daemon sent one
    pub protocol_version: Option<String>,
    /// Advertised authentication methods
    pub auth_methods: BTreeSet<String>,
    /// Cookie file path, only set when a cookie method is advertised
    pub auth_cookie_path: Option<PathBuf>,
}

impl ProtocolInfo {
    /// Parse a complete reply, requiring a `250` status
    pub fn from_reply(reply: &Reply) -> Result<Self, ProtocolError> {
        if reply.status_code() != StatusCode::OK {
            return Err(ProtocolError::UnexpectedStatus {
                context: "negotiation",
                code: reply.status_code(),
            });
        }

        Self::parse_lines(reply.lines().iter().map(String::as_str))
    }

    /// Parse reply line bodies
    pub fn parse_lines<'a, I>(lines: I) -> Result<Self, ProtocolError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut info = ProtocolInfo::default();

        for line in lines {
            let (keyword, rest) = line.split_once(' ').unwrap_or((line, ""));

            match keyword {
                "PROTOCOLINFO" => {
                    info.protocol_version = rest.split_whitespace().next().map(str::to_string);
                }
                "AUTH" => {
                    let (methods, cookie_path) = parse_auth(rest)?;
                    info.auth_methods = methods;
                    info.auth_cookie_path = cookie_path;
                }
                other => {
                    tracing::trace!(keyword = other, "Skipping PROTOCOLINFO line");
                }
            }
        }

        Ok(info)
    }

    /// Whether a cookie-based auth method is advertised
    pub fn has_cookie_auth(&self) -> bool {
        COOKIE_METHODS
            .iter()
            .any(|m| self.auth_methods.contains(*m))
    }
}

/// Parse the arguments of an `AUTH` line
fn parse_auth(rest: &str) -> Result<(BTreeSet<String>, Option<PathBuf>), ProtocolError> {
    let args = parse_arguments(rest)?;

    let methods = match args.first() {
        Some((key, value)) if key == "METHODS" => value
            .split(',')
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>(),
        _ => {
            return Err(ProtocolError::MalformedProtocolInfo(format!(
                "AUTH line without METHODS: {rest:?}"
            )))
        }
    };

    let uses_cookie = COOKIE_METHODS.iter().any(|m| methods.contains(*m));
    if !uses_cookie {
        return Ok((methods, None));
    }

    let cookie_path = args
        .iter()
        .find(|(key, _)| key == "COOKIEFILE")
        .map(|(_, value)| PathBuf::from(value))
        .ok_or_else(|| {
            ProtocolError::MalformedProtocolInfo(
                "cookie auth advertised without COOKIEFILE".to_string(),
            )
        })?;

    Ok((methods, Some(cookie_path)))
}

/// Split `KEY=VALUE KEY="quoted value"` into pairs, unquoting values
fn parse_arguments(input: &str) -> Result<Vec<(String, String)>, ProtocolError> {
    let mut args = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            key.push(c);
        }

        if chars.next_if_eq(&'=').is_none() {
            return Err(ProtocolError::MalformedProtocolInfo(format!(
                "argument without value: {key:?}"
            )));
        }

        let mut value = String::new();
        if chars.next_if_eq(&'"').is_some() {
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some(escaped) => value.push(escaped),
                        None => break,
                    },
                    _ => value.push(c),
                }
            }
            if !closed {
                return Err(ProtocolError::MalformedProtocolInfo(format!(
                    "unterminated quoted value for {key}"
                )));
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                value.push(c);
            }
        }

        args.push((key, value));
    }

    Ok(args)
}
