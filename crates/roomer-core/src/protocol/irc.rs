//! Chat lane: IRC-style line messages (panic-free).
//!
//! Parsing rules:
//! - Never index into the line; split with `split_once`/`strip_prefix` only.
//! - IRCv3 message tags are accepted and skipped.
//! - A line must carry a command; everything else is optional.

use std::fmt;

use crate::error::{RelayError, Result};

/// Command names the relay reacts to or emits.
pub mod command {
    /// Registration complete (numeric reply).
    pub const RPL_WELCOME: &str = "001";
    pub const PING: &str = "PING";
    pub const PONG: &str = "PONG";
    pub const PRIVMSG: &str = "PRIVMSG";
    pub const INVITE: &str = "INVITE";
    pub const JOIN: &str = "JOIN";
    pub const NICK: &str = "NICK";
    pub const USER: &str = "USER";
    pub const PASS: &str = "PASS";
}

/// Message source (`nick!user@host` or a bare server name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    pub name: String,
    pub user: Option<String>,
    pub host: Option<String>,
}

impl Prefix {
    fn parse(raw: &str) -> Self {
        let (name, rest) = match raw.split_once('!') {
            Some((name, rest)) => (name, Some(rest)),
            None => (raw, None),
        };
        let (name, user, host) = match rest {
            Some(rest) => match rest.split_once('@') {
                Some((user, host)) => (name, Some(user), Some(host)),
                None => (name, Some(rest), None),
            },
            None => match name.split_once('@') {
                Some((name, host)) => (name, None, Some(host)),
                None => (name, None, None),
            },
        };
        Self {
            name: name.to_string(),
            user: user.map(str::to_string),
            host: host.map(str::to_string),
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(user) = &self.user {
            write!(f, "!{user}")?;
        }
        if let Some(host) = &self.host {
            write!(f, "@{host}")?;
        }
        Ok(())
    }
}

/// One parsed chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Source identity, absent on client-originated lines.
    pub prefix: Option<Prefix>,
    /// Upper-cased command or three-digit numeric.
    pub command: String,
    /// Middle parameters.
    pub params: Vec<String>,
    /// Trailing parameter (after ` :`), kept apart so it may contain spaces.
    pub trailing: Option<String>,
}

impl Message {
    /// Build an outbound message without a prefix.
    pub fn new(command: &str, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command: command.to_string(),
            params,
            trailing: None,
        }
    }

    pub fn with_trailing(mut self, trailing: impl Into<String>) -> Self {
        self.trailing = Some(trailing.into());
        self
    }

    /// Source name (nick or server), if the line carried a prefix.
    pub fn name(&self) -> Option<&str> {
        self.prefix.as_ref().map(|p| p.name.as_str())
    }

    /// Parse one line (trailing CR/LF tolerated).
    pub fn parse(line: &str) -> Result<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        if let Some(tagged) = rest.strip_prefix('@') {
            rest = tagged.split_once(' ').map(|(_, tail)| tail).unwrap_or("");
        }
        rest = rest.trim_start_matches(' ');

        let prefix = match rest.strip_prefix(':') {
            Some(p) => {
                let (raw, tail) = p
                    .split_once(' ')
                    .ok_or_else(|| RelayError::BadMessage("prefix without command".into()))?;
                rest = tail.trim_start_matches(' ');
                Some(Prefix::parse(raw))
            }
            None => None,
        };

        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing.to_string())),
            None => (rest, None),
        };

        let mut parts = head.split(' ').filter(|s| !s.is_empty());
        let command = parts
            .next()
            .ok_or_else(|| RelayError::BadMessage("missing command".into()))?
            .to_ascii_uppercase();
        let params = parts.map(str::to_string).collect();

        Ok(Self {
            prefix,
            command,
            params,
            trailing,
        })
    }

    /// Format as a wire line without the terminating CRLF.
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        f.write_str(&self.command)?;
        for p in &self.params {
            write!(f, " {p}")?;
        }
        if let Some(trailing) = &self.trailing {
            write!(f, " :{trailing}")?;
        }
        Ok(())
    }
}
