use std::net::SocketAddr;

use serde::Deserialize;
use roomer_core::error::{RelayError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    pub version: u32,

    #[serde(default)]
    pub chat: ChatSection,

    #[serde(default)]
    pub dispatch: DispatchSection,

    #[serde(default)]
    pub backoff: BackoffSection,

    #[serde(default)]
    pub correlation: CorrelationSection,

    #[serde(default)]
    pub ops: OpsSection,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RelayError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.chat.validate()?;
        self.dispatch.validate()?;
        self.backoff.validate()?;
        self.correlation.validate()?;
        self.ops.validate()?;

        Ok(())
    }

    /// Apply `ROOMER_*` overrides; `lookup` is `std::env::var` in production.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("ROOMER_NICK") {
            self.chat.nick = v;
        }
        if let Some(v) = lookup("ROOMER_SERVER") {
            self.chat.server = v;
        }
        if let Some(v) = lookup("ROOMER_SERVER_NAME") {
            self.chat.server_name = Some(v);
        }
        if let Some(v) = lookup("ROOMER_CHANNELS") {
            self.chat.channels = v
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = lookup("ROOMER_DISPATCH") {
            self.dispatch.addr = v;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatSection {
    #[serde(default = "default_nick")]
    pub nick: String,

    #[serde(default = "default_server")]
    pub server: String,

    /// Host advertised in envelopes; falls back to `server`.
    #[serde(default)]
    pub server_name: Option<String>,

    #[serde(default = "default_channels")]
    pub channels: Vec<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_chat_max_line_bytes")]
    pub max_line_bytes: usize,
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            nick: default_nick(),
            server: default_server(),
            server_name: None,
            channels: default_channels(),
            password: None,
            max_line_bytes: default_chat_max_line_bytes(),
        }
    }
}

impl ChatSection {
    pub fn host_name(&self) -> &str {
        self.server_name.as_deref().unwrap_or(&self.server)
    }

    pub fn validate(&self) -> Result<()> {
        if self.nick.is_empty() || self.nick.contains(char::is_whitespace) {
            return Err(RelayError::Config(
                "chat.nick must be non-empty and contain no whitespace".into(),
            ));
        }
        check_host_port("chat.server", &self.server)?;
        if let Some(name) = &self.server_name {
            check_host_port("chat.server_name", name)?;
        }
        if self.channels.is_empty() {
            return Err(RelayError::Config("chat.channels must not be empty".into()));
        }
        for c in &self.channels {
            if !(c.starts_with('#') || c.starts_with('&')) || c.contains(char::is_whitespace) {
                return Err(RelayError::Config(format!("chat.channels: invalid channel {c:?}")));
            }
        }
        check_line_limit("chat.max_line_bytes", self.max_line_bytes)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchSection {
    #[serde(default = "default_dispatch_addr")]
    pub addr: String,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default = "default_dispatch_max_line_bytes")]
    pub max_line_bytes: usize,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            addr: default_dispatch_addr(),
            method: default_method(),
            max_line_bytes: default_dispatch_max_line_bytes(),
        }
    }
}

impl DispatchSection {
    pub fn validate(&self) -> Result<()> {
        check_host_port("dispatch.addr", &self.addr)?;
        if self.method.trim().is_empty() {
            return Err(RelayError::Config("dispatch.method must not be empty".into()));
        }
        check_line_limit("dispatch.max_line_bytes", self.max_line_bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Square the delay after each failure (uncapped unless `max_delay_ms`).
    #[default]
    Square,
    /// Double the delay after each failure.
    Exponential,
}

/// Which failure classes keep a reconnect loop going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RetryOn {
    #[default]
    All,
    Network,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackoffSection {
    #[serde(default)]
    pub strategy: BackoffStrategy,

    #[serde(default = "default_unit_ms")]
    pub unit_ms: u64,

    #[serde(default)]
    pub max_delay_ms: Option<u64>,

    #[serde(default)]
    pub retry_on: RetryOn,
}

impl Default for BackoffSection {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::default(),
            unit_ms: default_unit_ms(),
            max_delay_ms: None,
            retry_on: RetryOn::default(),
        }
    }
}

impl BackoffSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=60_000).contains(&self.unit_ms) {
            return Err(RelayError::Config(
                "backoff.unit_ms must be between 1 and 60000".into(),
            ));
        }
        if let Some(max) = self.max_delay_ms {
            if max < self.unit_ms {
                return Err(RelayError::Config(
                    "backoff.max_delay_ms must be at least unit_ms".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorrelationSection {
    #[serde(default)]
    pub enabled: bool,

    /// Records kept in memory; the oldest is evicted first.
    #[serde(default = "default_correlation_capacity")]
    pub capacity: usize,
}

impl Default for CorrelationSection {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: default_correlation_capacity(),
        }
    }
}

impl CorrelationSection {
    pub fn validate(&self) -> Result<()> {
        if (1..=1_000_000).contains(&self.capacity) {
            Ok(())
        } else {
            Err(RelayError::Config(
                "correlation.capacity must be between 1 and 1000000".into(),
            ))
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct OpsSection {
    #[serde(default)]
    pub listen: Option<String>,
}

impl OpsSection {
    pub fn listen_addr(&self) -> Result<Option<SocketAddr>> {
        self.listen
            .as_deref()
            .map(|s| {
                s.parse::<SocketAddr>()
                    .map_err(|e| RelayError::Config(format!("ops.listen {s:?}: {e}")))
            })
            .transpose()
    }

    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }
}

fn check_host_port(field: &str, v: &str) -> Result<()> {
    let ok = v
        .rsplit_once(':')
        .map(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
        .unwrap_or(false);
    if ok {
        Ok(())
    } else {
        Err(RelayError::Config(format!("{field} must be host:port, got {v:?}")))
    }
}

fn check_line_limit(field: &str, v: usize) -> Result<()> {
    if (512..=1_048_576).contains(&v) {
        Ok(())
    } else {
        Err(RelayError::Config(format!(
            "{field} must be between 512 and 1048576"
        )))
    }
}

fn default_nick() -> String {
    "roomer".into()
}
fn default_server() -> String {
    "chat.freenode.net:6667".into()
}
fn default_channels() -> Vec<String> {
    vec!["#roomtest".into()]
}
fn default_chat_max_line_bytes() -> usize {
    8192
}
fn default_dispatch_addr() -> String {
    "localhost:8080".into()
}
fn default_method() -> String {
    roomer_core::protocol::dispatch::DISPATCH_METHOD.into()
}
fn default_dispatch_max_line_bytes() -> usize {
    65536
}
fn default_correlation_capacity() -> usize {
    10_000
}
fn default_unit_ms() -> u64 {
    1000
}
