//! Bridge configuration.
//!
//! Loaded once from a TOML file at startup and never modified afterwards.
//! Any read, parse or validation failure aborts startup.
//!
//! ```toml
//! port = 8080
//!
//! [[bridges]]
//! name = "general"
//! enabled = true
//! endpoint = "/general"
//!
//! [bridges.a.to]
//! url = "https://hooks.slack.com/services/AAA"
//! [bridges.a.from]
//! prefix = "A"
//! token = "token-from-a"
//!
//! [bridges.b.to]
//! url = "https://hooks.slack.com/services/BBB"
//! [bridges.b.from]
//! prefix = "B"
//! token = "token-from-b"
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Substring the chat platform puts in the author name of posts made through
/// an incoming webhook. Messages carrying it were relayed by us.
pub const DEFAULT_RELAY_MARKER: &str = "slackbot";

/// Default bound on a single outbound delivery, in seconds.
const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 5;

/// Characters the router reads as path parameters or wildcards. Endpoints are
/// literal paths, so none of them may appear.
const ROUTE_PATTERN_CHARS: &[char] = &[':', '*', '{', '}'];

fn default_relay_marker() -> String {
    DEFAULT_RELAY_MARKER.to_string()
}

fn default_delivery_timeout_secs() -> u64 {
    DEFAULT_DELIVERY_TIMEOUT_SECS
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    #[serde(default)]
    pub bridges: Vec<BridgeConfig>,
    /// Author-name substring that marks a message as one of our own relays.
    #[serde(default = "default_relay_marker")]
    pub relay_marker: String,
    #[serde(default = "default_delivery_timeout_secs")]
    pub delivery_timeout_secs: u64,
}

/// A named pairing of two sides, served at `endpoint`.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    pub endpoint: String,
    pub a: SideConfig,
    pub b: SideConfig,
}

/// One end of a bridge.
#[derive(Debug, Clone, Deserialize)]
pub struct SideConfig {
    /// Where messages headed to this side are delivered.
    #[serde(default)]
    pub to: Target,
    /// How calls originating from this side are recognised and labelled.
    #[serde(default)]
    pub from: Source,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Target {
    /// Incoming-webhook URL of this side. Empty means inbound-only.
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Source {
    /// Prepended to relayed author names: `"<prefix>-<user_name>"`.
    #[serde(default)]
    pub prefix: String,
    /// Shared secret the side's outgoing webhook sends as `token`.
    #[serde(default)]
    pub token: String,
}

impl Config {
    /// Read, parse and validate the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants routing depends on.
    ///
    /// Disabled bridges are never served, so only enabled ones are checked.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.delivery_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let mut endpoints: HashMap<&str, &str> = HashMap::new();
        for bridge in self.enabled_bridges() {
            bridge.validate()?;
            if let Some(first) = endpoints.insert(bridge.endpoint.as_str(), bridge.name.as_str()) {
                return Err(ConfigError::DuplicateEndpoint {
                    first: first.to_string(),
                    second: bridge.name.clone(),
                    endpoint: bridge.endpoint.clone(),
                });
            }
        }
        Ok(())
    }

    /// Bridges that get an inbound endpoint, in file order.
    pub fn enabled_bridges(&self) -> impl Iterator<Item = &BridgeConfig> {
        self.bridges.iter().filter(|b| b.enabled)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }
}

impl BridgeConfig {
    fn validate(&self) -> Result<()> {
        if !self.endpoint.starts_with('/')
            || self.endpoint == "/"
            || self.endpoint.contains(ROUTE_PATTERN_CHARS)
        {
            return Err(ConfigError::InvalidEndpoint {
                bridge: self.name.clone(),
                endpoint: self.endpoint.clone(),
            });
        }

        for (label, side) in [('a', &self.a), ('b', &self.b)] {
            if side.from.token.is_empty() {
                return Err(ConfigError::EmptyToken {
                    bridge: self.name.clone(),
                    side: label,
                });
            }
            if !side.to.url.is_empty() && !is_http_url(&side.to.url) {
                return Err(ConfigError::InvalidUrl {
                    bridge: self.name.clone(),
                    side: label,
                    url: side.to.url.clone(),
                });
            }
        }

        if self.a.from.token == self.b.from.token {
            return Err(ConfigError::DuplicateToken {
                bridge: self.name.clone(),
            });
        }
        Ok(())
    }
}

fn is_http_url(raw: &str) -> bool {
    reqwest::Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}
