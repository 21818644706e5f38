//! Error types.
//!
//! Two families, matching how failures are handled:
//!
//! - [`ConfigError`]: anything wrong with the configuration file. Always fatal
//!   at startup; the bridge never serves with a partial configuration.
//! - [`DeliveryError`]: a failed outbound webhook POST. Logged by the router
//!   and swallowed; the inbound caller still gets a success response.
//!
//! [`StartupError`] wraps everything that can stop the process before or
//! while serving.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected shape
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Listening port is zero
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// Delivery timeout is zero
    #[error("Invalid delivery timeout: must be at least one second")]
    InvalidTimeout,

    /// Both sides of a bridge accept the same token, so the origin of a call
    /// cannot be determined
    #[error("Bridge '{bridge}': side a and side b share the same token")]
    DuplicateToken { bridge: String },

    /// A side has an empty token
    #[error("Bridge '{bridge}': side {side} has an empty token")]
    EmptyToken { bridge: String, side: char },

    /// Endpoint path is not usable as a route
    #[error("Bridge '{bridge}': invalid endpoint '{endpoint}' (must be a literal path starting with '/', not '/' itself)")]
    InvalidEndpoint { bridge: String, endpoint: String },

    /// Two enabled bridges listen on the same path
    #[error("Bridges '{first}' and '{second}' both listen on '{endpoint}'")]
    DuplicateEndpoint {
        first: String,
        second: String,
        endpoint: String,
    },

    /// Outbound URL is set but not an absolute http(s) URL
    #[error("Bridge '{bridge}': side {side} has an invalid url '{url}'")]
    InvalidUrl {
        bridge: String,
        side: char,
        url: String,
    },
}

/// Fatal errors raised while bringing the server up.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The shared HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The listening socket could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an I/O error
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Outbound webhook delivery errors.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Payload could not be encoded as JSON
    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// No response within the configured timeout
    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, TLS or protocol failure
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Destination answered with a non-2xx status
    #[error("Destination returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}
