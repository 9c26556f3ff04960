//! Configuration error types.

use thiserror::Error;

/// Failure to load or validate [`super::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `GOLDEN_PORT` parsed but is 0.
    #[error("invalid port '{value}': GOLDEN_PORT must be 1-65535")]
    InvalidPort { value: String },

    #[error("GOLDEN_PORT '{value}' is not a number: {source}")]
    PortParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("GOLDEN_BIND_ADDR '{value}' is not an IP address: {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// A numeric or duration variable did not parse.
    #[error("{name}='{value}' is invalid: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Settings parsed but a component refused them.
    #[error("{component} settings rejected: {reason}")]
    Component {
        component: &'static str,
        reason: String,
    },
}
