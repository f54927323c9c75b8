// src/config.rs

//! Manages server configuration: loading, defaults, and validation.

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Paths the trigger handlers are mounted on. The WebSocket path may not shadow them.
pub const SEND_ONE_PATH: &str = "/send-one";
pub const SEND_MANY_PATH: &str = "/send-many";

/// Settings for the relay path itself.
#[derive(Deserialize, Debug, Clone)]
pub struct RelayConfig {
    /// The route that accepts WebSocket upgrades.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    /// Text appended to `clientID:<id>==>` when a peer leaves.
    #[serde(default = "default_departure_marker")]
    pub departure_marker: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            ws_path: default_ws_path(),
            departure_marker: default_departure_marker(),
        }
    }
}

fn default_ws_path() -> String {
    "/echo".to_string()
}
fn default_departure_marker() -> String {
    "disconnected".to_string()
}

/// Settings for the out-of-band unicast and broadcast triggers.
#[derive(Deserialize, Debug, Clone)]
pub struct TriggerConfig {
    /// If false, the trigger routes are not mounted.
    #[serde(default = "default_triggers_enabled")]
    pub enabled: bool,
    /// Payload sent by `/send-one` when the request does not supply one.
    #[serde(default = "default_unicast_message")]
    pub unicast_message: String,
    /// Payload sent by `/send-many` when the request does not supply one.
    #[serde(default = "default_broadcast_message")]
    pub broadcast_message: String,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            enabled: default_triggers_enabled(),
            unicast_message: default_unicast_message(),
            broadcast_message: default_broadcast_message(),
        }
    }
}

fn default_triggers_enabled() -> bool {
    true
}
fn default_unicast_message() -> String {
    "this is a unicast message".to_string()
}
fn default_broadcast_message() -> String {
    "this is a broadcast message".to_string()
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct MetricsConfig {
    /// If true, an HTTP server will be started to expose Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,
    /// The port for the Prometheus metrics server.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    9090
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    /// The file was absent, so the built-in defaults were used.
    Defaults,
}

/// A raw representation of the config file before validation.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_max_clients")]
    max_clients: usize,
    #[serde(default = "default_outbound_queue_capacity")]
    outbound_queue_capacity: usize,
    #[serde(default = "default_writer_shutdown_timeout_ms")]
    writer_shutdown_timeout_ms: u64,
    #[serde(default)]
    relay: RelayConfig,
    #[serde(default)]
    triggers: TriggerConfig,
    #[serde(default)]
    metrics: MetricsConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_clients() -> usize {
    10000
}
fn default_outbound_queue_capacity() -> usize {
    256
}
fn default_writer_shutdown_timeout_ms() -> u64 {
    1000
}

/// Represents the final, validated server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Upper bound on concurrently connected peers.
    pub max_clients: usize,
    /// Capacity of each connection's outbound queue, in messages.
    pub outbound_queue_capacity: usize,
    /// How long a closing session waits for its writer to flush.
    pub writer_shutdown_timeout_ms: u64,
    pub relay: RelayConfig,
    pub triggers: TriggerConfig,
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            max_clients: default_max_clients(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            writer_shutdown_timeout_ms: default_writer_shutdown_timeout_ms(),
            relay: RelayConfig::default(),
            triggers: TriggerConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents).with_context(|| format!("Invalid config in '{path}'"))
    }

    /// Like `from_file`, but falls back to the built-in defaults when `path`
    /// does not exist. Runs before logging is set up, so the caller reports
    /// which source was used.
    pub fn from_file_or_default(path: &str) -> Result<(Self, ConfigSource)> {
        if Path::new(path).exists() {
            Ok((Self::from_file(path)?, ConfigSource::File))
        } else {
            let config = Config::default();
            config.validate()?;
            Ok((config, ConfigSource::Defaults))
        }
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw_config: RawConfig =
            toml::from_str(contents).context("Failed to parse TOML configuration")?;

        let config = Config {
            host: raw_config.host,
            port: raw_config.port,
            log_level: raw_config.log_level,
            max_clients: raw_config.max_clients,
            outbound_queue_capacity: raw_config.outbound_queue_capacity,
            writer_shutdown_timeout_ms: raw_config.writer_shutdown_timeout_ms,
            relay: raw_config.relay,
            triggers: raw_config.triggers,
            metrics: raw_config.metrics,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.max_clients == 0 {
            return Err(anyhow!("max_clients cannot be 0"));
        }
        if self.outbound_queue_capacity == 0 {
            return Err(anyhow!("outbound_queue_capacity cannot be 0"));
        }
        if self.outbound_queue_capacity < 8 {
            warn!(
                "low outbound_queue_capacity setting: {}. Bursty peers will see dropped messages.",
                self.outbound_queue_capacity
            );
        }

        let ws_path = &self.relay.ws_path;
        if !ws_path.starts_with('/') {
            return Err(anyhow!("relay.ws_path must start with '/'"));
        }
        if self.triggers.enabled && (ws_path == SEND_ONE_PATH || ws_path == SEND_MANY_PATH) {
            return Err(anyhow!(
                "relay.ws_path '{}' collides with a trigger route",
                ws_path
            ));
        }

        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(anyhow!("metrics.port cannot be 0"));
            }
            if self.metrics.port == self.port {
                return Err(anyhow!(
                    "metrics.port cannot be the same as the main server port"
                ));
            }
        }
        Ok(())
    }
}
