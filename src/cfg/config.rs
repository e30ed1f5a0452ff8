// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// TCP acceptor / connection parameters.
    pub network: NetworkConfig,
    /// Sweeper timing knobs (defaults match the hardcoded original).
    pub timeouts: TimeoutConfig,
    /// Log level/output.
    pub logger: LoggerConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NetworkConfig {
    #[serde(rename = "PORT", alias = "port")]
    pub port: u16,
    #[serde(rename = "MAX_SESSION_COUNT", alias = "max_session_count")]
    pub max_session_count: u32,
    #[serde(rename = "CONCURRENT_THREAD_COUNT", alias = "concurrent_thread_count")]
    pub concurrent_thread_count: u32,
    #[serde(rename = "WORKER_THREAD_COUNT", alias = "worker_thread_count")]
    pub worker_thread_count: u32,
    #[serde(rename = "TCP_NODELAY", alias = "tcp_nodelay")]
    pub tcp_nodelay: bool,
    #[serde(rename = "SND_BUF_ZERO", alias = "snd_buf_zero")]
    pub snd_buf_zero: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimeoutConfig {
    #[serde(rename = "sweep_interval_ms", with = "serde_millis")]
    pub sweep_interval: Duration,
    #[serde(rename = "logged_in_timeout_ms", with = "serde_millis")]
    pub logged_in_timeout: Duration,
    #[serde(rename = "anonymous_timeout_ms", with = "serde_millis")]
    pub anonymous_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_millis(1_000),
            logged_in_timeout: Duration::from_millis(40_000),
            anonymous_timeout: Duration::from_millis(10_000),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoggerConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub output: LogOutput,
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
}

impl Config {
    /// Loads the configuration from YAML, validates it, and returns the
    /// ready-to-use value.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let cfg: Config =
            serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates invariants that the network/sweeper layers rely on.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.network.port > 0, "PORT must be nonzero");
        ensure!(
            self.network.max_session_count >= 1,
            "MAX_SESSION_COUNT must be >= 1"
        );
        ensure!(
            self.network.worker_thread_count >= 1,
            "WORKER_THREAD_COUNT must be >= 1"
        );
        ensure!(
            !self.timeouts.sweep_interval.is_zero(),
            "sweep_interval_ms must be > 0"
        );
        ensure!(
            self.timeouts.anonymous_timeout <= self.timeouts.logged_in_timeout,
            "anonymous_timeout_ms should not exceed logged_in_timeout_ms"
        );
        Ok(())
    }
}

/// Serde helper for representing `Duration` as a count of milliseconds.
mod serde_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}
