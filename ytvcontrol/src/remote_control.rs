//! HTTP control channel for media players exposing a local command endpoint.
//!
//! The VLC HTTP interface accepts `GET <path>?command=<name>` requests
//! authenticated with HTTP Basic (empty user name, shared password). Every
//! command is retried a bounded number of times with a fixed delay, since the
//! interface only comes up some time after the player process starts.

use std::fmt;
use std::thread;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, warn};
use ureq::Agent;

use crate::errors::PlaybackError;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_PASSWORD: &str = "ytview";
const DEFAULT_PATH: &str = "/requests/status.xml";
const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 100;
const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Endpoint and retry policy for a backend's control surface.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteControlConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub path: String,
    pub attempts: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl Default for RemoteControlConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: DEFAULT_PASSWORD.to_string(),
            path: DEFAULT_PATH.to_string(),
            attempts: DEFAULT_ATTEMPTS,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl fmt::Debug for RemoteControlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteControlConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("attempts", &self.attempts)
            .field("retry_delay", &self.retry_delay)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteCommand {
    Pause,
    Resume,
    Stop,
}

impl RemoteCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteCommand::Pause => "pl_pause",
            RemoteCommand::Resume => "pl_play",
            RemoteCommand::Stop => "pl_stop",
        }
    }
}

pub fn build_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// Client for the control endpoint described by a [`RemoteControlConfig`].
#[derive(Clone)]
pub struct RemoteControlClient {
    config: RemoteControlConfig,
    agent: Agent,
}

impl fmt::Debug for RemoteControlClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteControlClient")
            .field("config", &self.config)
            .finish()
    }
}

impl RemoteControlClient {
    pub fn new(config: RemoteControlConfig) -> Self {
        let agent = build_agent(config.timeout);
        Self { config, agent }
    }

    pub fn config(&self) -> &RemoteControlConfig {
        &self.config
    }

    pub fn pause(&self) -> Result<(), PlaybackError> {
        self.send(RemoteCommand::Pause)
    }

    pub fn resume(&self) -> Result<(), PlaybackError> {
        self.send(RemoteCommand::Resume)
    }

    pub fn stop(&self) -> Result<(), PlaybackError> {
        self.send(RemoteCommand::Stop)
    }

    /// Sends `command`, retrying up to the configured number of attempts.
    pub fn send(&self, command: RemoteCommand) -> Result<(), PlaybackError> {
        let attempts = self.config.attempts.max(1);

        for attempt in 1..=attempts {
            match self.send_once(command) {
                Ok(()) => {
                    debug!(command = command.as_str(), attempt, "Remote control command accepted");
                    return Ok(());
                }
                Err(err) => {
                    debug!(
                        command = command.as_str(),
                        attempt,
                        error = %err,
                        "Remote control command failed"
                    );
                    if attempt < attempts {
                        thread::sleep(self.config.retry_delay);
                    }
                }
            }
        }

        warn!(
            command = command.as_str(),
            attempts,
            host = %self.config.host,
            port = self.config.port,
            "Remote control endpoint unreachable"
        );
        Err(PlaybackError::control_channel_unreachable(
            command.as_str(),
            attempts,
        ))
    }

    fn send_once(&self, command: RemoteCommand) -> Result<(), ureq::Error> {
        self.agent
            .get(&self.command_url(command))
            .header("Authorization", &self.authorization())
            .call()?;
        Ok(())
    }

    fn command_url(&self, command: RemoteCommand) -> String {
        format!(
            "http://{}:{}{}?command={}",
            self.config.host,
            self.config.port,
            self.config.path,
            command.as_str()
        )
    }

    fn authorization(&self) -> String {
        let credentials = format!(":{}", self.config.password);
        format!("Basic {}", BASE64.encode(credentials))
    }
}
