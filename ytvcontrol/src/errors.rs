use std::io;

use thiserror::Error;

use crate::platform::Platform;

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("no suitable media player found on {0}")]
    NoBackendAvailable(Platform),
    #[error("media player '{backend}' could not be started: {source}")]
    SpawnFailed {
        backend: String,
        #[source]
        source: io::Error,
    },
    #[error("remote control command '{command}' failed after {attempts} attempt(s)")]
    ControlChannelUnreachable { command: String, attempts: u32 },
    #[error("{operation} not supported by media player '{backend}'")]
    UnsupportedOperation { operation: String, backend: String },
    #[error("{0}")]
    InvalidState(String),
}

impl PlaybackError {
    pub fn spawn_failed(backend: &str, source: io::Error) -> Self {
        PlaybackError::SpawnFailed {
            backend: backend.to_string(),
            source,
        }
    }

    pub fn control_channel_unreachable(command: &str, attempts: u32) -> Self {
        PlaybackError::ControlChannelUnreachable {
            command: command.to_string(),
            attempts,
        }
    }

    pub fn unsupported_operation(operation: &str, backend: &str) -> Self {
        PlaybackError::UnsupportedOperation {
            operation: operation.to_string(),
            backend: backend.to_string(),
        }
    }

    pub fn invalid_state(message: &str) -> Self {
        PlaybackError::InvalidState(message.to_string())
    }
}
