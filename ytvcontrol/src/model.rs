use std::fmt;

use serde::Serialize;

/// High-level playback state exposed to the UI layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    /// Returns a human-readable label for the playback state.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    StateChanged {
        state: PlaybackState,
        url: Option<String>,
    },
    /// The media player exited on its own (end of stream or closed by the user).
    Finished { url: String },
}

/// Point-in-time view of the session, used to refresh a progress display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub url: Option<String>,
    pub backend: Option<String>,
    pub elapsed_ms: u64,
}
