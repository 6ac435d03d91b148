//! Playback control for streaming audio through external media players.
//!
//! The crate launches an installed player (VLC, mpv, mplayer, Windows Media
//! Player or QuickTime depending on the OS) for a stream URL and then pauses,
//! resumes and stops it, either through the player's HTTP control interface
//! or through OS process signals.
//!
//! ```no_run
//! use ytvcontrol::{ControllerOptions, PlaybackController, RemoteControlConfig};
//!
//! let controller = PlaybackController::for_current_platform(
//!     &RemoteControlConfig::default(),
//!     ControllerOptions::default(),
//! );
//! controller.play("https://example.org/stream.m4a")?;
//! controller.pause()?;
//! controller.resume()?;
//! controller.stop()?;
//! # Ok::<(), ytvcontrol::PlaybackError>(())
//! ```

mod events;

pub mod backend;
pub mod controller;
pub mod errors;
pub mod liveness;
pub mod model;
pub mod platform;
pub mod remote_control;
pub mod session;
pub mod supervisor;
pub mod time_utils;

pub use backend::{
    BackendDescriptor, BackendResolver, BackendTable, ControlTarget, Locator, ResolvedBackend,
};
pub use controller::{ControllerOptions, PlaybackController};
pub use errors::PlaybackError;
pub use liveness::WatchStrategy;
pub use model::{PlaybackEvent, PlaybackSnapshot, PlaybackState};
pub use platform::Platform;
pub use remote_control::{RemoteCommand, RemoteControlClient, RemoteControlConfig};
pub use session::PauseMechanism;
pub use supervisor::{ProcessHandle, ProcessSupervisor};
