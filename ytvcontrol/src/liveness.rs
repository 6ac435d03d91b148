//! Exit detection for spawned media players.
//!
//! Two mechanisms cooperate:
//! - a watcher thread per process blocks in `wait()` and reports the exit
//!   (see [`crate::supervisor`]);
//! - [`process_finished`] is a non-invasive probe the UI refresh timer can
//!   call at any time.
//!
//! Launchers such as macOS `open` exit as soon as they hand the stream to
//! another application, so for those backends neither mechanism can observe
//! the end of playback.

use crate::backend::BackendDescriptor;
use crate::supervisor::{ProcessHandle, signals};

/// How the end of playback is observed for a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchStrategy {
    /// The spawned process is the player: its exit is the end of playback.
    Blocking,
    /// The spawned process is a launcher: it is reaped, its exit means nothing.
    ReapOnly,
}

impl WatchStrategy {
    pub fn for_backend(descriptor: &BackendDescriptor) -> Self {
        if descriptor.supports_process_watch {
            WatchStrategy::Blocking
        } else {
            WatchStrategy::ReapOnly
        }
    }

    pub fn reports_exit(&self) -> bool {
        matches!(self, WatchStrategy::Blocking)
    }
}

/// True once the player behind `handle` is gone.
///
/// Always false for backends whose playback cannot be observed.
pub fn process_finished(handle: &ProcessHandle, descriptor: &BackendDescriptor) -> bool {
    if !WatchStrategy::for_backend(descriptor).reports_exit() {
        return false;
    }
    handle.has_exited() || !signals::is_alive(handle.pid())
}
