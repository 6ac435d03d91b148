//! Playback state machine.
//!
//! `PlaybackController` owns the single [`PlaybackSession`] and serializes
//! every transition behind one lock: `play`, `pause`, `resume`, `stop`,
//! `cleanup`, the liveness probe and the exit reports of watcher threads.
//! Watchers hold only a weak reference and check that the exiting process is
//! still the current one before clearing anything, so a late report for a
//! replaced process is ignored.

use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::backend::{BackendResolver, BackendTable, ResolvedBackend};
use crate::errors::PlaybackError;
use crate::events::PlaybackEventBus;
use crate::liveness::process_finished;
use crate::model::{PlaybackEvent, PlaybackSnapshot, PlaybackState};
use crate::platform::Platform;
use crate::remote_control::{RemoteControlClient, RemoteControlConfig};
use crate::session::{PauseMechanism, PlaybackSession};
use crate::supervisor::{ProcessExit, ProcessHandle, ProcessSupervisor, signals};

const DEFAULT_STOP_GRACE_MS: u64 = 100;

#[derive(Clone, Debug)]
pub struct ControllerOptions {
    /// Pause between a polite remote stop and the OS-level termination.
    pub stop_grace: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            stop_grace: Duration::from_millis(DEFAULT_STOP_GRACE_MS),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ControlOp {
    Pause,
    Resume,
}

impl ControlOp {
    fn as_str(&self) -> &'static str {
        match self {
            ControlOp::Pause => "pause",
            ControlOp::Resume => "resume",
        }
    }
}

struct ControllerInner {
    platform: Platform,
    resolver: BackendResolver,
    supervisor: ProcessSupervisor,
    stop_grace: Duration,
    session: Mutex<PlaybackSession>,
    events: PlaybackEventBus,
}

/// Play/pause/stop façade over an external media player process.
///
/// Cloning is cheap; every clone drives the same session.
#[derive(Clone)]
pub struct PlaybackController {
    inner: Arc<ControllerInner>,
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("platform", &self.inner.platform)
            .field("session", &*self.inner.session.lock())
            .finish()
    }
}

impl PlaybackController {
    pub fn new(platform: Platform, table: BackendTable, options: ControllerOptions) -> Self {
        let inner = ControllerInner {
            platform,
            resolver: BackendResolver::new(table),
            supervisor: ProcessSupervisor::new(),
            stop_grace: options.stop_grace,
            session: Mutex::new(PlaybackSession::new()),
            events: PlaybackEventBus::new(),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Controller over the built-in players of the running OS.
    ///
    /// `remote_control` is the endpoint handed to players that expose one.
    pub fn for_current_platform(remote_control: &RemoteControlConfig, options: ControllerOptions) -> Self {
        let table = BackendTable::builtin(remote_control);
        Self::new(Platform::current(), table, options)
    }

    pub fn platform(&self) -> &Platform {
        &self.inner.platform
    }

    pub fn resolver(&self) -> &BackendResolver {
        &self.inner.resolver
    }

    pub fn subscribe(&self) -> Receiver<PlaybackEvent> {
        self.inner.events.subscribe()
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Plays `url`, or resumes it if it is the paused stream.
    ///
    /// Any other current stream is stopped before the new player is spawned.
    /// If no player is installed the current session is left untouched.
    pub fn play(&self, url: &str) -> Result<(), PlaybackError> {
        if url.trim().is_empty() {
            return Err(PlaybackError::invalid_state("cannot play an empty URL"));
        }

        let mut session = self.inner.session.lock();

        if session.is_paused_on(url) {
            debug!(url, "Resuming paused stream");
            return self.resume_locked(&mut session);
        }

        let candidates = self.inner.resolver.available(&self.inner.platform);
        if candidates.is_empty() {
            warn!(platform = %self.inner.platform, "No suitable media player found");
            return Err(PlaybackError::NoBackendAvailable(self.inner.platform.clone()));
        }

        if !session.is_empty() {
            self.stop_locked(&mut session);
        }

        let mut last_error = None;
        for backend in candidates {
            match self.spawn(&backend, url) {
                Ok(handle) => {
                    if !backend.descriptor.startup_delay.is_zero() {
                        thread::sleep(backend.descriptor.startup_delay);
                    }
                    info!(backend = backend.name(), url, "Playback started");
                    session.begin(url, backend, handle, Instant::now());
                    self.emit_state(&session);
                    return Ok(());
                }
                Err(err) => {
                    warn!(backend = backend.name(), error = %err, "Media player failed to start, trying next");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| PlaybackError::NoBackendAvailable(self.inner.platform.clone())))
    }

    pub fn pause(&self) -> Result<(), PlaybackError> {
        let mut session = self.inner.session.lock();
        if session.is_empty() {
            return Err(PlaybackError::invalid_state("no media is playing"));
        }
        if session.is_paused() {
            return Ok(());
        }
        self.pause_locked(&mut session)
    }

    pub fn resume(&self) -> Result<(), PlaybackError> {
        let mut session = self.inner.session.lock();
        if session.is_empty() {
            return Err(PlaybackError::invalid_state("no paused media to resume"));
        }
        if !session.is_paused() {
            return Ok(());
        }
        self.resume_locked(&mut session)
    }

    /// Stops playback. A no-op on a stopped session.
    pub fn stop(&self) -> Result<(), PlaybackError> {
        let mut session = self.inner.session.lock();
        if session.is_empty() {
            return Ok(());
        }
        self.stop_locked(&mut session);
        Ok(())
    }

    /// Best-effort shutdown hook; never fails and may be called repeatedly.
    pub fn cleanup(&self) {
        let mut session = self.inner.session.lock();
        if session.is_empty() {
            return;
        }
        debug!("Cleaning up playback");
        self.stop_locked(&mut session);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn state(&self) -> PlaybackState {
        self.inner.session.lock().state()
    }

    /// Liveness probe for the current player.
    ///
    /// Returns true when nothing is playing. A player found dead clears the
    /// session exactly as its watcher would.
    pub fn is_finished(&self) -> bool {
        let mut session = self.inner.session.lock();
        let finished = match (session.process(), session.backend()) {
            (Some(process), Some(backend)) => process_finished(process, &backend.descriptor),
            _ => return true,
        };
        if finished {
            debug!("Liveness probe found the media player gone");
            self.finish_locked(&mut session);
        }
        finished
    }

    pub fn now_playing(&self) -> Option<String> {
        self.inner.session.lock().url().map(str::to_string)
    }

    pub fn backend_name(&self) -> Option<String> {
        self.inner
            .session
            .lock()
            .backend()
            .map(|b| b.name().to_string())
    }

    pub fn process_id(&self) -> Option<u32> {
        self.inner.session.lock().process().map(|p| p.pid())
    }

    /// Playing time of the current stream, excluding pauses.
    pub fn elapsed(&self) -> Duration {
        self.inner.session.lock().elapsed(Instant::now())
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let session = self.inner.session.lock();
        PlaybackSnapshot {
            state: session.state(),
            url: session.url().map(str::to_string),
            backend: session.backend().map(|b| b.name().to_string()),
            elapsed_ms: session.elapsed(Instant::now()).as_millis() as u64,
        }
    }

    // =========================================================================
    // Internals (session lock held by the caller)
    // =========================================================================

    fn spawn(&self, backend: &ResolvedBackend, url: &str) -> Result<ProcessHandle, PlaybackError> {
        let weak: Weak<ControllerInner> = Arc::downgrade(&self.inner);
        self.inner.supervisor.start(
            backend,
            url,
            Box::new(move |exit| {
                if let Some(inner) = weak.upgrade() {
                    PlaybackController { inner }.handle_exit(exit);
                }
            }),
        )
    }

    fn handle_exit(&self, exit: ProcessExit) {
        let mut session = self.inner.session.lock();
        if !session.is_current(exit.handle_id) {
            debug!(handle = exit.handle_id, "Ignoring exit of a replaced media player");
            return;
        }
        info!(handle = exit.handle_id, status = ?exit.status, "Media player finished");
        self.finish_locked(&mut session);
    }

    fn finish_locked(&self, session: &mut PlaybackSession) {
        if let Some(url) = session.clear() {
            self.inner.events.broadcast(PlaybackEvent::Finished { url });
            self.emit_state(session);
        }
    }

    fn stop_locked(&self, session: &mut PlaybackSession) {
        if let (Some(process), Some(backend)) = (session.process(), session.backend()) {
            // A suspended player cannot answer its control channel.
            let remote = match session.paused_by() {
                Some(PauseMechanism::Signal) => None,
                _ => backend
                    .descriptor
                    .remote_control
                    .clone()
                    .map(RemoteControlClient::new),
            };
            self.inner.supervisor.stop(
                process,
                &backend.descriptor,
                remote.as_ref(),
                self.inner.stop_grace,
            );
        }
        if let Some(url) = session.clear() {
            info!(url = %url, "Playback stopped");
            self.emit_state(session);
        }
    }

    /// Pause: remote control first, OS-level suspend as fallback.
    fn pause_locked(&self, session: &mut PlaybackSession) -> Result<(), PlaybackError> {
        let (Some(process), Some(backend)) = (session.process(), session.backend()) else {
            return Err(PlaybackError::invalid_state("no media is playing"));
        };
        let descriptor = &backend.descriptor;
        let op = ControlOp::Pause;

        let mut mechanism = None;

        if let Some(config) = &descriptor.remote_control {
            match RemoteControlClient::new(config.clone()).pause() {
                Ok(()) => mechanism = Some(PauseMechanism::Remote),
                Err(err) => warn!(backend = %descriptor.name, error = %err, "Remote pause failed, falling back to signals"),
            }
        }

        if mechanism.is_none() && signals::supports_suspend() {
            match signals::suspend(&descriptor.control_target, process.pid()) {
                Ok(()) => mechanism = Some(PauseMechanism::Signal),
                Err(err) => warn!(backend = %descriptor.name, error = %err, "OS-level pause failed"),
            }
        }

        let Some(mechanism) = mechanism else {
            return Err(PlaybackError::unsupported_operation(op.as_str(), &descriptor.name));
        };

        session.mark_paused(Instant::now(), mechanism);
        info!(state = %session.state(), ?mechanism, "Playback paused");
        self.emit_state(session);
        Ok(())
    }

    /// Resume through whichever mechanism paused the player.
    ///
    /// A failure leaves the session paused.
    fn resume_locked(&self, session: &mut PlaybackSession) -> Result<(), PlaybackError> {
        let (Some(process), Some(backend)) = (session.process(), session.backend()) else {
            return Err(PlaybackError::invalid_state("no media is playing"));
        };
        let descriptor = &backend.descriptor;
        let op = ControlOp::Resume;

        match session.paused_by() {
            Some(PauseMechanism::Remote) => {
                let Some(config) = &descriptor.remote_control else {
                    return Err(PlaybackError::unsupported_operation(op.as_str(), &descriptor.name));
                };
                if let Err(err) = RemoteControlClient::new(config.clone()).resume() {
                    warn!(backend = %descriptor.name, error = %err, "Remote resume failed");
                    return Err(err);
                }
            }
            Some(PauseMechanism::Signal) => {
                if let Err(err) = signals::resume(&descriptor.control_target, process.pid()) {
                    warn!(backend = %descriptor.name, error = %err, "OS-level resume failed");
                    return Err(PlaybackError::unsupported_operation(op.as_str(), &descriptor.name));
                }
            }
            None => return Ok(()),
        }

        session.mark_resumed(Instant::now());
        info!(state = %session.state(), "Playback resumed");
        self.emit_state(session);
        Ok(())
    }

    fn emit_state(&self, session: &PlaybackSession) {
        self.inner.events.broadcast(PlaybackEvent::StateChanged {
            state: session.state(),
            url: session.url().map(str::to_string),
        });
    }
}
