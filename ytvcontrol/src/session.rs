//! The one mutable record of what is currently playing.

use std::time::{Duration, Instant};

use crate::backend::ResolvedBackend;
use crate::model::PlaybackState;
use crate::supervisor::ProcessHandle;

/// How the current player was paused. Resuming must go through the same path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PauseMechanism {
    /// The player's HTTP control channel.
    Remote,
    /// OS-level suspend (SIGSTOP or `killall -STOP`).
    Signal,
}

/// Current stream, player and timing.
///
/// A process handle is only ever recorded together with its backend and URL,
/// and `paused_by` can only be set while a process is recorded.
#[derive(Debug, Default)]
pub struct PlaybackSession {
    url: Option<String>,
    backend: Option<ResolvedBackend>,
    process: Option<ProcessHandle>,
    paused_by: Option<PauseMechanism>,
    started_at: Option<Instant>,
    elapsed: Duration,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        match (&self.process, self.paused_by) {
            (None, _) => PlaybackState::Stopped,
            (Some(_), Some(_)) => PlaybackState::Paused,
            (Some(_), None) => PlaybackState::Playing,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn backend(&self) -> Option<&ResolvedBackend> {
        self.backend.as_ref()
    }

    pub fn process(&self) -> Option<&ProcessHandle> {
        self.process.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_by.is_some()
    }

    pub fn paused_by(&self) -> Option<PauseMechanism> {
        self.paused_by
    }

    pub fn is_empty(&self) -> bool {
        self.process.is_none()
    }

    /// True if `handle_id` is the process currently recorded.
    pub fn is_current(&self, handle_id: u64) -> bool {
        self.process.as_ref().is_some_and(|p| p.id() == handle_id)
    }

    /// True if `url` is the paused stream, i.e. playing it again means resuming.
    pub fn is_paused_on(&self, url: &str) -> bool {
        self.is_paused() && self.process.is_some() && self.url.as_deref() == Some(url)
    }

    pub(crate) fn begin(
        &mut self,
        url: &str,
        backend: ResolvedBackend,
        process: ProcessHandle,
        now: Instant,
    ) {
        self.url = Some(url.to_string());
        self.backend = Some(backend);
        self.process = Some(process);
        self.paused_by = None;
        self.started_at = Some(now);
        self.elapsed = Duration::ZERO;
    }

    /// Freezes the elapsed time at `now`.
    pub(crate) fn mark_paused(&mut self, now: Instant, mechanism: PauseMechanism) {
        if self.process.is_none() || self.is_paused() {
            return;
        }
        self.elapsed = self.elapsed(now);
        self.paused_by = Some(mechanism);
    }

    /// Restarts the clock so that the frozen elapsed time carries on from `now`.
    pub(crate) fn mark_resumed(&mut self, now: Instant) {
        if self.process.is_none() || !self.is_paused() {
            return;
        }
        self.started_at = Some(now.checked_sub(self.elapsed).unwrap_or(now));
        self.paused_by = None;
    }

    /// Time spent playing, excluding paused intervals.
    pub fn elapsed(&self, now: Instant) -> Duration {
        if self.process.is_none() {
            return Duration::ZERO;
        }
        if self.is_paused() {
            return self.elapsed;
        }
        self.started_at
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or(self.elapsed)
    }

    /// Resets to empty, returning the URL that was playing.
    pub(crate) fn clear(&mut self) -> Option<String> {
        let url = self.url.take();
        *self = Self::default();
        url
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::backend::{BackendDescriptor, Locator};
    use crate::supervisor::ProcessSupervisor;

    fn running_session(now: Instant) -> PlaybackSession {
        let descriptor = BackendDescriptor::new("sh", Locator::Command("sh".into()), |_| {
            vec!["-c".to_string(), "exit 0".to_string(), "sh".to_string()]
        });
        let backend = ResolvedBackend {
            executable: descriptor.locator.locate().unwrap(),
            descriptor,
        };
        let handle = ProcessSupervisor::new()
            .start(&backend, "https://example/track", Box::new(|_| {}))
            .unwrap();

        let mut session = PlaybackSession::new();
        session.begin("https://example/track", backend, handle, now);
        session
    }

    #[test]
    fn test_empty_session_is_stopped() {
        let session = PlaybackSession::new();
        assert_eq!(session.state(), PlaybackState::Stopped);
        assert!(session.is_empty());
        assert_eq!(session.elapsed(Instant::now()), Duration::ZERO);
        assert!(!session.is_paused_on("https://example/track"));
    }

    #[test]
    fn test_pause_excludes_paused_interval() {
        let t0 = Instant::now();
        let mut session = running_session(t0);
        assert_eq!(session.state(), PlaybackState::Playing);

        session.mark_paused(t0 + Duration::from_secs(10), PauseMechanism::Signal);
        assert_eq!(session.state(), PlaybackState::Paused);
        assert_eq!(session.paused_by(), Some(PauseMechanism::Signal));
        assert_eq!(session.elapsed(t0 + Duration::from_secs(40)), Duration::from_secs(10));

        session.mark_resumed(t0 + Duration::from_secs(60));
        assert_eq!(session.state(), PlaybackState::Playing);
        assert_eq!(session.elapsed(t0 + Duration::from_secs(65)), Duration::from_secs(15));
        assert_eq!(session.paused_by(), None);
    }

    #[test]
    fn test_repeated_pause_keeps_first_freeze() {
        let t0 = Instant::now();
        let mut session = running_session(t0);

        session.mark_paused(t0 + Duration::from_secs(5), PauseMechanism::Remote);
        session.mark_paused(t0 + Duration::from_secs(50), PauseMechanism::Signal);
        assert_eq!(session.elapsed(t0 + Duration::from_secs(90)), Duration::from_secs(5));
        assert_eq!(session.paused_by(), Some(PauseMechanism::Remote));
    }

    #[test]
    fn test_paused_on_matches_url_only() {
        let t0 = Instant::now();
        let mut session = running_session(t0);
        assert!(!session.is_paused_on("https://example/track"));

        session.mark_paused(t0, PauseMechanism::Remote);
        assert!(session.is_paused_on("https://example/track"));
        assert!(!session.is_paused_on("https://example/other"));
    }

    #[test]
    fn test_clear_resets_everything() {
        let t0 = Instant::now();
        let mut session = running_session(t0);
        let id = session.process().unwrap().id();
        assert!(session.is_current(id));

        assert_eq!(session.clear().as_deref(), Some("https://example/track"));
        assert_eq!(session.state(), PlaybackState::Stopped);
        assert!(!session.is_current(id));
        assert!(session.url().is_none());
        assert!(session.backend().is_none());
        assert!(session.clear().is_none());
    }
}
