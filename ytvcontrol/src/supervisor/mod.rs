//! Spawning, termination and reaping of media player processes.

pub mod signals;

use std::fmt;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::backend::{BackendDescriptor, ControlTarget, ResolvedBackend};
use crate::errors::PlaybackError;
use crate::liveness::WatchStrategy;
use crate::remote_control::RemoteControlClient;

/// Reported by a watcher once its process has been reaped.
#[derive(Debug)]
pub struct ProcessExit {
    pub handle_id: u64,
    pub status: Option<ExitStatus>,
}

pub type ExitCallback = Box<dyn FnOnce(ProcessExit) + Send + 'static>;

/// Reference to a spawned player. The `Child` itself is owned by its watcher.
#[derive(Clone)]
pub struct ProcessHandle {
    id: u64,
    pid: u32,
    backend: String,
    exited: Arc<AtomicBool>,
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("id", &self.id)
            .field("pid", &self.pid)
            .field("backend", &self.backend)
            .field("exited", &self.has_exited())
            .finish()
    }
}

impl ProcessHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Set by the watcher after the process has been reaped.
    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct ProcessSupervisor {
    next_id: AtomicU64,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `backend` for `url` and attaches a watcher thread to it.
    ///
    /// `on_exit` runs on the watcher thread once the process has exited,
    /// unless the backend is a launcher whose exit means nothing.
    pub fn start(
        &self,
        backend: &ResolvedBackend,
        url: &str,
        on_exit: ExitCallback,
    ) -> Result<ProcessHandle, PlaybackError> {
        let name = backend.name();
        let args = backend.descriptor.launch_args(url);

        let mut command = Command::new(&backend.executable);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            use winapi::um::winbase::CREATE_NO_WINDOW;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let mut child = command
            .spawn()
            .map_err(|err| PlaybackError::spawn_failed(name, err))?;

        let handle = ProcessHandle {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            pid: child.id(),
            backend: name.to_string(),
            exited: Arc::new(AtomicBool::new(false)),
        };

        info!(backend = name, pid = handle.pid, handle = handle.id, "Media player started");

        let strategy = WatchStrategy::for_backend(&backend.descriptor);
        let exited = Arc::clone(&handle.exited);
        let handle_id = handle.id;
        let watcher_name = name.to_string();

        let spawned = thread::Builder::new()
            .name(format!("watcher-{}", name))
            .spawn(move || {
                let status = match child.wait() {
                    Ok(status) => Some(status),
                    Err(err) => {
                        warn!(backend = %watcher_name, error = %err, "Failed to wait for media player");
                        None
                    }
                };
                exited.store(true, Ordering::SeqCst);
                debug!(backend = %watcher_name, handle = handle_id, status = ?status, "Media player exited");

                if strategy.reports_exit() {
                    on_exit(ProcessExit { handle_id, status });
                }
            });

        if let Err(err) = spawned {
            let _ = signals::terminate(&ControlTarget::Pid, handle.pid);
            return Err(PlaybackError::spawn_failed(name, err));
        }

        Ok(handle)
    }

    /// Terminates the player behind `handle`.
    ///
    /// A polite remote stop is tried first when a control channel exists,
    /// followed by `grace` before the OS-level termination. Reaping is left to
    /// the watcher.
    pub fn stop(
        &self,
        handle: &ProcessHandle,
        descriptor: &BackendDescriptor,
        remote: Option<&RemoteControlClient>,
        grace: Duration,
    ) {
        if handle.has_exited() && descriptor.control_target == ControlTarget::Pid {
            debug!(backend = handle.backend(), pid = handle.pid, "Media player already exited");
            return;
        }

        if let Some(remote) = remote {
            match remote.stop() {
                Ok(()) => thread::sleep(grace),
                Err(err) => debug!(backend = handle.backend(), error = %err, "Remote stop failed"),
            }
        }

        match signals::terminate(&descriptor.control_target, handle.pid) {
            Ok(()) => info!(backend = handle.backend(), pid = handle.pid, "Media player terminated"),
            Err(err) => warn!(
                backend = handle.backend(),
                pid = handle.pid,
                error = %err,
                "Failed to terminate media player"
            ),
        }

        // A name-targeted kill can miss the child we spawned (renamed or re-exec'd).
        if descriptor.control_target != ControlTarget::Pid && !handle.has_exited() {
            if let Err(err) = signals::terminate(&ControlTarget::Pid, handle.pid) {
                debug!(backend = handle.backend(), pid = handle.pid, error = %err, "Spawned process already gone");
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::backend::Locator;
    use crossbeam_channel::bounded;

    fn shell_backend(script: &'static str) -> ResolvedBackend {
        let descriptor = BackendDescriptor::new("sh", Locator::Command("sh".into()), move |_| {
            vec!["-c".to_string(), script.to_string(), "sh".to_string()]
        });
        ResolvedBackend {
            executable: descriptor.locator.locate().unwrap(),
            descriptor,
        }
    }

    #[test]
    fn test_watcher_reports_natural_exit() {
        let supervisor = ProcessSupervisor::new();
        let (tx, rx) = bounded(1);

        let handle = supervisor
            .start(&shell_backend("exit 0"), "https://example/track", Box::new(move |exit| {
                let _ = tx.send(exit);
            }))
            .unwrap();

        let exit = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(exit.handle_id, handle.id());
        assert!(exit.status.unwrap().success());
        assert!(handle.has_exited());
    }

    #[test]
    fn test_url_reaches_the_player_as_an_argument() {
        let supervisor = ProcessSupervisor::new();
        let (tx, rx) = bounded(1);

        // Exit status 0 only if $1 is exactly the URL.
        let backend = shell_backend(r#"test "$1" = 'https://example/a b;$(x)'"#);
        supervisor
            .start(&backend, "https://example/a b;$(x)", Box::new(move |exit| {
                let _ = tx.send(exit);
            }))
            .unwrap();

        let exit = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(exit.status.unwrap().success());
    }

    #[test]
    fn test_handles_get_distinct_ids() {
        let supervisor = ProcessSupervisor::new();
        let backend = shell_backend("exit 0");
        let a = supervisor.start(&backend, "a", Box::new(|_| {})).unwrap();
        let b = supervisor.start(&backend, "b", Box::new(|_| {})).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_stop_terminates_running_player() {
        let supervisor = ProcessSupervisor::new();
        let (tx, rx) = bounded(1);
        let backend = shell_backend("exec sleep 30");

        let handle = supervisor
            .start(&backend, "https://example/track", Box::new(move |exit| {
                let _ = tx.send(exit);
            }))
            .unwrap();
        supervisor.stop(&handle, &backend.descriptor, None, Duration::ZERO);

        let exit = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(!exit.status.unwrap().success());
    }

    #[test]
    fn test_stop_by_name_also_signals_the_spawned_pid() {
        let supervisor = ProcessSupervisor::new();
        let (tx, rx) = bounded(1);
        let mut backend = shell_backend("exec sleep 30");
        backend.descriptor = backend
            .descriptor
            .with_control_target(ControlTarget::ProcessName("ytview-no-such-player".into()));

        let handle = supervisor
            .start(&backend, "https://example/track", Box::new(move |exit| {
                let _ = tx.send(exit);
            }))
            .unwrap();
        supervisor.stop(&handle, &backend.descriptor, None, Duration::ZERO);

        let exit = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(exit.handle_id, handle.id());
        assert!(!signals::is_alive(handle.pid()));
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let not_executable = dir.path().join("player");
        std::fs::write(&not_executable, b"not a program").unwrap();

        let backend = ResolvedBackend {
            descriptor: BackendDescriptor::new(
                "broken",
                Locator::Paths(vec![not_executable.clone()]),
                |_| Vec::new(),
            ),
            executable: not_executable,
        };

        let err = ProcessSupervisor::new()
            .start(&backend, "u", Box::new(|_| {}))
            .unwrap_err();
        assert!(matches!(err, PlaybackError::SpawnFailed { ref backend, .. } if backend == "broken"));
    }
}
