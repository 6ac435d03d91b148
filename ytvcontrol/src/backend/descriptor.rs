use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::remote_control::RemoteControlConfig;

/// Builds the leading launch arguments. The stream URL is appended after them.
pub type ArgTemplate = Arc<dyn Fn(Option<&RemoteControlConfig>) -> Vec<String> + Send + Sync>;

/// How the executable of a backend is found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Locator {
    /// Candidate filesystem locations, tried in order.
    Paths(Vec<PathBuf>),
    /// Name looked up on `PATH`.
    Command(String),
}

impl Locator {
    /// Returns the executable path if this locator finds one.
    pub fn locate(&self) -> Option<PathBuf> {
        match self {
            Locator::Paths(paths) => paths.iter().find(|path| path.is_file()).cloned(),
            Locator::Command(name) => which::which(name).ok(),
        }
    }
}

/// Process that OS-level signals (suspend, continue, terminate) are aimed at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlTarget {
    /// The spawned process itself.
    Pid,
    /// A process found by name, for launchers that hand the stream over to
    /// another application and exit.
    ProcessName(String),
}

/// Static description of a candidate media player.
#[derive(Clone)]
pub struct BackendDescriptor {
    pub name: String,
    pub locator: Locator,
    args: ArgTemplate,
    pub remote_control: Option<RemoteControlConfig>,
    pub supports_process_watch: bool,
    pub control_target: ControlTarget,
    /// Delay after spawning before the control endpoint is expected to answer.
    pub startup_delay: Duration,
}

impl fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("name", &self.name)
            .field("locator", &self.locator)
            .field("remote_control", &self.remote_control)
            .field("supports_process_watch", &self.supports_process_watch)
            .field("control_target", &self.control_target)
            .field("startup_delay", &self.startup_delay)
            .finish()
    }
}

impl BackendDescriptor {
    pub fn new<F>(name: &str, locator: Locator, args: F) -> Self
    where
        F: Fn(Option<&RemoteControlConfig>) -> Vec<String> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            locator,
            args: Arc::new(args),
            remote_control: None,
            supports_process_watch: true,
            control_target: ControlTarget::Pid,
            startup_delay: Duration::ZERO,
        }
    }

    pub fn with_remote_control(mut self, config: RemoteControlConfig) -> Self {
        self.remote_control = Some(config);
        self
    }

    pub fn with_process_watch(mut self, supported: bool) -> Self {
        self.supports_process_watch = supported;
        self
    }

    pub fn with_control_target(mut self, target: ControlTarget) -> Self {
        self.control_target = target;
        self
    }

    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    pub fn supports_remote_control(&self) -> bool {
        self.remote_control.is_some()
    }

    /// Full argument list for `url`, the URL always being the last, discrete argument.
    pub fn launch_args(&self, url: &str) -> Vec<String> {
        let mut args = (self.args)(self.remote_control.as_ref());
        args.push(url.to_string());
        args
    }
}
