use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::descriptor::{BackendDescriptor, ControlTarget, Locator};
use crate::platform::Platform;
use crate::remote_control::RemoteControlConfig;

const VLC_HTTP_STARTUP_MS: u64 = 100;
const QUICKTIME_PROCESS: &str = "QuickTime Player";

/// Per-OS ordered lists of candidate media players.
#[derive(Clone, Debug, Default)]
pub struct BackendTable {
    entries: Vec<(Platform, BackendDescriptor)>,
}

impl BackendTable {
    pub fn new(entries: Vec<(Platform, BackendDescriptor)>) -> Self {
        Self { entries }
    }

    /// Players known for every supported OS, VLC's HTTP interface wired to `remote`.
    pub fn builtin(remote: &RemoteControlConfig) -> Self {
        let mut entries = Vec::new();
        for descriptor in macos_backends(remote) {
            entries.push((Platform::MacOs, descriptor));
        }
        for descriptor in windows_backends(remote) {
            entries.push((Platform::Windows, descriptor));
        }
        for descriptor in linux_backends(remote) {
            entries.push((Platform::Linux, descriptor));
        }
        Self { entries }
    }

    /// Candidates for `platform`, in priority order.
    pub fn candidates(&self, platform: &Platform) -> Vec<&BackendDescriptor> {
        self.entries
            .iter()
            .filter(|(p, _)| p == platform)
            .map(|(_, descriptor)| descriptor)
            .collect()
    }
}

fn vlc_http_args(remote: Option<&RemoteControlConfig>) -> Vec<String> {
    match remote {
        Some(rc) => vec![
            "--extraintf".to_string(),
            "http".to_string(),
            "--http-host".to_string(),
            rc.host.clone(),
            "--http-port".to_string(),
            rc.port.to_string(),
            "--http-password".to_string(),
            rc.password.clone(),
        ],
        None => Vec::new(),
    }
}

fn vlc(
    name: &str,
    locator: Locator,
    remote: &RemoteControlConfig,
    leading: &'static [&'static str],
) -> BackendDescriptor {
    BackendDescriptor::new(name, locator, move |rc| {
        let mut args: Vec<String> = leading.iter().map(|a| a.to_string()).collect();
        args.extend(vlc_http_args(rc));
        args.push("--no-video".to_string());
        args.push("--play-and-exit".to_string());
        args
    })
    .with_remote_control(remote.clone())
    .with_startup_delay(Duration::from_millis(VLC_HTTP_STARTUP_MS))
}

fn macos_backends(remote: &RemoteControlConfig) -> Vec<BackendDescriptor> {
    let mut vlc_paths = vec![PathBuf::from("/Applications/VLC.app/Contents/MacOS/VLC")];
    if let Some(home) = dirs::home_dir() {
        vlc_paths.push(home.join("Applications/VLC.app/Contents/MacOS/VLC"));
    }

    vec![
        vlc("vlc", Locator::Paths(vlc_paths), remote, &["--intf", "http"]),
        BackendDescriptor::new("quicktime", Locator::Command("open".to_string()), |_| {
            vec!["-g".to_string(), "-a".to_string(), QUICKTIME_PROCESS.to_string()]
        })
        .with_process_watch(false)
        .with_control_target(ControlTarget::ProcessName(QUICKTIME_PROCESS.to_string())),
    ]
}

/// `<%var%>\<suffix>` for each of the given environment variables that is set.
fn program_files_paths(vars: &[&str], suffix: &[&str]) -> Vec<PathBuf> {
    vars.iter()
        .filter_map(|var| env::var_os(var))
        .map(|root| suffix.iter().fold(PathBuf::from(root), |path, part| path.join(part)))
        .collect()
}

fn windows_backends(remote: &RemoteControlConfig) -> Vec<BackendDescriptor> {
    let roots = ["ProgramFiles(x86)", "ProgramFiles"];

    vec![
        BackendDescriptor::new(
            "wmplayer",
            Locator::Paths(program_files_paths(&roots, &["Windows Media Player", "wmplayer.exe"])),
            |_| Vec::new(),
        ),
        vlc(
            "vlc",
            Locator::Paths(program_files_paths(&roots, &["VideoLAN", "VLC", "vlc.exe"])),
            remote,
            &["--qt-start-minimized"],
        ),
    ]
}

fn linux_backends(remote: &RemoteControlConfig) -> Vec<BackendDescriptor> {
    vec![
        vlc("vlc", Locator::Command("vlc".to_string()), remote, &["--intf", "dummy"]),
        BackendDescriptor::new("mpv", Locator::Command("mpv".to_string()), |_| {
            vec!["--no-video".to_string(), "--really-quiet".to_string()]
        }),
        BackendDescriptor::new("mplayer", Locator::Command("mplayer".to_string()), |_| {
            vec!["-novideo".to_string(), "-really-quiet".to_string()]
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(table: &BackendTable, platform: &Platform) -> Vec<String> {
        table
            .candidates(platform)
            .into_iter()
            .map(|d| d.name.clone())
            .collect()
    }

    #[test]
    fn test_builtin_priority_order() {
        let table = BackendTable::builtin(&RemoteControlConfig::default());
        assert_eq!(names(&table, &Platform::MacOs), vec!["vlc", "quicktime"]);
        assert_eq!(names(&table, &Platform::Windows), vec!["wmplayer", "vlc"]);
        assert_eq!(names(&table, &Platform::Linux), vec!["vlc", "mpv", "mplayer"]);
        assert!(names(&table, &Platform::Other("haiku".into())).is_empty());
    }

    #[test]
    fn test_vlc_args_carry_remote_control_settings() {
        let remote = RemoteControlConfig {
            port: 9123,
            password: "hunter2".to_string(),
            ..RemoteControlConfig::default()
        };
        let table = BackendTable::builtin(&remote);
        let vlc = table.candidates(&Platform::MacOs)[0];

        assert!(vlc.supports_remote_control());
        let args = vlc.launch_args("https://example/track");
        let port_idx = args.iter().position(|a| a == "--http-port").unwrap();
        assert_eq!(args[port_idx + 1], "9123");
        let pw_idx = args.iter().position(|a| a == "--http-password").unwrap();
        assert_eq!(args[pw_idx + 1], "hunter2");
        assert_eq!(args.last().unwrap(), "https://example/track");
    }

    #[test]
    fn test_quicktime_is_not_watchable() {
        let table = BackendTable::builtin(&RemoteControlConfig::default());
        let quicktime = table.candidates(&Platform::MacOs)[1];

        assert!(!quicktime.supports_process_watch);
        assert!(!quicktime.supports_remote_control());
        assert_eq!(
            quicktime.control_target,
            ControlTarget::ProcessName("QuickTime Player".to_string())
        );
        assert_eq!(
            quicktime.launch_args("u"),
            vec!["-g", "-a", "QuickTime Player", "u"]
        );
    }

    #[test]
    fn test_linux_players_without_remote_control() {
        let table = BackendTable::builtin(&RemoteControlConfig::default());
        let linux = table.candidates(&Platform::Linux);

        assert!(linux[0].supports_remote_control());
        assert!(!linux[1].supports_remote_control());
        assert!(!linux[2].supports_remote_control());
        assert_eq!(linux[1].launch_args("u"), vec!["--no-video", "--really-quiet", "u"]);
    }
}
