//! End-to-end scenarios for the playback controller with stand-in players.
#![cfg(unix)]

use std::thread;
use std::time::{Duration, Instant};

use ytvcontrol::supervisor::signals;
use ytvcontrol::{
    BackendDescriptor, BackendTable, ControllerOptions, Locator, Platform, PlaybackController,
    PlaybackError, PlaybackState,
};

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    condition()
}

fn stand_in(name: &str, script: &'static str) -> BackendDescriptor {
    BackendDescriptor::new(name, Locator::Command("sh".into()), move |_| {
        vec!["-c".to_string(), script.to_string(), "ytview-test".to_string()]
    })
}

fn controller(platform: Platform, descriptors: Vec<BackendDescriptor>) -> PlaybackController {
    let table = BackendTable::new(
        descriptors
            .into_iter()
            .map(|d| (platform.clone(), d))
            .collect(),
    );
    PlaybackController::new(platform, table, ControllerOptions::default())
}

#[test]
fn test_no_player_installed() {
    let ghost = BackendDescriptor::new(
        "ghost",
        Locator::Command("ytview-no-such-player".into()),
        |_| Vec::new(),
    );
    let controller = controller(Platform::Linux, vec![ghost]);

    let err = controller.play("https://example/a").unwrap_err();
    assert!(matches!(err, PlaybackError::NoBackendAvailable(Platform::Linux)));
    assert_eq!(controller.state(), PlaybackState::Stopped);
    assert!(controller.is_finished());
}

#[test]
fn test_unknown_platform_has_no_player() {
    let platform = Platform::Other("plan9".to_string());
    let controller = controller(platform.clone(), Vec::new());

    assert!(matches!(
        controller.play("https://example/a"),
        Err(PlaybackError::NoBackendAvailable(p)) if p == platform
    ));
}

#[test]
fn test_missing_player_leaves_current_stream_playing() {
    let dir = tempfile::tempdir().unwrap();
    let link = dir.path().join("player");
    std::os::unix::fs::symlink("/bin/sh", &link).unwrap();

    let mut player = stand_in("linked", "exec sleep 30");
    player.locator = Locator::Paths(vec![link.clone()]);
    let controller = controller(Platform::Linux, vec![player]);

    controller.play("https://example/a").unwrap();
    let pid = controller.process_id().unwrap();

    // The player is uninstalled while the first stream keeps playing.
    std::fs::remove_file(&link).unwrap();
    let err = controller.play("https://example/b").unwrap_err();

    assert!(matches!(err, PlaybackError::NoBackendAvailable(Platform::Linux)));
    assert_eq!(controller.state(), PlaybackState::Playing);
    assert_eq!(controller.now_playing().as_deref(), Some("https://example/a"));
    assert!(signals::is_alive(pid));
    controller.cleanup();
}

#[test]
fn test_natural_end_then_play_again() {
    let controller = controller(Platform::Linux, vec![stand_in("short", "exec sleep 0.2")]);

    controller.play("https://example/a").unwrap();
    assert_eq!(controller.state(), PlaybackState::Playing);

    assert!(wait_until(Duration::from_secs(5), || {
        controller.state() == PlaybackState::Stopped
    }));
    assert!(controller.now_playing().is_none());
    assert_eq!(controller.elapsed(), Duration::ZERO);

    controller.play("https://example/b").unwrap();
    assert_eq!(controller.state(), PlaybackState::Playing);
    assert_eq!(controller.now_playing().as_deref(), Some("https://example/b"));
    controller.cleanup();
}

#[test]
fn test_stop_and_cleanup_are_idempotent() {
    let controller = controller(Platform::Linux, vec![stand_in("sleeper", "exec sleep 30")]);

    controller.stop().unwrap();
    controller.cleanup();

    controller.play("https://example/a").unwrap();
    let pid = controller.process_id().unwrap();
    controller.stop().unwrap();
    controller.stop().unwrap();
    controller.cleanup();
    controller.cleanup();

    assert_eq!(controller.state(), PlaybackState::Stopped);
    assert!(wait_until(Duration::from_secs(5), || !signals::is_alive(pid)));
}

#[test]
fn test_snapshot_reports_session() {
    let controller = controller(Platform::Linux, vec![stand_in("sleeper", "exec sleep 30")]);

    let idle = controller.snapshot();
    assert_eq!(idle.state, PlaybackState::Stopped);
    assert!(idle.url.is_none());
    assert_eq!(idle.elapsed_ms, 0);

    controller.play("https://example/a").unwrap();
    thread::sleep(Duration::from_millis(50));
    let playing = controller.snapshot();
    assert_eq!(playing.state, PlaybackState::Playing);
    assert_eq!(playing.url.as_deref(), Some("https://example/a"));
    assert_eq!(playing.backend.as_deref(), Some("sleeper"));
    assert!(playing.elapsed_ms >= 50);

    controller.cleanup();
}

#[test]
fn test_clones_drive_the_same_session() {
    let controller = controller(Platform::Linux, vec![stand_in("sleeper", "exec sleep 30")]);
    let other = controller.clone();

    controller.play("https://example/a").unwrap();
    other.pause().unwrap();
    assert_eq!(controller.state(), PlaybackState::Paused);

    let worker = {
        let c = controller.clone();
        thread::spawn(move || c.resume())
    };
    worker.join().unwrap().unwrap();
    assert_eq!(other.state(), PlaybackState::Playing);

    other.cleanup();
    assert_eq!(controller.state(), PlaybackState::Stopped);
}
