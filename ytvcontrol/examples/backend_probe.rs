use std::env;
use std::thread;
use std::time::Duration;

use ytvcontrol::time_utils::format_clock;
use ytvcontrol::{
    BackendResolver, BackendTable, ControllerOptions, Platform, PlaybackController,
    PlaybackError, RemoteControlConfig,
};

fn main() -> Result<(), PlaybackError> {
    let _ = tracing_subscriber::fmt::try_init();

    let platform = Platform::current();
    println!("Probing media players for {}...", platform);

    let remote_control = RemoteControlConfig::default();
    let resolver = BackendResolver::new(BackendTable::builtin(&remote_control));
    let candidates = resolver.table().candidates(&platform);
    if candidates.is_empty() {
        println!("No players are known for this platform.");
        return Ok(());
    }

    let available = resolver.available(&platform);
    for descriptor in candidates {
        let found = available.iter().find(|b| b.name() == descriptor.name);
        println!(
            "  {:<10} remote={} watch={} -> {}",
            descriptor.name,
            descriptor.supports_remote_control(),
            descriptor.supports_process_watch,
            found
                .map(|b| b.executable.display().to_string())
                .unwrap_or_else(|| "not installed".to_string())
        );
    }

    // Optional: `cargo run --example backend_probe -- <url>` plays a few seconds.
    let Some(url) = env::args().nth(1) else {
        return Ok(());
    };

    let controller = PlaybackController::for_current_platform(&remote_control, ControllerOptions::default());
    controller.play(&url)?;
    println!("\nPlaying {} with {:?}", url, controller.backend_name());

    for _ in 0..5 {
        thread::sleep(Duration::from_secs(1));
        println!("  {} {}", controller.state(), format_clock(controller.elapsed()));
    }

    controller.pause()?;
    println!("  {} {}", controller.state(), format_clock(controller.elapsed()));
    thread::sleep(Duration::from_secs(2));
    controller.resume()?;
    thread::sleep(Duration::from_secs(2));

    controller.stop()?;
    println!("  {}", controller.state());
    Ok(())
}
